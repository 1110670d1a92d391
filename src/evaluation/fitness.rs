use crate::evaluation::compatibility::CompatibilityPolicy;
use crate::evolution::build::Build;
use log::debug;
use serde::{Deserialize, Serialize};

/// Shape of the final fitness score for builds that fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessPolicy {
    /// `performance * compatibility`
    #[default]
    Performance,
    /// `performance * compatibility / ((budget - price) + 1)`, favouring builds that
    /// spend closer to the budget
    PerformancePerHeadroom,
}

/// Scores builds. Pure: evaluating the same build twice gives the same number,
/// which is what lets the engine evaluate a population in parallel.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    budget: f64,
    policy: FitnessPolicy,
    compatibility: CompatibilityPolicy,
}

impl FitnessEvaluator {
    /// Creates an evaluator for one run.
    ///
    /// # Arguments
    /// * `budget` - Upper bound on a build's total price, inclusive
    /// * `policy` - Shape of the score for builds that pass every constraint
    /// * `compatibility` - Rules a build must satisfy to score above 0
    ///
    /// # Returns
    /// * `Self` - an evaluator that can be shared across threads
    pub fn new(budget: f64, policy: FitnessPolicy, compatibility: CompatibilityPolicy) -> Self {
        Self {
            budget,
            policy,
            compatibility,
        }
    }

    /// # Returns
    /// * `f64` - the budget builds are checked against
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// # Returns
    /// * `FitnessPolicy` - the score shape used for builds that pass every constraint
    pub fn policy(&self) -> FitnessPolicy {
        self.policy
    }

    /// # Returns
    /// * `&CompatibilityPolicy` - the rules `calculate_fitness` and `is_feasible` apply
    pub fn compatibility(&self) -> &CompatibilityPolicy {
        &self.compatibility
    }

    /// Computes the fitness of a build.
    ///
    /// Builds with an absent slot score exactly 0, and so do over-budget builds (a hard
    /// constraint, not a penalty) and incompatible ones, whatever their performance.
    ///
    /// # Arguments
    /// * `build` - Reference to the `Build` to score
    ///
    /// # Returns
    /// * `f64` - fitness, always `>= 0`
    pub fn calculate_fitness(&self, build: &Build<'_>) -> f64 {
        if !build.is_complete() {
            debug!("Build incomplete: missing {:?}", build.missing_categories());
            return 0.0;
        }

        let total_price = build.total_price();
        if total_price > self.budget {
            debug!(
                "Build over budget: price={:.2} budget={:.2}",
                total_price, self.budget
            );
            return 0.0;
        }

        let total_performance = build.total_performance();
        let compatibility = if self.compatibility.check_compatibility(build) {
            1.0
        } else {
            0.0
        };
        let score = total_performance * compatibility;

        match self.policy {
            FitnessPolicy::Performance => score,
            FitnessPolicy::PerformancePerHeadroom => score / ((self.budget - total_price) + 1.0),
        }
    }

    /// Re-verifies a build against every hard constraint: all eight slots filled,
    /// within budget and compatible.
    pub fn is_feasible(&self, build: &Build<'_>) -> bool {
        build.is_complete()
            && build.total_price() <= self.budget
            && self.compatibility.check_compatibility(build)
    }
}
