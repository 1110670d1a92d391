//! Recommendation export for presenting a run to a caller.
//!
//! The report owns copies of the selected components so it can be written to disk,
//! read back and compared without the catalog that produced it.

use crate::config::{Config, FitnessConfig, GaConfig};
use crate::data::catalog::Catalog;
use crate::data::{Category, Component};
use crate::evaluation::compatibility::CompatibilityPolicy;
use crate::evaluation::fitness::FitnessEvaluator;
use crate::evolution::{GenerationRecord, RunResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Full result of one optimization run, ready for serialization.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecommendationReport {
    /// Schema version for forward/backward compatibility
    pub schema_version: String,
    /// Unix timestamp when the report was generated
    pub generated_at: u64,
    /// Snapshot of the settings that produced this result
    pub settings: RunSettings,
    /// Budget actually applied (the catalog payload may override the configured one)
    pub budget: f64,
    /// Whether the best build is complete, within budget and compatible.
    /// When false the build must not be presented as a recommendation.
    pub feasible: bool,
    /// Categories the catalog had no candidates for
    pub empty_categories: Vec<String>,
    pub best_build: Vec<BuildSlot>,
    pub fitness: f64,
    pub best_generation: usize,
    pub total_price: f64,
    pub total_performance: f64,
    pub history: Vec<GenerationRecord>,
}

/// Subset of configuration relevant for reproducing a run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub ga: GaConfig,
    pub fitness: FitnessConfig,
    pub compatibility: CompatibilityPolicy,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            ga: config.ga.clone(),
            fitness: config.fitness.clone(),
            compatibility: config.compatibility,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BuildSlot {
    pub category: String,
    pub component: Option<Component>,
}

impl RecommendationReport {
    /// Creates a report from a finished run.
    ///
    /// # Arguments
    /// * `result` - The `RunResult` returned by the engine
    /// * `evaluator` - The evaluator used during the run, to re-verify the best build
    /// * `catalog` - The catalog the run drew from
    /// * `settings` - Settings snapshot to embed
    pub fn new(
        result: &RunResult<'_>,
        evaluator: &FitnessEvaluator,
        catalog: &Catalog,
        settings: RunSettings,
    ) -> Self {
        let best_build = Category::ALL
            .into_iter()
            .map(|category| BuildSlot {
                category: category.name().to_string(),
                component: result.best_build.get(category).cloned(),
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().timestamp().max(0) as u64,
            settings,
            budget: evaluator.budget(),
            feasible: evaluator.is_feasible(&result.best_build),
            empty_categories: catalog
                .empty_categories()
                .into_iter()
                .map(|c| c.name().to_string())
                .collect(),
            best_build,
            fitness: result.best_fitness,
            best_generation: result.best_generation,
            total_price: result.best_build.total_price(),
            total_performance: result.best_build.total_performance(),
            history: result.history.clone(),
        }
    }

    /// Categories whose slot in the best build is empty.
    pub fn missing_slots(&self) -> Vec<&str> {
        self.best_build
            .iter()
            .filter(|slot| slot.component.is_none())
            .map(|slot| slot.category.as_str())
            .collect()
    }
}

/// Writes a report to a JSON file.
pub fn write_report_to_json(
    report: &RecommendationReport,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// Reads a report from a JSON file.
pub fn read_report_from_json(
    input_path: &Path,
) -> Result<RecommendationReport, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(input_path)?;
    let report: RecommendationReport = serde_json::from_str(&content)?;
    Ok(report)
}
