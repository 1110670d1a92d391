use crate::evaluation::compatibility::{CompatibilityPolicy, PowerRule};
use crate::evaluation::fitness::FitnessPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level run configuration, read from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ga: GaConfig,
    #[serde(default)]
    pub fitness: FitnessConfig,
    #[serde(default)]
    pub compatibility: CompatibilityPolicy,
    pub data: DataConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Parameters of the genetic search itself.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    pub num_generations: usize,
    /// Per-slot probability of inheriting from the second parent
    pub crossover_rate: f64,
    /// Per-child probability of one category being resampled
    pub mutation_rate: f64,
    /// Fixed seed for reproducible runs; OS entropy when absent
    pub seed: Option<u64>,
    pub parallel_evaluation: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            num_generations: 100,
            crossover_rate: 0.4,
            mutation_rate: 0.4,
            seed: None,
            parallel_evaluation: true,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Truncation keeps population_size / 2 survivors and breeding needs two distinct parents
        if self.population_size < 4 {
            return Err(format!(
                "population_size must be at least 4, got {}",
                self.population_size
            ));
        }
        if self.num_generations == 0 {
            return Err("num_generations must be at least 1".to_string());
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{} must be within [0, 1], got {}", name, rate));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FitnessConfig {
    pub budget: f64,
    pub policy: FitnessPolicy,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            budget: 10_000_000.0,
            policy: FitnessPolicy::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DataConfig {
    /// Catalog path, `.json` or `.csv`
    pub catalog_file: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ExportConfig {
    /// Where the JSON report is written; nothing is written when absent
    #[serde(default)]
    pub output_file: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Checks every section for values the optimizer cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        self.ga.validate()?;

        validate_budget(self.fitness.budget)?;

        if let PowerRule::HeadroomFactor { factor } = self.compatibility.power_rule {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!("PSU headroom factor must be positive, got {}", factor));
            }
        }
        if let Some(bounds) = self.compatibility.balance_ratio {
            if !(bounds.min.is_finite() && bounds.max.is_finite()) || bounds.min > bounds.max {
                return Err(format!(
                    "balance_ratio bounds are invalid: min={} max={}",
                    bounds.min, bounds.max
                ));
            }
        }

        if self.data.catalog_file.trim().is_empty() {
            return Err("data.catalog_file must not be empty".to_string());
        }
        Ok(())
    }
}

pub fn validate_budget(budget: f64) -> Result<(), String> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(format!(
            "budget must be a finite, non-negative amount, got {}",
            budget
        ));
    }
    Ok(())
}
