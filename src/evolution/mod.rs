pub mod build;
pub mod operators;

use crate::config::GaConfig;
use crate::data::catalog::Catalog;
use crate::evaluation::fitness::FitnessEvaluator;
use crate::evolution::build::{create_individual, Build};
use crate::evolution::operators::{crossover, mutate};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fitness placeholder for offspring that have not been scored yet
const UNEVALUATED: f64 = f64::NEG_INFINITY;

#[derive(Error, Debug)]
pub enum EvolutionError {
    #[error("Invalid GA configuration: {0}")]
    InvalidConfig(String),
}

/// A member of the population: a build and the fitness it scored this generation.
#[derive(Debug, Clone, Copy)]
pub struct Individual<'a> {
    pub build: Build<'a>,
    pub fitness: f64,
}

impl<'a> Individual<'a> {
    fn unevaluated(build: Build<'a>) -> Self {
        Self {
            build,
            fitness: UNEVALUATED,
        }
    }
}

/// Audit entry for the best build of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// 1-based generation index
    pub generation: usize,
    pub fitness: f64,
    pub total_price: f64,
    pub total_performance: f64,
}

/// Outcome of a full run.
///
/// `best_build` is the best build seen in any generation, not just the last one.
/// A fitness of 0 means no build satisfied the budget and compatibility rules;
/// `best_build` may then contain absent slots.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult<'a> {
    pub best_build: Build<'a>,
    pub best_fitness: f64,
    /// 1-based generation in which `best_fitness` was first reached
    pub best_generation: usize,
    pub history: Vec<GenerationRecord>,
}

/// Drives the generational loop: evaluate, record, truncate to the top half, then
/// breed the next population around the current elite.
#[derive(Clone)]
pub struct EvolutionEngine<'a> {
    /// Reference to the user-defined config for this run
    config: &'a GaConfig,
    /// Scores builds; shared read-only across rayon workers
    evaluator: &'a FitnessEvaluator,
    /// Source of components for initialization and mutation
    catalog: &'a Catalog,
    /// Current generation, sorted by descending fitness after each evaluation
    population: Vec<Individual<'a>>,
    history: Vec<GenerationRecord>,
    /// Every random draw of the run comes from here
    rng: StdRng,
}

impl<'a> EvolutionEngine<'a> {
    /// Creates a new EvolutionEngine instance
    ///
    /// # Arguments
    /// * `config` - Reference to a `GaConfig` with the search parameters
    /// * `evaluator` - Reference to the `FitnessEvaluator` carrying budget and compatibility policy
    /// * `catalog` - Reference to the `Catalog` the builds are drawn from
    ///
    /// # Returns
    /// * `Result<Self, EvolutionError>` - the engine, or the reason `config` is unusable
    pub fn new(
        config: &'a GaConfig,
        evaluator: &'a FitnessEvaluator,
        catalog: &'a Catalog,
    ) -> Result<Self, EvolutionError> {
        config.validate().map_err(EvolutionError::InvalidConfig)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            config,
            evaluator,
            catalog,
            population: Vec::with_capacity(config.population_size),
            history: Vec::with_capacity(config.num_generations),
            rng,
        })
    }

    /// Runs the configured number of generations and returns the best build found.
    ///
    /// There is no early stopping. A catalog that cannot fill every category, or a
    /// budget no compatible build fits, is not an error: the run completes and reports
    /// a best fitness of 0.
    pub fn evolve(&mut self) -> RunResult<'a> {
        info!(
            "Initializing population of size {}...",
            self.config.population_size
        );
        self.initialize_population();
        self.history.clear();

        let mut best_build = Build::default();
        let mut best_fitness = f64::NEG_INFINITY;
        let mut best_generation = 0;

        for generation in 1..=self.config.num_generations {
            debug!(
                "--- Starting Generation {}/{} ---",
                generation, self.config.num_generations
            );

            let feasible = self.evaluate_population();
            // Sorted and never empty: `new` rejects a population_size below 4
            let elite = self.population[0];

            let record = GenerationRecord {
                generation,
                fitness: elite.fitness,
                total_price: elite.build.total_price(),
                total_performance: elite.build.total_performance(),
            };
            info!(
                "Gen {}: Best Fitness={:.4} | Price={:.2} | Performance={:.4} | Feasible={}/{}",
                generation,
                record.fitness,
                record.total_price,
                record.total_performance,
                feasible,
                self.population.len()
            );
            self.history.push(record);

            // Strict improvement only: the first generation to reach a fitness keeps it
            if elite.fitness > best_fitness {
                if generation > 1 {
                    info!(
                        "New best fitness {:.4} at generation {} (was {:.4})",
                        elite.fitness, generation, best_fitness
                    );
                }
                best_build = elite.build;
                best_fitness = elite.fitness;
                best_generation = generation;
            }

            self.select_survivors();
            self.population = self.breed(elite.build);
        }

        if best_fitness <= 0.0 {
            warn!(
                "No feasible build found in {} generations (missing categories: {:?})",
                self.config.num_generations,
                self.catalog.empty_categories()
            );
        }
        info!(
            "Evolution complete. Best fitness {:.4} first reached at generation {}",
            best_fitness.max(0.0),
            best_generation
        );

        RunResult {
            best_build,
            best_fitness: best_fitness.max(0.0),
            best_generation,
            history: self.history.clone(),
        }
    }

    /// Fills the population with `population_size` random builds.
    pub fn initialize_population(&mut self) {
        let catalog = self.catalog;
        let rng = &mut self.rng;
        self.population = (0..self.config.population_size)
            .map(|_| Individual::unevaluated(create_individual(catalog, rng)))
            .collect();
    }

    /// Scores every individual, then stably sorts the population by descending fitness
    /// so equal scores keep their previous order (the elite, at index 0, wins ties).
    ///
    /// # Returns
    /// * `usize` - how many individuals scored above 0
    pub fn evaluate_population(&mut self) -> usize {
        let evaluator = self.evaluator;
        let scores: Vec<f64> = if self.config.parallel_evaluation {
            self.population
                .par_iter()
                .map(|ind| evaluator.calculate_fitness(&ind.build))
                .collect()
        } else {
            self.population
                .iter()
                .map(|ind| evaluator.calculate_fitness(&ind.build))
                .collect()
        };

        for (individual, fitness) in self.population.iter_mut().zip(scores) {
            individual.fitness = fitness;
        }

        self.population.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.population.iter().filter(|ind| ind.fitness > 0.0).count()
    }

    /// Elitist truncation: keeps the top `population_size / 2` of the sorted population.
    fn select_survivors(&mut self) {
        self.population.truncate(self.config.population_size / 2);
    }

    /// Builds the next generation from the survivors.
    ///
    /// The elite is carried over unchanged; every other slot is a child of two distinct
    /// survivors, produced by crossover followed by mutation.
    fn breed(&mut self, elite: Build<'a>) -> Vec<Individual<'a>> {
        let mut next_generation = Vec::with_capacity(self.config.population_size);
        next_generation.push(Individual::unevaluated(elite));

        while next_generation.len() < self.config.population_size {
            let (parent_a, parent_b) = self.pick_parents();
            let child = crossover(
                &parent_a,
                &parent_b,
                self.config.crossover_rate,
                &mut self.rng,
            );
            let child = mutate(
                child,
                self.catalog,
                self.config.mutation_rate,
                &mut self.rng,
            );
            next_generation.push(Individual::unevaluated(child));
        }

        next_generation
    }

    /// Two distinct survivors, uniformly at random. Selection leaves at least two,
    /// since a validated config has `population_size >= 4`.
    fn pick_parents(&mut self) -> (Build<'a>, Build<'a>) {
        let picks = index::sample(&mut self.rng, self.population.len(), 2);
        (
            self.population[picks.index(0)].build,
            self.population[picks.index(1)].build,
        )
    }

    /// Current population. Sorted by descending fitness right after
    /// `evaluate_population`; unevaluated individuals hold negative infinity.
    pub fn population(&self) -> &[Individual<'a>] {
        &self.population
    }

    /// # Returns
    /// * `&[GenerationRecord]` - one record per completed generation of the last run
    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }
}
