use rig_forge::config::{validate_budget, Config};
use rig_forge::data::catalog::Catalog;
use rig_forge::data::load_catalog;
use rig_forge::data::normalize::min_max_normalize;
use rig_forge::evaluation::fitness::FitnessEvaluator;
use rig_forge::evolution::EvolutionEngine;
use rig_forge::export::{write_report_to_json, RecommendationReport, RunSettings};
use std::env;
use std::path::Path;
use std::process;

/// Loads the catalog, normalizes raw performance and resolves the budget to use.
///
/// # Arguments
/// * `config` - Reference to the validated run `Config`
///
/// # Returns
/// * `Ok((Catalog, f64))` - The validated catalog and the budget (the payload's own budget wins over the configured one)
/// * `Err(String)` - Error message if loading, validation or the budget fails
fn prepare_catalog(config: &Config) -> Result<(Catalog, f64), String> {
    log::info!("Loading catalog from '{}'...", config.data.catalog_file);
    let loaded = load_catalog(Path::new(&config.data.catalog_file))
        .map_err(|e| format!("Failed to load catalog: {}", e))?;

    let mut components = loaded.components;
    if components.is_empty() {
        return Err("Catalog contains no components.".to_string());
    }

    if let Some((min, max)) = min_max_normalize(&mut components) {
        log::info!("Normalized raw performance range [{}, {}]", min, max);
    }

    let catalog = Catalog::new(components).map_err(|e| format!("Invalid catalog: {}", e))?;

    let budget = match loaded.budget {
        Some(budget) => {
            log::info!("Using budget {:.2} from the catalog payload", budget);
            budget
        }
        None => config.fitness.budget,
    };
    validate_budget(budget)?;

    Ok((catalog, budget))
}

fn main() {
    env_logger::init();
    log::info!("Booting rig-forge...");

    // 1. Load and Validate Configuration
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = match Config::load(Path::new(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration '{}': {}", config_path, e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    }
    log::info!("Configuration loaded and validated.");

    // 2. Prepare Catalog
    let (catalog, budget) = match prepare_catalog(&config) {
        Ok(prepared) => prepared,
        Err(e) => {
            log::error!("Catalog preparation failed: {}", e);
            process::exit(1);
        }
    };

    // 3. Run the Evolution
    let evaluator = FitnessEvaluator::new(budget, config.fitness.policy, config.compatibility);
    let mut engine = match EvolutionEngine::new(&config.ga, &evaluator, &catalog) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };
    log::info!("--- Starting Evolution ---");
    let result = engine.evolve();

    // 4. Present the Result
    let report =
        RecommendationReport::new(&result, &evaluator, &catalog, RunSettings::from(&config));

    println!(
        "\nBest build (generation {}, fitness {:.4}, price {:.2} / {:.2}):",
        report.best_generation, report.fitness, report.total_price, report.budget
    );
    for slot in &report.best_build {
        match &slot.component {
            Some(component) => println!(
                "  {:<13} {:<40} {:>14.2}",
                slot.category,
                component.name.as_deref().unwrap_or("(unnamed)"),
                component.price
            ),
            None => println!("  {:<13} -", slot.category),
        }
    }

    if let Some(output_file) = &config.export.output_file {
        match write_report_to_json(&report, Path::new(output_file)) {
            Ok(()) => log::info!("Report written to '{}'", output_file),
            Err(e) => {
                log::error!("Failed to write report to '{}': {}", output_file, e);
                process::exit(1);
            }
        }
    }

    if !report.feasible {
        log::error!(
            "No feasible build within budget {:.2}. Empty categories: {:?}. Missing slots: {:?}",
            report.budget,
            report.empty_categories,
            report.missing_slots()
        );
        process::exit(2);
    }
}
