//! Mix design search CLI - run a constrained search from a JSON run file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use mixopt::schema::{
    ConstraintRule, GaConfig, ParameterSpace, ParameterSpec, Quantity, RuleKind, SearchConfig,
};
use mixopt::search::{LinearSurrogate, SearchEngine};

/// On-disk run description: the search configuration plus the pre-fitted
/// surrogate coefficients it is evaluated against.
#[derive(Debug, Serialize, Deserialize)]
struct RunFile {
    search: SearchConfig,
    surrogate: LinearSurrogate,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json>", args[0]);
        eprintln!();
        eprintln!("Search for a mix design matching a target strength.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json  Path to a run file (search config + surrogate coefficients)");
        eprintln!();
        eprintln!("A ready-to-edit run file is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_run_file();
        return;
    }

    let run_path = PathBuf::from(&args[1]);
    let run_str = fs::read_to_string(&run_path).unwrap_or_else(|e| {
        eprintln!("Error reading run file: {}", e);
        std::process::exit(1);
    });

    let run: RunFile = serde_json::from_str(&run_str).unwrap_or_else(|e| {
        eprintln!("Error parsing run file: {}", e);
        std::process::exit(1);
    });

    let names: Vec<String> = run
        .search
        .space
        .parameters
        .iter()
        .map(|p| p.name.clone())
        .collect();
    let target = run.search.target;

    let mut engine = SearchEngine::new(run.search, run.surrogate).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    println!("Mix Design Search");
    println!("=================");
    println!("Target strength: {:.1} MPa", target);
    println!();

    let start = Instant::now();
    let outcome = engine.run().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!("Optimal mix design for {:.1} MPa:", target);
    for (name, value) in names.iter().zip(&outcome.best.features) {
        println!("  {}: {:.1}", name, value);
    }
    match outcome.best.predicted {
        Some(predicted) => println!("Predicted strength: {:.2} MPa", predicted),
        None => println!("No feasible mix found; best candidate violates constraints"),
    }
    println!("Fitness: {:.4}", outcome.best.fitness);
    println!();

    println!("Convergence:");
    println!("  {:>4}  {:>12}  {:>12}", "gen", "min", "avg");
    for stats in &outcome.history {
        println!(
            "  {:>4}  {:>12.4}  {:>12.4}",
            stats.generation, stats.min_fitness, stats.avg_fitness
        );
    }
    println!();
    println!("Completed in {:.2?}", elapsed);
}

/// Concrete mix preset: the seven evolved components plus curing age fixed
/// at 28 days, the engineering rule set, and illustrative surrogate
/// coefficients shaped like a model fitted on the usual compressive
/// strength dataset.
fn print_example_run_file() {
    let binder = || {
        vec![
            "Cement".to_string(),
            "Blast Furnace Slag".to_string(),
            "Fly Ash".to_string(),
        ]
    };

    let run = RunFile {
        search: SearchConfig {
            space: ParameterSpace::new(vec![
                ParameterSpec::evolved("Cement", 100.0, 550.0),
                ParameterSpec::evolved("Blast Furnace Slag", 0.0, 360.0),
                ParameterSpec::evolved("Fly Ash", 0.0, 200.0),
                ParameterSpec::evolved("Water", 120.0, 250.0),
                ParameterSpec::evolved("Superplasticizer", 0.0, 32.0),
                ParameterSpec::evolved("Coarse Aggregate", 800.0, 1150.0),
                ParameterSpec::evolved("Fine Aggregate", 590.0, 950.0),
                ParameterSpec::fixed("Age", 28.0),
            ]),
            rules: vec![
                ConstraintRule {
                    name: "water_binder_ratio".into(),
                    kind: RuleKind::Proportion,
                    quantity: Quantity::Ratio {
                        numerator: vec!["Water".into()],
                        denominator: binder(),
                    },
                    min: Some(0.3),
                    max: Some(0.6),
                },
                ConstraintRule {
                    name: "total_binder".into(),
                    kind: RuleKind::Proportion,
                    quantity: Quantity::Sum(binder()),
                    min: Some(300.0),
                    max: Some(600.0),
                },
                ConstraintRule {
                    name: "min_cement".into(),
                    kind: RuleKind::Proportion,
                    quantity: Quantity::Parameter("Cement".into()),
                    min: Some(100.0),
                    max: None,
                },
                ConstraintRule {
                    name: "fine_aggregate_fraction".into(),
                    kind: RuleKind::Proportion,
                    quantity: Quantity::Ratio {
                        numerator: vec!["Fine Aggregate".into()],
                        denominator: vec!["Coarse Aggregate".into(), "Fine Aggregate".into()],
                    },
                    min: Some(0.35),
                    max: Some(0.45),
                },
            ],
            ga: GaConfig::default(),
            target: 40.0,
            direction: Default::default(),
            random_seed: Some(42),
        },
        surrogate: LinearSurrogate {
            means: vec![281.2, 73.9, 54.2, 181.6, 6.2, 972.9, 773.6, 45.7],
            stds: vec![104.5, 86.3, 64.0, 21.4, 6.0, 77.8, 80.2, 63.2],
            weights: vec![13.0, 9.0, 5.5, -3.2, 1.7, 1.4, 1.5, 7.2],
            intercept: 35.8,
        },
    };

    match serde_json::to_string_pretty(&run) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
