//! NEAT results CLI - Summarize and export a persisted experiment.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use neat_results::{Experiment, NetworkGenome, ReportConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Summarize an experiment result file and export its statistics.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to report configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = ReportConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let mut experiment: Experiment<NetworkGenome> = Experiment::load(&config.results_path)
        .unwrap_or_else(|e| {
            eprintln!("Error reading {}: {}", config.results_path.display(), e);
            std::process::exit(1);
        });
    log::info!(
        "Loaded experiment {} with {} trials in {:.2?}",
        experiment.name,
        experiment.trials.len(),
        start.elapsed()
    );

    if let Some(score) = config.max_fitness_score {
        experiment.max_fitness_score = score;
    }

    let summary = experiment.summary();
    if config.print_summary {
        println!("{}", summary);
        println!();
    }

    if let Some(path) = &config.summary_json_path {
        let json = serde_json::to_string_pretty(&summary).unwrap_or_else(|e| {
            eprintln!("Error serializing summary: {}", e);
            std::process::exit(1);
        });
        if let Err(e) = fs::write(path, json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Summary written to {}", path.display());
    }

    if let Some(path) = &config.npz_path {
        match experiment.save_npz(path, config.compression) {
            Ok(bytes) => println!("Statistics written to {} ({} bytes)", path.display(), bytes),
            Err(e) => {
                eprintln!("Error writing {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
}

fn print_example_config() {
    let config = ReportConfig::default();

    println!("Example configuration (report.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
