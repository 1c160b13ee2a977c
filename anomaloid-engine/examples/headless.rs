// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Headless Anomaloid Field Example
//!
//! Populates a field of anomaloids, then steps the collision pipeline and
//! prints a population summary after each step. The run stops early once a
//! step destroys nothing.
//!
//! # Running
//!
//! ```bash
//! # Default field of 40 bodies
//! cargo run --example headless
//!
//! # Larger, reproducible field
//! cargo run --example headless -- --count 200 --seed 7 --steps 20
//!
//! # Settings from a TOML file, with debug logging
//! cargo run --example headless -- --config field.toml --verbose
//! ```

use anomaloid_engine::config::{Config, SimulationConfig};
use anomaloid_engine::{logging, Simulation, StepReport};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Step a field of colliding anomaloids without rendering
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of steps to run after populating
    #[arg(short, long, default_value_t = 10)]
    steps: u64,

    /// Number of anomaloids to spawn, overriding the config file
    #[arg(short, long)]
    count: Option<usize>,

    /// Random seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_report(label: &str, report: &StepReport) {
    println!(
        "{:>8}: {:>4} -> {:>4} bodies, {:>3} collisions, {:>3} destroyed, {:>3} discarded, {} faults",
        label,
        report.population_before,
        report.population_after,
        report.collisions,
        report.destroyed,
        report.discarded,
        report.faults.len()
    );
}

fn build_config(args: &Args) -> Result<SimulationConfig, String> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_file(path)
            .map_err(|e| format!("failed to load {}: {}", path.display(), e))?,
        None => SimulationConfig::default(),
    };
    if let Some(count) = args.count {
        config = config.with_count(count);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), String> {
    let config = build_config(&args)?;
    let mut sim = Simulation::new(config).map_err(|e| e.to_string())?;

    println!("==========================================================");
    println!("              Headless Anomaloid Field");
    println!("==========================================================");
    println!("  Bodies: {}", sim.config().spawn.count);
    match sim.config().seed {
        Some(seed) => println!("  Seed:   {}", seed),
        None => println!("  Seed:   (entropy)"),
    }
    println!();

    let report = sim.populate().map_err(|e| e.to_string())?;
    print_report("populate", &report);

    for _ in 0..args.steps {
        let report = sim.step().map_err(|e| e.to_string())?;
        print_report(&format!("step {}", report.step), &report);
        if report.destroyed == 0 {
            break;
        }
    }

    println!();
    println!("Survivors:");
    for body in sim.bodies() {
        println!(
            "  {}: pos=({:.1}, {:.1}) radius={:.2} mass={:.1} anomaly={:.2}",
            body.entity,
            body.position.x(),
            body.position.y(),
            body.radius.value(),
            body.mass.value(),
            body.anomaly_mult.0
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}
