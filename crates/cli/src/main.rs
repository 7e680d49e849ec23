//! Operating-system simulator CLI.
//!
//! Each positional argument is a configuration file; every file is run as its own
//! independent simulation, in argument order. Exit code `1` on success, matching the
//! original tool's convention; any setup or runtime failure is reported as a single
//! `"ERROR: <description>"` line and the process exits with code `255` (the
//! unsigned representation of the original `-1` convention).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ossim_core::Simulation;

#[derive(Parser, Debug)]
#[command(
    name = "ossim",
    author,
    version,
    about = "Operating-system process scheduler and device resource manager simulator",
    long_about = "Runs one or more simulator configuration files in sequence.\n\nEach config file names its own meta-data program; the scheduling policy, device\ncycle times, and log sink are all read from that config file.\n\nExample:\n  ossim configs/fifo.cfg\n  ossim configs/fifo.cfg configs/round-robin.cfg"
)]
struct Cli {
    /// One or more simulator configuration files to run, in order.
    #[arg(required = true)]
    config_files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    for config_path in &cli.config_files {
        if let Err(error) = run_one(config_path) {
            tracing::error!(config = %config_path.display(), %error, "simulation aborted");
            eprintln!("ERROR: {error}");
            return ExitCode::from(255);
        }
    }

    ExitCode::from(1)
}

fn run_one(config_path: &PathBuf) -> Result<(), ossim_core::SimError> {
    tracing::info!(config = %config_path.display(), "loading simulation");
    let simulation = Simulation::load(config_path)?;
    simulation.run()
}
