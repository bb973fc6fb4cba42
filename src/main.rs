use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::time::Instant;

use vesicle_engine::{Simulation, SimulationConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulates ion transport across a vesicle membrane", long_about = None)]
struct Args {
    /// Simulation configuration file (.json or .toml)
    config: PathBuf,

    /// Output file for the recorded histories
    #[arg(short, long, default_value = "histories.json")]
    output: PathBuf,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Only log warnings and hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    let level = if args.quiet { LevelFilter::Warn } else { LevelFilter::Info };
    Builder::from_default_env().filter(None, level).init();

    info!("Starting Vesicle Engine...");
    info!("Config file: {}", args.config.display());

    // --- Load Configuration ---
    let config = SimulationConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let mut sim = Simulation::load(config).context("Failed to initialize simulation")?;

    // --- Simulation Loop ---
    let progress_bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% [{eta}]")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    sim.run(|pct| progress_bar.set_position(u64::from(pct)))
        .context("Simulation step failed")?;
    progress_bar.finish_and_clear();

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({} iterations).",
        total_duration.as_secs_f64(),
        sim.step_count()
    );
    sim.log_final_values();

    // --- Save Recorded Data ---
    let histories = sim.export_histories();
    histories
        .write_json(&args.output, args.pretty)
        .with_context(|| format!("Failed to write histories to {}", args.output.display()))?;
    info!(
        "Saved {} histories ({} time points) to {}",
        histories.len(),
        histories.point_count(),
        args.output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::try_parse_from(["vesicle-engine", "config.json"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert_eq!(args.output, PathBuf::from("histories.json"));
        assert!(!args.pretty);
        assert!(!args.quiet);
    }

    #[test]
    fn test_args_parse_flags() {
        let args =
            Args::try_parse_from(["vesicle-engine", "run.toml", "-o", "out.json", "--pretty", "--quiet"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out.json"));
        assert!(args.pretty);
        assert!(args.quiet);
    }
}
