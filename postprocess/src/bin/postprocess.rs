//! Survey post-processing command-line entry point.
//!
//! ```bash
//! # Run with a configuration file
//! cargo run --release --bin postprocess -- -c pp_config.toml
//!
//! # Override the random seed for a reproducibility check
//! cargo run --release --bin postprocess -- -c pp_config.toml --seed 42
//! ```
//!
//! Logging is controlled through `RUST_LOG` (e.g. `RUST_LOG=debug`).

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use postprocess::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Survey detection catalog post-processing")]
struct Cli {
    /// Input configuration file
    #[arg(short = 'c', long, default_value = "pp_config.toml")]
    config: PathBuf,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let started = Instant::now();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        config.simulation.rng_seed = Some(seed);
    }

    let summary = postprocess::run_batch(&config).context("post-processing run failed")?;

    info!(
        "post-processing completed: {} detections -> {}",
        summary.rows_written,
        summary.output_path.display()
    );
    info!("runtime: {:.3} s", started.elapsed().as_secs_f64());
    Ok(())
}
