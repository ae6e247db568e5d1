//! Survey detection catalog post-processing.
//!
//! Turns an idealized, noise-free catalog of predicted solar-system-object
//! detections into a realistic observed catalog for one survey: magnitudes
//! are translated into each exposure's filter, measurement uncertainties
//! and noise are injected from the exposure conditions, trailing losses
//! are applied, and detections a real instrument would not have recorded
//! (too noisy, too faint, or off the detector mosaic) are discarded. The
//! surviving table is written as CSV, SQLite, or HDF5.
//!
//! The whole run is a single-threaded batch over one in-memory table; see
//! [`run_batch`] for the top-level entry point and [`pipeline`] for the
//! stage sequence.

pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;

use std::path::PathBuf;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::{CameraFootprint, ColorTable, ExposureCatalog};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Detections surviving every filter stage.
    pub rows_written: usize,
    /// File the table was written to.
    pub output_path: PathBuf,
}

/// Execute one complete batch run from a validated configuration:
/// load all four inputs, run the pipeline, write the output table.
///
/// Any error aborts before output is written; there is no partial result.
pub fn run_batch(config: &Config) -> Result<RunSummary> {
    let inputs = &config.inputfiles;

    info!("reading detection catalog {}", inputs.detections.display());
    let table = catalog::load_detections(&inputs.detections, &config.filters.main_filter)?;
    info!("read {} predicted detections", table.len());

    info!("reading pointing database {}", inputs.pointing_database.display());
    let exposures = ExposureCatalog::load(&inputs.pointing_database)?;
    info!("read {} exposures", exposures.len());

    info!("reading color table {}", inputs.colors.display());
    let colors = ColorTable::load(&inputs.colors)?;

    info!("loading camera footprint {}", inputs.camera_footprint.display());
    let footprint = CameraFootprint::load(&inputs.camera_footprint)?;
    info!("camera footprint has {} detectors", footprint.len());

    let ctx = PipelineContext::new(
        exposures,
        colors,
        footprint,
        config.filters.clone(),
        config.simulation.clone(),
    )?;

    let mut rng = match config.simulation.rng_seed {
        Some(seed) => {
            info!("seeding random generator with {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let table = pipeline::run(table, &ctx, &mut rng)?;

    let output_path = output::write_output(&table, &config.outputformat)?;
    info!(
        "wrote {} detections to {} ({})",
        table.len(),
        output_path.display(),
        config.outputformat.output_format
    );

    Ok(RunSummary {
        rows_written: table.len(),
        output_path,
    })
}
