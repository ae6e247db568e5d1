//! Output assembly.
//!
//! Surviving detections get the exposure-derived metadata the output
//! formats need: the resolved filter name and the observation MJD, looked
//! up by field id. Field ids themselves are already integral in the table
//! and are written as integers downstream, so joins against the pointing
//! database stay stable.

use crate::catalog::Detection;
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// Attach filter name and observation MJD to every surviving detection.
pub fn assemble_results(
    mut table: Vec<Detection>,
    ctx: &PipelineContext,
) -> Result<Vec<Detection>> {
    for det in &mut table {
        let exposure = ctx.exposure(det.field_id)?;
        det.filter = exposure.filter.clone();
        det.field_mjd = exposure.observation_mjd;
    }
    Ok(table)
}
