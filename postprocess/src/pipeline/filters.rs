//! Acceptance cuts: SNR and limiting-magnitude filters.
//!
//! Both filters rebuild the table, so surviving rows are contiguous
//! (0..n-1) for the positional operations downstream. Row order within
//! the table is preserved as a side effect, though nothing relies on it.

use crate::catalog::Detection;
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// Detections at or below this signal-to-noise ratio are discarded.
///
/// Deliberately hardcoded: the configured detection-efficiency and
/// fill-factor parameters are parsed for interface stability but the
/// reference recipe never applies them.
pub const SNR_CUTOFF: f64 = 2.0;

/// Drop detections with SNR <= [`SNR_CUTOFF`].
pub fn snr_filter(table: Vec<Detection>) -> Vec<Detection> {
    table.into_iter().filter(|d| d.snr > SNR_CUTOFF).collect()
}

/// Drop detections whose observed magnitude plus trailing loss reaches
/// the limiting magnitude of their exposure (strict `<` retention).
pub fn faint_filter(table: Vec<Detection>, ctx: &PipelineContext) -> Result<Vec<Detection>> {
    let mut kept = Vec::with_capacity(table.len());
    for det in table {
        let exposure = ctx.exposure(det.field_id)?;
        if det.mag_observed + det.trailing_loss_mag < exposure.five_sigma_depth {
            kept.push(det);
        }
    }
    Ok(kept)
}
