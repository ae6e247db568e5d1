//! Trailing-loss model.
//!
//! A moving object smears its light along a trail during the exposure
//! instead of concentrating it in a seeing-limited point, so the peak
//! signal a point-source detection algorithm sees is reduced. The loss is
//! a closed-form function of the trail length relative to the seeing disk
//! (Veres & Chesley 2017):
//!
//! `x = omega * t_exp / (24 * seeing)`, `dmag = 1.25 log10(1 + a x^2 / (1 + b x))`
//!
//! with `omega` the on-sky rate in deg/day (`omega / 24` is arcsec/s),
//! `t_exp` the exposure time in seconds, and `seeing` the geometric FWHM
//! in arcseconds. Zero for stationary objects, strictly increasing with
//! rate, never negative.

use crate::catalog::Detection;
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// Detection-loss coefficients.
const A_DET: f64 = 0.42;
const B_DET: f64 = 0.003;

/// On-sky angular rate in deg/day from coordinate rates.
///
/// The RA rate is foreshortened by cos(dec) on the sky.
pub fn on_sky_rate_deg_day(ra_rate_deg_day: f64, dec_rate_deg_day: f64, dec_deg: f64) -> f64 {
    let ra_sky = ra_rate_deg_day * dec_deg.to_radians().cos();
    (ra_sky * ra_sky + dec_rate_deg_day * dec_rate_deg_day).sqrt()
}

/// Magnitude lost to trailing for a given rate, exposure time, and seeing.
pub fn trailing_loss_mag(omega_deg_day: f64, exposure_time_s: f64, seeing_fwhm_arcsec: f64) -> f64 {
    let x = omega_deg_day * exposure_time_s / (24.0 * seeing_fwhm_arcsec);
    1.25 * (1.0 + A_DET * x * x / (1.0 + B_DET * x)).log10()
}

/// Fill `trailing_loss_mag` for every detection from its rates and its
/// exposure's geometric seeing.
pub fn add_trailing_losses(
    mut table: Vec<Detection>,
    ctx: &PipelineContext,
) -> Result<Vec<Detection>> {
    for det in &mut table {
        let exposure = ctx.exposure(det.field_id)?;
        let omega = on_sky_rate_deg_day(det.ra_rate_deg_day, det.dec_rate_deg_day, det.dec_deg);
        det.trailing_loss_mag = trailing_loss_mag(
            omega,
            ctx.sim.exposure_time_s,
            exposure.seeing_fwhm_geom_arcsec,
        );
    }
    Ok(table)
}
