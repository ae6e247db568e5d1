//! Magnitude translation from the reference filter into each exposure's
//! observing filter.
//!
//! The ephemeris simulation reports every object's brightness in one
//! reference ("main") filter. A real exposure is taken through one of the
//! survey's filters, so the detection's magnitude has to be carried across
//! using the object's color: identity when the exposure filter *is* the
//! main filter, otherwise true magnitude plus the configured color offset
//! for that (object, filter) pair.
//!
//! List-length and ordering constraints on the filter configuration are
//! validated at startup (see [`crate::config::Config::validate`]), never
//! per row.

use crate::catalog::Detection;
use crate::error::{PostProcessError, Result};
use crate::pipeline::PipelineContext;

/// Fill `mag_in_filter_true` for every detection.
pub fn translate_magnitudes(
    mut table: Vec<Detection>,
    ctx: &PipelineContext,
) -> Result<Vec<Detection>> {
    for det in &mut table {
        let exposure = ctx.exposure(det.field_id)?;
        det.mag_in_filter_true = if exposure.filter == ctx.filters.main_filter {
            det.mag_true
        } else {
            let colour = ctx
                .filters
                .colour_for_filter(&exposure.filter)
                .ok_or_else(|| {
                    PostProcessError::Config(format!(
                        "exposure {} uses filter '{}' which is not a configured result filter",
                        exposure.observation_id, exposure.filter
                    ))
                })?;
            let offset = ctx.colors.offset(&det.obj_id, colour).ok_or_else(|| {
                PostProcessError::Config(format!(
                    "no '{colour}' colour offset for object {}",
                    det.obj_id
                ))
            })?;
            det.mag_true + offset
        };
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{test_context, test_detection};

    #[test]
    fn test_offset_applied_for_non_main_filter() {
        // Test exposure is in r; "obj" has V-r = -0.5
        let ctx = test_context();
        let table = translate_magnitudes(vec![test_detection(20.0)], &ctx).unwrap();
        assert_eq!(table[0].mag_in_filter_true, 19.5);
    }

    #[test]
    fn test_identity_for_main_filter() {
        let mut ctx = test_context();
        // Re-point the exposure's filter at the main filter
        let mut exposure = ctx.exposures.get(1).unwrap().clone();
        exposure.filter = "V".to_string();
        ctx.exposures =
            crate::catalog::ExposureCatalog::from_exposures(vec![exposure]).unwrap();

        let table = translate_magnitudes(vec![test_detection(20.0)], &ctx).unwrap();
        assert_eq!(table[0].mag_in_filter_true, 20.0);
    }

    #[test]
    fn test_unknown_exposure_filter_is_fatal() {
        let mut ctx = test_context();
        let mut exposure = ctx.exposures.get(1).unwrap().clone();
        exposure.filter = "w".to_string();
        ctx.exposures =
            crate::catalog::ExposureCatalog::from_exposures(vec![exposure]).unwrap();

        let err = translate_magnitudes(vec![test_detection(20.0)], &ctx).unwrap_err();
        assert!(matches!(err, PostProcessError::Config(_)));
    }

    #[test]
    fn test_object_without_colour_entry_is_fatal() {
        let ctx = test_context();
        let mut det = test_detection(20.0);
        det.obj_id = "unlisted".to_string();
        let err = translate_magnitudes(vec![det], &ctx).unwrap_err();
        assert!(err.to_string().contains("unlisted"));
    }
}
