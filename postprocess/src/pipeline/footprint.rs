//! Sensor-footprint containment filter.
//!
//! A detection's randomized sky position only becomes a recorded
//! observation if it lands on a physical detector chip. This stage maps
//! each position into its exposure's focal-plane frame (a gnomonic
//! tangent-plane projection about the field center, followed by a
//! rotation by the negative of the exposure's on-sky rotation angle) and
//! keeps the detection iff at least one chip polygon of the camera
//! footprint contains the projected point. Positions in the gaps between
//! chips, or outside the mosaic altogether, are dropped.
//!
//! This is the costliest stage for large tables; each chip polygon caches
//! a bounding box so most chips are rejected without a full
//! point-in-polygon test.

use nalgebra::{Rotation2, Vector2};

use crate::catalog::{Detection, Exposure};
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// Project a sky coordinate into an exposure's focal-plane frame.
///
/// Gnomonic projection about the exposure's field center, axes aligned
/// +x with increasing RA and +y with increasing Dec before the rotation
/// by `-rot_sky_deg` aligns them with the detector grid. Output is in
/// radians on the tangent plane.
///
/// Returns `None` when the point is 90 degrees or more from the field
/// center, where the projection is undefined; such points are off-sensor
/// by any definition.
pub fn project_to_focal_plane(
    ra_deg: f64,
    dec_deg: f64,
    exposure: &Exposure,
) -> Option<Vector2<f64>> {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    let ra0 = exposure.field_ra_deg.to_radians();
    let dec0 = exposure.field_dec_deg.to_radians();

    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let (sin_dra, cos_dra) = (ra - ra0).sin_cos();

    // Angular separation from the tangent point
    let cos_c = sin_dec0 * sin_dec + cos_dec0 * cos_dec * cos_dra;
    if cos_c <= 0.0 {
        return None;
    }

    let x = cos_dec * sin_dra / cos_c;
    let y = (cos_dec0 * sin_dec - sin_dec0 * cos_dec * cos_dra) / cos_c;

    // Undo the camera's on-sky rotation
    let rot = Rotation2::new(-exposure.rot_sky_deg.to_radians());
    Some(rot * Vector2::new(x, y))
}

/// Drop detections whose observed position misses every detector chip.
pub fn footprint_filter(table: Vec<Detection>, ctx: &PipelineContext) -> Result<Vec<Detection>> {
    let mut kept = Vec::with_capacity(table.len());
    for det in table {
        let exposure = ctx.exposure(det.field_id)?;
        let on_sensor = project_to_focal_plane(det.ra_deg, det.dec_deg, exposure)
            .map(|p| ctx.footprint.on_sensor(p.x, p.y))
            .unwrap_or(false);
        if on_sensor {
            kept.push(det);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::pointings::test_exposure;
    use crate::pipeline::test_support::{test_context, test_detection};
    use approx::assert_relative_eq;

    #[test]
    fn test_field_center_projects_to_origin() {
        let exposure = test_exposure(1);
        let p = project_to_focal_plane(100.0, -20.0, &exposure).unwrap();
        assert!(float_cmp::approx_eq!(f64, p.x, 0.0, epsilon = 1e-15));
        assert!(float_cmp::approx_eq!(f64, p.y, 0.0, epsilon = 1e-15));
    }

    #[test]
    fn test_gnomonic_offsets_without_rotation() {
        let mut exposure = test_exposure(1);
        exposure.field_ra_deg = 0.0;
        exposure.field_dec_deg = 0.0;
        exposure.rot_sky_deg = 0.0;

        // One degree east: x = tan(1 deg), y = 0
        let p = project_to_focal_plane(1.0, 0.0, &exposure).unwrap();
        assert_relative_eq!(p.x, 1f64.to_radians().tan(), epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);

        // One degree north: y = tan(1 deg), x = 0
        let p = project_to_focal_plane(0.0, 1.0, &exposure).unwrap();
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1f64.to_radians().tan(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_swings_north_onto_x() {
        let mut exposure = test_exposure(1);
        exposure.field_ra_deg = 0.0;
        exposure.field_dec_deg = 0.0;
        exposure.rot_sky_deg = 90.0;

        // With the camera rotated 90 degrees, a point north of center
        // lands on the +x detector axis
        let p = project_to_focal_plane(0.0, 1.0, &exposure).unwrap();
        assert_relative_eq!(p.x, 1f64.to_radians().tan(), epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_antipode_is_undefined() {
        let mut exposure = test_exposure(1);
        exposure.field_ra_deg = 0.0;
        exposure.field_dec_deg = 0.0;
        assert!(project_to_focal_plane(180.0, 0.0, &exposure).is_none());
        assert!(project_to_focal_plane(90.0, 0.0, &exposure).is_none());
    }

    #[test]
    fn test_filter_keeps_centered_drops_offset() {
        let ctx = test_context(); // chip spans +/- 0.01 rad about the origin

        // At the field center: on-chip
        let centered = test_detection(21.0);

        // Two degrees away: ~0.035 rad, off the chip
        let mut offset = test_detection(21.0);
        offset.ra_deg += 2.0;

        let kept = footprint_filter(vec![centered, offset], &ctx).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ra_deg, 100.0);
    }

    #[test]
    fn test_filter_drops_far_side_of_sky() {
        let ctx = test_context();
        let mut det = test_detection(21.0);
        det.ra_deg = 280.0; // opposite hemisphere
        det.dec_deg = 20.0;

        let kept = footprint_filter(vec![det], &ctx).unwrap();
        assert!(kept.is_empty());
    }
}
