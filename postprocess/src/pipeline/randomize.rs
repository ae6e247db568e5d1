//! Measurement noise injection.
//!
//! Draws the "observed" magnitude and sky position of each detection from
//! normal distributions centered on the true values, with the standard
//! deviations computed by the uncertainty model. Both stages consume the
//! single shared generator threaded through the pipeline, so a fixed seed
//! reproduces a run bit for bit.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::catalog::Detection;
use crate::error::{PostProcessError, Result};

/// One normal draw. A zero sigma passes the mean through untouched, which
/// keeps noiseless test fixtures exact.
fn draw_normal<R: Rng>(rng: &mut R, mean: f64, sigma: f64) -> Result<f64> {
    if sigma == 0.0 {
        return Ok(mean);
    }
    let normal = Normal::new(mean, sigma).map_err(|e| {
        PostProcessError::NumericDomain(format!(
            "invalid normal distribution (mean {mean}, sigma {sigma}): {e}"
        ))
    })?;
    Ok(normal.sample(rng))
}

/// Draw the observed magnitude for every detection:
/// `N(mag_in_filter_true, photometric_sigma_mag)`.
pub fn randomize_photometry<R: Rng>(
    mut table: Vec<Detection>,
    rng: &mut R,
) -> Result<Vec<Detection>> {
    for det in &mut table {
        det.mag_observed = draw_normal(rng, det.mag_in_filter_true, det.photometric_sigma_mag)?;
    }
    Ok(table)
}

/// Draw the observed sky position for every detection, independently per
/// axis: `N(true coordinate, astrometric sigma in degrees)`.
///
/// The true coordinates are preserved in `ra_true_deg` / `dec_true_deg`
/// before being overwritten.
pub fn randomize_astrometry<R: Rng>(
    mut table: Vec<Detection>,
    rng: &mut R,
) -> Result<Vec<Detection>> {
    for det in &mut table {
        det.ra_true_deg = det.ra_deg;
        det.dec_true_deg = det.dec_deg;

        let sigma_deg = det.astrometric_sigma_deg();
        det.ra_deg = draw_normal(rng, det.ra_true_deg, sigma_deg)?;
        det.dec_deg = draw_normal(rng, det.dec_true_deg, sigma_deg)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Detection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const N: usize = 10_000;

    fn sample_stats(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn test_photometry_converges_to_true_mag_and_sigma() {
        let mut rng = StdRng::seed_from_u64(1);
        let sigma = 0.1;

        let mut draws = Vec::with_capacity(N);
        for _ in 0..N {
            let mut det = Detection::new("x".into(), 1, 0.0, 0.0, 0.0, 0.0, 20.0);
            det.mag_in_filter_true = 20.0;
            det.photometric_sigma_mag = sigma;
            let table = randomize_photometry(vec![det], &mut rng).unwrap();
            draws.push(table[0].mag_observed);
        }

        let (mean, std) = sample_stats(&draws);
        // Standard error of the mean is sigma/sqrt(N) = 0.001
        assert!((mean - 20.0).abs() < 5e-3, "sample mean {mean}");
        assert!((std - sigma).abs() / sigma < 0.05, "sample sigma {std}");
    }

    #[test]
    fn test_astrometry_converges_per_axis() {
        let mut rng = StdRng::seed_from_u64(2);
        let sigma_mas = 100.0;
        let sigma_deg = sigma_mas / 3_600_000.0;

        let mut ra = Vec::with_capacity(N);
        let mut dec = Vec::with_capacity(N);
        for _ in 0..N {
            let mut det = Detection::new("x".into(), 1, 150.0, -30.0, 0.0, 0.0, 20.0);
            det.astrometric_sigma_mas = sigma_mas;
            let table = randomize_astrometry(vec![det], &mut rng).unwrap();
            ra.push(table[0].ra_deg);
            dec.push(table[0].dec_deg);
        }

        let (ra_mean, ra_std) = sample_stats(&ra);
        let (dec_mean, dec_std) = sample_stats(&dec);
        // 5 standard errors of the mean: 0.05 sigma at N = 10_000
        assert!((ra_mean - 150.0).abs() < 0.05 * sigma_deg);
        assert!((dec_mean - -30.0).abs() < 0.05 * sigma_deg);
        assert!((ra_std - sigma_deg).abs() / sigma_deg < 0.05);
        assert!((dec_std - sigma_deg).abs() / sigma_deg < 0.05);
    }

    #[test]
    fn test_true_coordinates_preserved() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut det = Detection::new("x".into(), 1, 10.0, 20.0, 0.0, 0.0, 20.0);
        det.astrometric_sigma_mas = 50.0;

        let table = randomize_astrometry(vec![det], &mut rng).unwrap();
        assert_eq!(table[0].ra_true_deg, 10.0);
        assert_eq!(table[0].dec_true_deg, 20.0);
        assert_ne!(table[0].ra_deg, 10.0);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut det = Detection::new("x".into(), 1, 10.0, 20.0, 0.0, 0.0, 20.0);
        det.mag_in_filter_true = 20.0;
        det.photometric_sigma_mag = 0.0;
        det.astrometric_sigma_mas = 0.0;

        let table = randomize_photometry(vec![det], &mut rng).unwrap();
        let table = randomize_astrometry(table, &mut rng).unwrap();
        assert_eq!(table[0].mag_observed, 20.0);
        assert_eq!(table[0].ra_deg, 10.0);
        assert_eq!(table[0].dec_deg, 20.0);
    }

    #[test]
    fn test_negative_sigma_is_a_domain_error() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut det = Detection::new("x".into(), 1, 0.0, 0.0, 0.0, 0.0, 20.0);
        det.mag_in_filter_true = 20.0;
        det.photometric_sigma_mag = -0.1;

        let err = randomize_photometry(vec![det], &mut rng).unwrap_err();
        assert!(matches!(err, PostProcessError::NumericDomain(_)));
    }
}
