//! Predicted-detection table.
//!
//! One [`Detection`] is one predicted sighting of one simulated object in
//! one survey exposure. The table is loaded once from the ephemeris
//! simulation output and then owned by the pipeline, which fills in the
//! derived fields stage by stage and shrinks the table at the filter
//! stages. Rows are never aliased outside the pipeline.

use std::path::Path;

use crate::error::{PostProcessError, Result};

/// One predicted sighting, plus the measurement fields the pipeline derives.
///
/// Derived fields start out as `f64::NAN` (or empty for the filter name) and
/// are only meaningful after the stage that computes them has run. Filter
/// stages never mutate rows; they rebuild the table contiguously.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Simulated object identifier.
    pub obj_id: String,
    /// Exposure identifier; must exist in the pointing database.
    pub field_id: u64,
    /// True right ascension in degrees.
    pub ra_deg: f64,
    /// True declination in degrees.
    pub dec_deg: f64,
    /// RA rate in degrees/day (coordinate rate; the on-sky rate applies
    /// the cos-declination factor).
    pub ra_rate_deg_day: f64,
    /// Dec rate in degrees/day.
    pub dec_rate_deg_day: f64,
    /// True magnitude in the reference (main) filter.
    pub mag_true: f64,

    /// True magnitude translated into the exposure's filter.
    pub mag_in_filter_true: f64,
    /// Astrometric uncertainty in milliarcseconds.
    pub astrometric_sigma_mas: f64,
    /// Photometric uncertainty in magnitudes.
    pub photometric_sigma_mag: f64,
    /// Signal-to-noise ratio of the detection.
    pub snr: f64,
    /// Observed (noise-injected) magnitude in the exposure's filter.
    pub mag_observed: f64,
    /// Magnitude lost to trailing during the exposure.
    pub trailing_loss_mag: f64,
    /// True coordinates, preserved before astrometric randomization.
    pub ra_true_deg: f64,
    pub dec_true_deg: f64,
    /// Resolved exposure filter name (assembly stage).
    pub filter: String,
    /// Observation start MJD of the exposure (assembly stage).
    pub field_mjd: f64,
}

impl Detection {
    /// Build a detection with all derived fields unset.
    pub fn new(
        obj_id: String,
        field_id: u64,
        ra_deg: f64,
        dec_deg: f64,
        ra_rate_deg_day: f64,
        dec_rate_deg_day: f64,
        mag_true: f64,
    ) -> Self {
        Self {
            obj_id,
            field_id,
            ra_deg,
            dec_deg,
            ra_rate_deg_day,
            dec_rate_deg_day,
            mag_true,
            mag_in_filter_true: f64::NAN,
            astrometric_sigma_mas: f64::NAN,
            photometric_sigma_mag: f64::NAN,
            snr: f64::NAN,
            mag_observed: f64::NAN,
            trailing_loss_mag: f64::NAN,
            ra_true_deg: f64::NAN,
            dec_true_deg: f64::NAN,
            filter: String::new(),
            field_mjd: f64::NAN,
        }
    }

    /// Astrometric uncertainty in degrees (mas / 3.6e6).
    pub fn astrometric_sigma_deg(&self) -> f64 {
        self.astrometric_sigma_mas / 3_600_000.0
    }
}

/// Load the detection table from the ephemeris CSV output.
///
/// Required columns: `ObjID`, `FieldID`, `AstRA(deg)`, `AstDec(deg)`,
/// `AstRARate(deg/day)`, `AstDecRate(deg/day)`, and the reference-band
/// magnitude column named after the main filter (e.g. `V`). The magnitude
/// column name is dynamic, so the reader resolves header positions up front
/// instead of using a fixed-shape record.
pub fn load_detections(path: &Path, main_filter: &str) -> Result<Vec<Detection>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PostProcessError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })
    };

    let obj_col = col("ObjID")?;
    let field_col = col("FieldID")?;
    let ra_col = col("AstRA(deg)")?;
    let dec_col = col("AstDec(deg)")?;
    let ra_rate_col = col("AstRARate(deg/day)")?;
    let dec_rate_col = col("AstDecRate(deg/day)")?;
    let mag_col = col(main_filter)?;

    let mut table = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // CSV line numbers: header is line 1
        let line = idx + 2;
        let parse_f64 = |col: usize| -> Result<f64> {
            let value = &record[col];
            value
                .parse::<f64>()
                .map_err(|_| PostProcessError::Parse {
                    value: value.to_string(),
                    expected: "f64",
                    path: path.to_path_buf(),
                    line,
                })
        };

        // Field ids may be serialized as floats upstream; accept "123.0"
        let field_raw = &record[field_col];
        let field_id = field_raw
            .parse::<u64>()
            .or_else(|_| field_raw.parse::<f64>().map(|f| f as u64))
            .map_err(|_| PostProcessError::Parse {
                value: field_raw.to_string(),
                expected: "field id",
                path: path.to_path_buf(),
                line,
            })?;

        table.push(Detection::new(
            record[obj_col].to_string(),
            field_id,
            parse_f64(ra_col)?,
            parse_f64(dec_col)?,
            parse_f64(ra_rate_col)?,
            parse_f64(dec_rate_col)?,
            parse_f64(mag_col)?,
        ));
    }

    Ok(table)
}
