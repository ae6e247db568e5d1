//! Output writers for the final detection table.
//!
//! One flat [`OutputRecord`] row shape is shared by all three formats.
//! CSV and SQLite runs replace the output file; the HDF5 writer appends
//! to an existing file so successive runs accumulate into one store.

mod csv_file;
mod hdf5_file;
mod sqlite_file;

use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::Detection;
use crate::config::{OutputConfig, OutputFormat};
use crate::error::Result;

/// One output row. Column names follow the ephemeris convention so the
/// result table joins cleanly against upstream products.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "ObjID")]
    pub obj_id: String,
    #[serde(rename = "FieldID")]
    pub field_id: i64,
    #[serde(rename = "FieldMJD")]
    pub field_mjd: f64,
    #[serde(rename = "Filter")]
    pub filter: String,
    #[serde(rename = "AstRA(deg)")]
    pub ra_deg: f64,
    #[serde(rename = "AstDec(deg)")]
    pub dec_deg: f64,
    #[serde(rename = "AstRATrue(deg)")]
    pub ra_true_deg: f64,
    #[serde(rename = "AstDecTrue(deg)")]
    pub dec_true_deg: f64,
    #[serde(rename = "AstRARate(deg/day)")]
    pub ra_rate_deg_day: f64,
    #[serde(rename = "AstDecRate(deg/day)")]
    pub dec_rate_deg_day: f64,
    #[serde(rename = "MaginFilterTrue")]
    pub mag_in_filter_true: f64,
    #[serde(rename = "MaginFilter")]
    pub mag_observed: f64,
    #[serde(rename = "PhotometricSigma(mag)")]
    pub photometric_sigma_mag: f64,
    #[serde(rename = "SNR")]
    pub snr: f64,
    #[serde(rename = "AstrometricSigma(deg)")]
    pub astrometric_sigma_deg: f64,
    #[serde(rename = "dmagDetect")]
    pub trailing_loss_mag: f64,
}

impl From<&Detection> for OutputRecord {
    fn from(det: &Detection) -> Self {
        Self {
            obj_id: det.obj_id.clone(),
            // Field ids are integral throughout; the cast pins the output
            // type for stable join keys
            field_id: det.field_id as i64,
            field_mjd: det.field_mjd,
            filter: det.filter.clone(),
            ra_deg: det.ra_deg,
            dec_deg: det.dec_deg,
            ra_true_deg: det.ra_true_deg,
            dec_true_deg: det.dec_true_deg,
            ra_rate_deg_day: det.ra_rate_deg_day,
            dec_rate_deg_day: det.dec_rate_deg_day,
            mag_in_filter_true: det.mag_in_filter_true,
            mag_observed: det.mag_observed,
            photometric_sigma_mag: det.photometric_sigma_mag,
            snr: det.snr,
            astrometric_sigma_deg: det.astrometric_sigma_deg(),
            trailing_loss_mag: det.trailing_loss_mag,
        }
    }
}

/// Write the final table in the configured format.
///
/// Returns the path written. The output directory is created if missing.
pub fn write_output(table: &[Detection], config: &OutputConfig) -> Result<PathBuf> {
    let records: Vec<OutputRecord> = table.iter().map(OutputRecord::from).collect();

    std::fs::create_dir_all(&config.out_path)?;
    let path = config.output_file();
    match config.output_format {
        OutputFormat::Csv => csv_file::write(&records, &path)?,
        OutputFormat::Sqlite3 => sqlite_file::write(&records, &path)?,
        OutputFormat::Hdf5 => hdf5_file::write(&records, &path)?,
    }
    Ok(path)
}
