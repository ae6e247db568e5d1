//! SQLite output.
//!
//! Writes the final table into a `detections` table, one insert per row
//! inside a single transaction. Column names keep the ephemeris
//! convention (quoted, since some contain parentheses).

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::output::OutputRecord;

const CREATE_TABLE: &str = "\
DROP TABLE IF EXISTS detections;
CREATE TABLE detections (
    \"ObjID\" TEXT NOT NULL,
    \"FieldID\" INTEGER NOT NULL,
    \"FieldMJD\" REAL,
    \"Filter\" TEXT,
    \"AstRA(deg)\" REAL,
    \"AstDec(deg)\" REAL,
    \"AstRATrue(deg)\" REAL,
    \"AstDecTrue(deg)\" REAL,
    \"AstRARate(deg/day)\" REAL,
    \"AstDecRate(deg/day)\" REAL,
    \"MaginFilterTrue\" REAL,
    \"MaginFilter\" REAL,
    \"PhotometricSigma(mag)\" REAL,
    \"SNR\" REAL,
    \"AstrometricSigma(deg)\" REAL,
    \"dmagDetect\" REAL
);";

/// Write the table into a SQLite database, replacing any existing
/// `detections` table.
pub fn write(records: &[OutputRecord], path: &Path) -> Result<()> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_TABLE)?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO detections VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )?;
        for r in records {
            stmt.execute(params![
                r.obj_id,
                r.field_id,
                r.field_mjd,
                r.filter,
                r.ra_deg,
                r.dec_deg,
                r.ra_true_deg,
                r.dec_true_deg,
                r.ra_rate_deg_day,
                r.dec_rate_deg_day,
                r.mag_in_filter_true,
                r.mag_observed,
                r.photometric_sigma_mag,
                r.snr,
                r.astrometric_sigma_deg,
                r.trailing_loss_mag,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}
