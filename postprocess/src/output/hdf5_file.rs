//! HDF5 output.
//!
//! The columnar format accumulates: the dataset is created resizable on
//! the first run, and later runs against the same file extend it instead
//! of overwriting. Rows are a compound type mirroring
//! [`OutputRecord`](crate::output::OutputRecord), with variable-length
//! strings for the object id and filter name.

use std::path::Path;

use hdf5::types::VarLenUnicode;
use hdf5::{File, H5Type};

use crate::error::{PostProcessError, Result};
use crate::output::OutputRecord;

const DATASET: &str = "data";
const CHUNK: usize = 1024;

#[derive(H5Type, Clone)]
#[repr(C)]
struct Row {
    obj_id: VarLenUnicode,
    field_id: i64,
    field_mjd: f64,
    filter: VarLenUnicode,
    ra_deg: f64,
    dec_deg: f64,
    ra_true_deg: f64,
    dec_true_deg: f64,
    ra_rate_deg_day: f64,
    dec_rate_deg_day: f64,
    mag_in_filter_true: f64,
    mag_observed: f64,
    photometric_sigma_mag: f64,
    snr: f64,
    astrometric_sigma_deg: f64,
    trailing_loss_mag: f64,
}

fn varlen(s: &str) -> Result<VarLenUnicode> {
    s.parse::<VarLenUnicode>()
        .map_err(|e| PostProcessError::Hdf5(hdf5::Error::from(format!("bad string '{s}': {e}"))))
}

impl Row {
    fn from_record(r: &OutputRecord) -> Result<Self> {
        Ok(Self {
            obj_id: varlen(&r.obj_id)?,
            field_id: r.field_id,
            field_mjd: r.field_mjd,
            filter: varlen(&r.filter)?,
            ra_deg: r.ra_deg,
            dec_deg: r.dec_deg,
            ra_true_deg: r.ra_true_deg,
            dec_true_deg: r.dec_true_deg,
            ra_rate_deg_day: r.ra_rate_deg_day,
            dec_rate_deg_day: r.dec_rate_deg_day,
            mag_in_filter_true: r.mag_in_filter_true,
            mag_observed: r.mag_observed,
            photometric_sigma_mag: r.photometric_sigma_mag,
            snr: r.snr,
            astrometric_sigma_deg: r.astrometric_sigma_deg,
            trailing_loss_mag: r.trailing_loss_mag,
        })
    }
}

/// Append the table to the HDF5 store, creating file and dataset on the
/// first run.
pub fn write(records: &[OutputRecord], path: &Path) -> Result<()> {
    let rows: Vec<Row> = records.iter().map(Row::from_record).collect::<Result<_>>()?;

    let file = File::append(path)?;
    let dataset = match file.dataset(DATASET) {
        Ok(existing) => existing,
        Err(_) => file
            .new_dataset::<Row>()
            .chunk(CHUNK)
            .shape(0..)
            .create(DATASET)?,
    };

    let start = dataset.size();
    dataset.resize(start + rows.len())?;
    dataset.write_slice(&rows, start..start + rows.len())?;
    Ok(())
}
