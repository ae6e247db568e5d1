//! Error taxonomy for the post-processing pipeline.
//!
//! Every failure in this crate is fatal to the batch run: there is no retry
//! and no partial-result recovery. The variants below separate the three
//! classes a caller can meaningfully report on (bad configuration, broken
//! referential integrity between detections and the pointing history, and
//! numeric domain violations in the exposure data) from wrapped I/O and
//! format errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by catalog loading, pipeline stages, and output writers.
#[derive(Error, Debug)]
pub enum PostProcessError {
    /// Invalid or inconsistent run configuration. Always fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A detection references an exposure absent from the pointing database.
    /// Upstream input defect; the run aborts before the first stage.
    #[error("detection of object {object} references unknown field id {field_id}")]
    UnknownFieldId { object: String, field_id: u64 },

    /// Malformed scientific input, e.g. non-positive seeing or a
    /// non-finite limiting magnitude in the exposure store.
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// A required column is missing from a tabular input file.
    #[error("missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A cell failed to parse as the expected type.
    #[error("cannot parse '{value}' as {expected} ({path}, line {line})")]
    Parse {
        value: String,
        expected: &'static str,
        path: PathBuf,
        line: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("pointing database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("hdf5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, PostProcessError>;
