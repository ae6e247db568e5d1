//! CSV output.

use std::path::Path;

use crate::error::Result;
use crate::output::OutputRecord;

/// Write the table as CSV, replacing any existing file.
pub fn write(records: &[OutputRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
