//! Per-object color table.
//!
//! Maps each simulated object to its magnitude offsets between the
//! reference filter and every other survey filter. The input is a
//! whitespace-delimited text table with an `ObjID` column followed by one
//! column per color (e.g. `V-u V-g V-r ...`).

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PostProcessError, Result};

/// Color offsets for all objects, keyed by object id and color name.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    /// Color column names in file order.
    colours: Vec<String>,
    /// Object id -> offsets aligned with `colours`.
    offsets: HashMap<String, Vec<f64>>,
}

impl ColorTable {
    /// Load a whitespace-delimited color table.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut lines = text.lines().enumerate();

        let (_, header) = lines
            .next()
            .ok_or_else(|| PostProcessError::Config(format!("{}: empty color table", path.display())))?;
        let mut columns = header.split_whitespace();
        match columns.next() {
            Some("ObjID") => {}
            _ => {
                return Err(PostProcessError::MissingColumn {
                    column: "ObjID".to_string(),
                    path: path.to_path_buf(),
                })
            }
        }
        let colours: Vec<String> = columns.map(str::to_string).collect();

        let mut offsets = HashMap::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(obj_id) = fields.next().map(str::to_string) else {
                continue;
            };
            let values: Vec<f64> = fields
                .map(|v| {
                    v.parse::<f64>().map_err(|_| PostProcessError::Parse {
                        value: v.to_string(),
                        expected: "f64",
                        path: path.to_path_buf(),
                        line: idx + 1,
                    })
                })
                .collect::<Result<_>>()?;
            if values.len() != colours.len() {
                return Err(PostProcessError::Config(format!(
                    "{}: line {} has {} offsets for {} colour columns",
                    path.display(),
                    idx + 1,
                    values.len(),
                    colours.len()
                )));
            }
            offsets.insert(obj_id, values);
        }

        Ok(Self { colours, offsets })
    }

    /// Check that every configured color has a column in this table.
    pub fn check_colours(&self, configured: &[String]) -> Result<()> {
        for colour in configured {
            if !self.colours.iter().any(|c| c == colour) {
                return Err(PostProcessError::Config(format!(
                    "color table has no column for configured colour '{colour}'"
                )));
            }
        }
        Ok(())
    }

    /// Offset for (object, colour), if present.
    pub fn offset(&self, obj_id: &str, colour: &str) -> Option<f64> {
        let idx = self.colours.iter().position(|c| c == colour)?;
        self.offsets.get(obj_id).map(|values| values[idx])
    }

    /// Number of objects in the table.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Build a table in memory (tests, synthetic runs).
    pub fn from_offsets(colours: Vec<String>, offsets: HashMap<String, Vec<f64>>) -> Self {
        Self { colours, offsets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
ObjID V-u V-g V-r
S100a 1.7 -0.3 0.2
S100b 1.5 -0.1 0.15
";

    fn write_sample(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_lookup() {
        let file = write_sample(SAMPLE);
        let table = ColorTable::load(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.offset("S100a", "V-g"), Some(-0.3));
        assert_eq!(table.offset("S100b", "V-r"), Some(0.15));
        assert_eq!(table.offset("S100a", "V-y"), None);
        assert_eq!(table.offset("missing", "V-g"), None);
    }

    #[test]
    fn test_check_colours() {
        let file = write_sample(SAMPLE);
        let table = ColorTable::load(file.path()).unwrap();

        assert!(table
            .check_colours(&["V-u".into(), "V-g".into()])
            .is_ok());
        assert!(table.check_colours(&["V-z".into()]).is_err());
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let file = write_sample("ObjID V-u V-g\nS100a 1.7\n");
        assert!(ColorTable::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_objid_header() {
        let file = write_sample("name V-u\nS100a 1.7\n");
        let err = ColorTable::load(file.path()).unwrap_err();
        assert!(matches!(err, PostProcessError::MissingColumn { .. }));
    }
}
