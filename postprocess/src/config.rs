//! Run configuration loading and validation.
//!
//! The configuration file is TOML with one table per concern, mirroring the
//! sections of the survey post-processing recipe: input file locations,
//! filter/color bookkeeping, filtering parameters, and the output target.
//! Everything is validated once at startup; a bad configuration aborts the
//! run with a specific message before any catalog is read.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PostProcessError, Result};

/// Complete run configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub inputfiles: InputFiles,
    pub filters: FilterConfig,
    pub filteringparameters: FilteringParameters,
    pub outputformat: OutputConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Paths to the four external inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    /// Predicted-detection catalog (ephemeris simulation output).
    pub detections: PathBuf,
    /// Per-object color table.
    pub colors: PathBuf,
    /// Detector-corner table describing the camera footprint.
    pub camera_footprint: PathBuf,
    /// Survey pointing database (SQLite).
    pub pointing_database: PathBuf,
}

/// Filter and color bookkeeping.
///
/// `other_colours[i]` names the color offset that carries the reference
/// magnitude into `result_filters[i + 1]`; the reference (main) filter must
/// be the first entry of `result_filters` and needs no offset.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub main_filter: String,
    pub other_colours: Vec<String>,
    pub result_filters: Vec<String>,
}

impl FilterConfig {
    /// Name of the color column that maps the main filter into `filter`,
    /// or `None` for the main filter itself.
    pub fn colour_for_filter(&self, filter: &str) -> Option<&str> {
        if filter == self.main_filter {
            return None;
        }
        self.result_filters
            .iter()
            .position(|f| f == filter)
            .map(|idx| self.other_colours[idx - 1].as_str())
    }
}

/// Detection-filtering parameters.
///
/// `detection_efficiency` and `fill_factor` are parsed and carried for
/// interface stability but not applied anywhere downstream; the SNR cutoff
/// is the hardcoded [`crate::pipeline::filters::SNR_CUTOFF`].
#[derive(Debug, Clone, Deserialize)]
pub struct FilteringParameters {
    pub detection_efficiency: f64,
    pub fill_factor: f64,
    pub min_tracklet: i64,
    pub no_tracklets: i64,
    pub tracklet_interval: f64,
    pub bright_limit: f64,
    pub in_sep_threshold: f64,
}

/// Output target: directory, file stem, and format.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub out_path: PathBuf,
    pub out_file_stem: String,
    pub output_format: OutputFormat,
}

impl OutputConfig {
    /// Full output path, stem plus the format's conventional suffix.
    pub fn output_file(&self) -> PathBuf {
        let name = format!("{}{}", self.out_file_stem, self.output_format.suffix());
        self.out_path.join(name)
    }
}

/// Supported output formats. Any other value in the config is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Sqlite3,
    Hdf5,
}

impl OutputFormat {
    pub fn suffix(&self) -> &'static str {
        match self {
            OutputFormat::Csv => ".csv",
            OutputFormat::Sqlite3 => ".db",
            OutputFormat::Hdf5 => ".h5",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Sqlite3 => write!(f, "sqlite3"),
            OutputFormat::Hdf5 => write!(f, "hdf5"),
        }
    }
}

/// Measurement-model knobs. All optional; defaults reproduce the survey's
/// nominal observing cadence and error model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the shared random generator. Unset means OS entropy.
    pub rng_seed: Option<u64>,
    /// Exposure duration in seconds, used by the trailing-loss model.
    pub exposure_time_s: f64,
    /// Photometric error model coefficient (gamma).
    pub photometric_gamma: f64,
    /// Astrometric error scale relative to seeing / SNR.
    pub astrometric_coeff: f64,
    /// Systematic astrometric floor in milliarcseconds.
    pub astrometric_sys_mas: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            exposure_time_s: 30.0,
            photometric_gamma: 0.039,
            astrometric_coeff: 0.60,
            astrometric_sys_mas: 10.0,
        }
    }
}

impl Config {
    /// Read and validate a configuration file.
    ///
    /// # Errors
    /// Returns [`PostProcessError::Config`] for a missing file, a TOML parse
    /// failure, or any constraint violation from [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PostProcessError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| PostProcessError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Enforce the startup constraints.
    ///
    /// These checks run once here, never per detection row:
    /// - `other_colours` and `result_filters` lengths must be consistent
    /// - the main filter must be the first result filter
    /// - tracklet parameters must be positive
    pub fn validate(&self) -> Result<()> {
        let filters = &self.filters;
        if filters.other_colours.len() != filters.result_filters.len() - 1 {
            return Err(PostProcessError::Config(format!(
                "mismatch in configured colours and filters: {} colours for {} result filters \
                 (expected len(other_colours) == len(result_filters) - 1)",
                filters.other_colours.len(),
                filters.result_filters.len()
            )));
        }
        if filters.result_filters.first() != Some(&filters.main_filter) {
            return Err(PostProcessError::Config(format!(
                "main filter '{}' should be the first result filter",
                filters.main_filter
            )));
        }

        let fp = &self.filteringparameters;
        if fp.min_tracklet < 1 {
            return Err(PostProcessError::Config(
                "minimum length of tracklet is zero or negative".into(),
            ));
        }
        if fp.no_tracklets < 1 {
            return Err(PostProcessError::Config(
                "number of tracklets is zero or negative".into(),
            ));
        }
        if fp.tracklet_interval <= 0.0 {
            return Err(PostProcessError::Config(
                "tracklet interval is zero or negative".into(),
            ));
        }

        if self.simulation.exposure_time_s <= 0.0 {
            return Err(PostProcessError::Config(
                "exposure time is zero or negative".into(),
            ));
        }

        Ok(())
    }
}
