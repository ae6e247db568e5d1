//! Survey pointing history (exposure catalog).
//!
//! Exposures are loaded once from the survey's SQLite pointing database and
//! held immutable for the whole run. The database schema splits the fields
//! the pipeline needs across two queries, observing conditions first and
//! pointing geometry second, both ordered by observation id and merged
//! here into one record per exposure. The connection is scoped to
//! [`ExposureCatalog::load`], so it is released on every exit path,
//! including early-return errors.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{PostProcessError, Result};

/// One completed survey pointing.
#[derive(Debug, Clone)]
pub struct Exposure {
    /// Unique observation identifier; detections join on this.
    pub observation_id: u64,
    /// Field center right ascension in degrees.
    pub field_ra_deg: f64,
    /// Field center declination in degrees.
    pub field_dec_deg: f64,
    /// Observation start time, MJD.
    pub observation_mjd: f64,
    /// Rotation angle of the focal plane on sky, degrees.
    pub rot_sky_deg: f64,
    /// Filter this exposure was taken in.
    pub filter: String,
    /// Geometric seeing FWHM in arcseconds (trailing-loss model).
    pub seeing_fwhm_geom_arcsec: f64,
    /// Effective seeing FWHM in arcseconds (astrometric error model).
    pub seeing_fwhm_eff_arcsec: f64,
    /// Five-sigma limiting magnitude.
    pub five_sigma_depth: f64,
}

/// Immutable exposure collection, indexed by observation id.
#[derive(Debug, Clone, Default)]
pub struct ExposureCatalog {
    exposures: HashMap<u64, Exposure>,
}

impl ExposureCatalog {
    /// Load the pointing history from a SQLite database.
    ///
    /// Runs the two standard queries against `SummaryAllProps` (conditions,
    /// then geometry), merges them by observation id, and validates the
    /// numeric domain of every exposure before returning.
    pub fn load(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut exposures: HashMap<u64, Exposure> = HashMap::new();

        let mut stmt = conn.prepare(
            "SELECT observationId, observationStartMJD, filter, seeingFwhmGeom, \
             seeingFwhmEff, fiveSigmaDepth FROM SummaryAllProps ORDER BY observationId",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Exposure {
                observation_id: row.get::<_, i64>(0)? as u64,
                field_ra_deg: f64::NAN,
                field_dec_deg: f64::NAN,
                observation_mjd: row.get(1)?,
                rot_sky_deg: f64::NAN,
                filter: row.get(2)?,
                seeing_fwhm_geom_arcsec: row.get(3)?,
                seeing_fwhm_eff_arcsec: row.get(4)?,
                five_sigma_depth: row.get(5)?,
            })
        })?;
        for exposure in rows {
            let exposure = exposure?;
            exposures.insert(exposure.observation_id, exposure);
        }
        drop(stmt);

        let mut stmt = conn.prepare(
            "SELECT fieldRA, fieldDec, observationStartMJD, observationId, rotSkyPos \
             FROM SummaryAllProps ORDER BY observationId",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(3)? as u64,
                row.get::<_, f64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(4)?,
            ))
        })?;
        for row in rows {
            let (id, ra, dec, rot) = row?;
            if let Some(exposure) = exposures.get_mut(&id) {
                exposure.field_ra_deg = ra;
                exposure.field_dec_deg = dec;
                exposure.rot_sky_deg = rot;
            }
        }

        let catalog = Self { exposures };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate the numeric domain of every loaded exposure.
    ///
    /// Malformed exposure data would otherwise surface as negative or NaN
    /// uncertainties deep inside the pipeline.
    fn validate(&self) -> Result<()> {
        for exposure in self.exposures.values() {
            if !(exposure.seeing_fwhm_geom_arcsec > 0.0 && exposure.seeing_fwhm_eff_arcsec > 0.0) {
                return Err(PostProcessError::NumericDomain(format!(
                    "exposure {} has non-positive seeing ({} geom, {} eff)",
                    exposure.observation_id,
                    exposure.seeing_fwhm_geom_arcsec,
                    exposure.seeing_fwhm_eff_arcsec
                )));
            }
            if !exposure.five_sigma_depth.is_finite() {
                return Err(PostProcessError::NumericDomain(format!(
                    "exposure {} has non-finite limiting magnitude",
                    exposure.observation_id
                )));
            }
            if !(exposure.field_ra_deg.is_finite()
                && exposure.field_dec_deg.is_finite()
                && exposure.rot_sky_deg.is_finite())
            {
                return Err(PostProcessError::NumericDomain(format!(
                    "exposure {} is missing pointing geometry",
                    exposure.observation_id
                )));
            }
        }
        Ok(())
    }

    /// Look up an exposure by observation id.
    pub fn get(&self, observation_id: u64) -> Option<&Exposure> {
        self.exposures.get(&observation_id)
    }

    /// Number of exposures in the catalog.
    pub fn len(&self) -> usize {
        self.exposures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposures.is_empty()
    }

    /// Check that every detection's field id resolves to an exposure.
    ///
    /// Referential breaks are an upstream input defect and abort the run
    /// before the first pipeline stage, rather than silently dropping rows.
    pub fn check_referential_integrity(
        &self,
        table: &[crate::catalog::Detection],
    ) -> Result<()> {
        for detection in table {
            if !self.exposures.contains_key(&detection.field_id) {
                return Err(PostProcessError::UnknownFieldId {
                    object: detection.obj_id.clone(),
                    field_id: detection.field_id,
                });
            }
        }
        Ok(())
    }

    /// Build a catalog directly from exposure records (tests, synthetic runs).
    pub fn from_exposures(list: Vec<Exposure>) -> Result<Self> {
        let catalog = Self {
            exposures: list
                .into_iter()
                .map(|e| (e.observation_id, e))
                .collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Canonical exposure used by unit tests across the crate.
#[cfg(test)]
pub(crate) fn test_exposure(id: u64) -> Exposure {
    Exposure {
        observation_id: id,
        field_ra_deg: 100.0,
        field_dec_deg: -20.0,
        observation_mjd: 60000.25,
        rot_sky_deg: 15.0,
        filter: "r".to_string(),
        seeing_fwhm_geom_arcsec: 0.8,
        seeing_fwhm_eff_arcsec: 0.9,
        five_sigma_depth: 24.5,
    }
}
