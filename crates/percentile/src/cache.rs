//! Persisted percentile thresholds.
//!
//! A cache holds full-grid thresholds per variable: the out-of-base
//! threshold and, in [`CacheMode::All`], every in-base candidate keyed by
//! `(study_year, substitute_year)`. It is stored as JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use boreas_calendar::{Calendar, TimeRange};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Interpolation;
use crate::doy::DoyThreshold;
use crate::error::PercentileError;
use crate::wet::WetDayThreshold;

/// Which thresholds a run stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Only the out-of-base thresholds.
    #[default]
    OutOfBase,
    /// Out-of-base thresholds plus every bootstrap candidate.
    All,
}

/// Parameters a cached threshold depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheParameters {
    /// Base period.
    pub base_period: TimeRange,
    /// Day-of-year window width.
    pub window: usize,
    /// Interpolation method.
    pub interpolation: Interpolation,
    /// February 29 pooled from leap years only.
    pub leap_years_only: bool,
    /// February 29 rows removed before estimation.
    pub exclude_leap_days: bool,
    /// Calendar of the base series.
    pub calendar: Calendar,
    /// Full grid `(rows, cols)`.
    pub grid: (usize, usize),
}

impl CacheParameters {
    fn first_difference(&self, other: &CacheParameters) -> Option<String> {
        if self.base_period != other.base_period {
            return Some(format!(
                "base period {}..{} != {}..{}",
                self.base_period.start(),
                self.base_period.end(),
                other.base_period.start(),
                other.base_period.end()
            ));
        }
        if self.window != other.window {
            return Some(format!("window {} != {}", self.window, other.window));
        }
        if self.interpolation != other.interpolation {
            return Some(format!(
                "interpolation {:?} != {:?}",
                self.interpolation, other.interpolation
            ));
        }
        if self.leap_years_only != other.leap_years_only {
            return Some(format!(
                "leap_years_only {} != {}",
                self.leap_years_only, other.leap_years_only
            ));
        }
        if self.exclude_leap_days != other.exclude_leap_days {
            return Some(format!(
                "exclude_leap_days {} != {}",
                self.exclude_leap_days, other.exclude_leap_days
            ));
        }
        if self.calendar != other.calendar {
            return Some(format!("calendar {} != {}", self.calendar, other.calendar));
        }
        if self.grid != other.grid {
            return Some(format!("grid {:?} != {:?}", self.grid, other.grid));
        }
        None
    }
}

/// Out-of-base threshold of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedThreshold {
    /// Day-of-year threshold.
    DayOfYear(DoyThreshold),
    /// Wet-day threshold.
    WetDay(WetDayThreshold),
}

/// Bootstrap candidate threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InBaseEntry {
    /// Year removed from the base.
    pub study_year: i32,
    /// Year duplicated in its place.
    pub substitute_year: i32,
    /// Threshold of the pseudo-base.
    pub threshold: DoyThreshold,
}

/// Cached thresholds of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCache {
    /// Percentile the thresholds were computed for.
    pub percentile: f64,
    /// Threshold of the unmodified base.
    pub out_of_base: Option<CachedThreshold>,
    /// Bootstrap candidates, ordered by `(study_year, substitute_year)`.
    #[serde(default)]
    pub in_base: Vec<InBaseEntry>,
}

impl VariableCache {
    /// Returns the candidate for `(study_year, substitute_year)`.
    pub fn candidate(&self, study_year: i32, substitute_year: i32) -> Option<&DoyThreshold> {
        self.in_base
            .binary_search_by_key(&(study_year, substitute_year), |e| {
                (e.study_year, e.substitute_year)
            })
            .ok()
            .map(|i| &self.in_base[i].threshold)
    }

    /// Returns the candidate for `(study_year, substitute_year)`, inserting
    /// a fill-valued full grid on first access.
    pub fn candidate_mut(
        &mut self,
        study_year: i32,
        substitute_year: i32,
        template: &CacheParameters,
        fill_value: f64,
    ) -> &mut DoyThreshold {
        let key = (study_year, substitute_year);
        let i = match self
            .in_base
            .binary_search_by_key(&key, |e| (e.study_year, e.substitute_year))
        {
            Ok(i) => i,
            Err(i) => {
                let (rows, cols) = template.grid;
                self.in_base.insert(
                    i,
                    InBaseEntry {
                        study_year,
                        substitute_year,
                        threshold: DoyThreshold::filled(rows, cols, template.calendar, fill_value),
                    },
                );
                i
            }
        };
        &mut self.in_base[i].threshold
    }
}

/// Percentile thresholds shared between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileCache {
    parameters: CacheParameters,
    mode: CacheMode,
    variables: BTreeMap<String, VariableCache>,
}

impl PercentileCache {
    /// Creates an empty cache.
    pub fn new(parameters: CacheParameters, mode: CacheMode) -> Self {
        Self {
            parameters,
            mode,
            variables: BTreeMap::new(),
        }
    }

    /// Returns the parameters.
    pub fn parameters(&self) -> &CacheParameters {
        &self.parameters
    }

    /// Returns the mode.
    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Checks that this cache was built with `expected` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::CacheMismatch`] naming the first
    /// differing parameter.
    pub fn check(&self, expected: &CacheParameters) -> Result<(), PercentileError> {
        match self.parameters.first_difference(expected) {
            Some(reason) => Err(PercentileError::CacheMismatch { reason }),
            None => Ok(()),
        }
    }

    /// Returns the entry of `variable`, checking its percentile.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::CacheMismatch`] if the entry exists with
    /// another percentile.
    pub fn variable(
        &self,
        variable: &str,
        percentile: f64,
    ) -> Result<Option<&VariableCache>, PercentileError> {
        match self.variables.get(variable) {
            Some(entry) if entry.percentile != percentile => Err(PercentileError::CacheMismatch {
                reason: format!(
                    "variable '{variable}' cached for percentile {} but {percentile} requested",
                    entry.percentile
                ),
            }),
            other => Ok(other),
        }
    }

    /// Returns the entry of `variable`, creating it if needed.
    pub fn variable_mut(&mut self, variable: &str, percentile: f64) -> &mut VariableCache {
        self.variables
            .entry(variable.to_string())
            .or_insert_with(|| VariableCache {
                percentile,
                out_of_base: None,
                in_base: Vec::new(),
            })
    }

    /// Returns the cached variable names.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Checks that a cache could be written to `path` without writing it.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::CacheIo`] if `path` is a directory or its
    /// parent is missing, not a directory or read-only.
    pub fn check_writable(path: &Path) -> Result<(), PercentileError> {
        let io_err = |reason: String| PercentileError::CacheIo {
            path: path.display().to_string(),
            reason,
        };
        if path.is_dir() {
            return Err(io_err("path is a directory".to_string()));
        }
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = std::fs::metadata(parent)
            .map_err(|_| io_err(format!("directory {} does not exist", parent.display())))?;
        if !meta.is_dir() {
            return Err(io_err(format!("{} is not a directory", parent.display())));
        }
        if meta.permissions().readonly() {
            return Err(io_err(format!("directory {} is read-only", parent.display())));
        }
        Ok(())
    }

    /// Writes the cache as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::CacheIo`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PercentileError> {
        let io_err = |reason: String| PercentileError::CacheIo {
            path: path.display().to_string(),
            reason,
        };
        let file = File::create(path).map_err(|e| io_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| io_err(e.to_string()))?;
        writer.flush().map_err(|e| io_err(e.to_string()))?;
        info!(path = %path.display(), n_variables = self.variables.len(), "percentile cache written");
        Ok(())
    }

    /// Reads a cache from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::CacheIo`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, PercentileError> {
        let io_err = |reason: String| PercentileError::CacheIo {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| io_err(e.to_string()))?;
        let cache: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| io_err(e.to_string()))?;
        info!(path = %path.display(), n_variables = cache.variables.len(), "percentile cache loaded");
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use boreas_calendar::Date;

    use super::*;

    fn params() -> CacheParameters {
        let cal = Calendar::Standard;
        CacheParameters {
            base_period: TimeRange::new(
                Date::new(1961, 1, 1, cal).unwrap(),
                Date::new(1990, 12, 31, cal).unwrap(),
            )
            .unwrap(),
            window: 5,
            interpolation: Interpolation::HyndmanFan,
            leap_years_only: false,
            exclude_leap_days: false,
            calendar: cal,
            grid: (2, 3),
        }
    }

    #[test]
    fn writable_check_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PercentileCache::check_writable(&dir.path().join("cache.json")).is_ok());
        assert!(PercentileCache::check_writable(dir.path()).is_err());
        let err = PercentileCache::check_writable(&dir.path().join("missing").join("cache.json")).unwrap_err();
        assert!(matches!(err, PercentileError::CacheIo { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn check_names_first_difference() {
        let cache = PercentileCache::new(params(), CacheMode::OutOfBase);
        assert!(cache.check(&params()).is_ok());
        let mut other = params();
        other.window = 7;
        assert_eq!(
            cache.check(&other).unwrap_err(),
            PercentileError::CacheMismatch {
                reason: "window 5 != 7".to_string()
            }
        );
    }

    #[test]
    fn variable_percentile_must_match() {
        let mut cache = PercentileCache::new(params(), CacheMode::OutOfBase);
        cache.variable_mut("tasmax", 90.0);
        assert!(cache.variable("tasmax", 90.0).unwrap().is_some());
        assert!(cache.variable("tasmin", 90.0).unwrap().is_none());
        assert!(cache.variable("tasmax", 10.0).is_err());
    }

    #[test]
    fn candidates_stay_sorted() {
        let mut cache = PercentileCache::new(params(), CacheMode::All);
        let p = params();
        let entry = cache.variable_mut("tas", 90.0);
        entry.candidate_mut(1970, 1965, &p, -1.0);
        entry.candidate_mut(1962, 1961, &p, -1.0);
        entry.candidate_mut(1970, 1961, &p, -1.0);
        let keys: Vec<(i32, i32)> = entry
            .in_base
            .iter()
            .map(|e| (e.study_year, e.substitute_year))
            .collect();
        assert_eq!(keys, vec![(1962, 1961), (1970, 1961), (1970, 1965)]);
        assert!(entry.candidate(1970, 1965).is_some());
        assert!(entry.candidate(1971, 1965).is_none());
    }
}
