//! Compute request builder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use boreas_calendar::TimeRange;
use boreas_indices::{
    IndexDef, IndexRegistry, OutputUnit, PercentileNeed, ThresholdKind, UserIndex,
};
use boreas_percentile::{CacheMode, Interpolation, PercentileConfig};
use boreas_series::{LeapDayPolicy, SliceMode};
use boreas_tile::MemoryBudget;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::progress::ProgressSpan;

/// Which index to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSpec {
    /// A catalog index by name.
    Builtin(String),
    /// A user-defined index.
    User {
        /// Name used in the output.
        name: String,
        /// The record.
        index: UserIndex,
    },
}

impl IndexSpec {
    /// Returns the index name.
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(name) => name,
            Self::User { name, .. } => name,
        }
    }
}

/// Affine unit transform `value * scale + offset` applied after reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Multiplier.
    pub scale: f64,
    /// Offset added after scaling.
    pub offset: f64,
    /// Unit string after the transform; unchanged when `None`.
    pub units: Option<String>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            units: None,
        }
    }
}

impl Transform {
    /// Creates a transform.
    pub fn new(scale: f64, offset: f64) -> Self {
        Self {
            scale,
            offset,
            units: None,
        }
    }

    /// Sets the resulting unit string.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    fn is_valid(&self) -> bool {
        self.scale.is_finite() && self.scale != 0.0 && self.offset.is_finite()
    }
}

/// Percentile cache options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Cache to read thresholds from.
    pub load: Option<PathBuf>,
    /// Cache to write thresholds to after the run.
    pub save: Option<PathBuf>,
    /// Which thresholds are stored.
    pub mode: CacheMode,
}

impl CacheOptions {
    /// Returns `true` if neither loading nor saving is requested.
    pub fn is_empty(&self) -> bool {
        self.load.is_none() && self.save.is_none()
    }
}

/// Everything one index computation needs.
///
/// # Example
///
/// ```
/// use boreas_engine::{ComputeRequest, IndexSpec};
///
/// let request = ComputeRequest::new(IndexSpec::Builtin("SU".to_string()))
///     .with_variables(vec!["tasmax".to_string()])
///     .with_sources(vec![vec!["tasmax_1990.nc".to_string()]])
///     .with_thresholds(vec![298.15, 303.15]);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    index: IndexSpec,
    variables: Vec<String>,
    sources: Vec<Vec<String>>,
    levels: BTreeMap<String, f64>,
    transforms: BTreeMap<String, Transform>,
    slice_mode: SliceMode,
    time_range: Option<TimeRange>,
    base_period: Option<TimeRange>,
    window: usize,
    leap_days: LeapDayPolicy,
    interpolation: Interpolation,
    leap_years_only: bool,
    thresholds: Vec<f64>,
    memory: MemoryBudget,
    output_unit: OutputUnit,
    date_of_event: bool,
    cache: CacheOptions,
    progress: ProgressSpan,
}

impl ComputeRequest {
    /// Creates a request with defaults.
    ///
    /// Defaults: yearly slices, whole time axis, no base period,
    /// `window = 5`, leap days kept, `HyndmanFan`, no thresholds,
    /// unlimited memory, days, no date-of-event, no cache.
    pub fn new(index: IndexSpec) -> Self {
        Self {
            index,
            variables: Vec::new(),
            sources: Vec::new(),
            levels: BTreeMap::new(),
            transforms: BTreeMap::new(),
            slice_mode: SliceMode::Year,
            time_range: None,
            base_period: None,
            window: 5,
            leap_days: LeapDayPolicy::Keep,
            interpolation: Interpolation::HyndmanFan,
            leap_years_only: false,
            thresholds: Vec::new(),
            memory: MemoryBudget::Unlimited,
            output_unit: OutputUnit::Days,
            date_of_event: false,
            cache: CacheOptions::default(),
            progress: ProgressSpan::default(),
        }
    }

    /// Sets the input variable names, in the index's binding order.
    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    /// Sets one source list per variable.
    pub fn with_sources(mut self, sources: Vec<Vec<String>>) -> Self {
        self.sources = sources;
        self
    }

    /// Selects a vertical level of `variable`.
    pub fn with_level(mut self, variable: impl Into<String>, level: f64) -> Self {
        self.levels.insert(variable.into(), level);
        self
    }

    /// Sets the unit transform of `variable`.
    pub fn with_transform(mut self, variable: impl Into<String>, transform: Transform) -> Self {
        self.transforms.insert(variable.into(), transform);
        self
    }

    /// Sets the slice mode.
    pub fn with_slice_mode(mut self, mode: SliceMode) -> Self {
        self.slice_mode = mode;
        self
    }

    /// Restricts the study period.
    pub fn with_time_range(mut self, range: Option<TimeRange>) -> Self {
        self.time_range = range;
        self
    }

    /// Sets the percentile base period.
    pub fn with_base_period(mut self, range: Option<TimeRange>) -> Self {
        self.base_period = range;
        self
    }

    /// Sets the day-of-year window width.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Sets the leap-day policy.
    pub fn with_leap_days(mut self, policy: LeapDayPolicy) -> Self {
        self.leap_days = policy;
        self
    }

    /// Sets the percentile interpolation.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Pools February 29 thresholds from leap years only.
    pub fn with_leap_years_only(mut self, leap_years_only: bool) -> Self {
        self.leap_years_only = leap_years_only;
        self
    }

    /// Sets fixed thresholds, stacked along a threshold axis when several.
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the memory budget of one tile.
    pub fn with_memory(mut self, memory: MemoryBudget) -> Self {
        self.memory = memory;
        self
    }

    /// Sets the unit of percentile count indices.
    pub fn with_output_unit(mut self, unit: OutputUnit) -> Self {
        self.output_unit = unit;
        self
    }

    /// Requests date-of-event arrays.
    pub fn with_date_of_event(mut self, date_of_event: bool) -> Self {
        self.date_of_event = date_of_event;
        self
    }

    /// Sets the percentile cache options.
    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the progress span.
    pub fn with_progress(mut self, span: ProgressSpan) -> Self {
        self.progress = span;
        self
    }

    /// Returns the index spec.
    pub fn index(&self) -> &IndexSpec {
        &self.index
    }

    /// Returns the variable names.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns the source lists.
    pub fn sources(&self) -> &[Vec<String>] {
        &self.sources
    }

    /// Returns the level of `variable`.
    pub fn level(&self, variable: &str) -> Option<f64> {
        self.levels.get(variable).copied()
    }

    /// Returns the transform of `variable`.
    pub fn transform(&self, variable: &str) -> Option<&Transform> {
        self.transforms.get(variable)
    }

    /// Returns the slice mode.
    pub fn slice_mode(&self) -> &SliceMode {
        &self.slice_mode
    }

    /// Returns the study period.
    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range
    }

    /// Returns the base period.
    pub fn base_period(&self) -> Option<TimeRange> {
        self.base_period
    }

    /// Returns the window width.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns the leap-day policy.
    pub fn leap_days(&self) -> LeapDayPolicy {
        self.leap_days
    }

    /// Returns the interpolation.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Returns the leap-years-only flag.
    pub fn leap_years_only(&self) -> bool {
        self.leap_years_only
    }

    /// Returns the fixed thresholds.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Returns the memory budget.
    pub fn memory(&self) -> MemoryBudget {
        self.memory
    }

    /// Returns the output unit.
    pub fn output_unit(&self) -> OutputUnit {
        self.output_unit
    }

    /// Returns the date-of-event flag.
    pub fn date_of_event(&self) -> bool {
        self.date_of_event
    }

    /// Returns the cache options.
    pub fn cache(&self) -> &CacheOptions {
        &self.cache
    }

    /// Returns the progress span.
    pub fn progress(&self) -> ProgressSpan {
        self.progress
    }

    /// Returns the cache path to load, if any.
    pub fn cache_load(&self) -> Option<&Path> {
        self.cache.load.as_deref()
    }

    /// Builds the percentile configuration of one need.
    pub fn percentile_config(&self, need: &PercentileNeed) -> PercentileConfig {
        let floor = match need.kind {
            ThresholdKind::DayOfYear { wet_day_floor } => wet_day_floor,
            ThresholdKind::WetDay { .. } => None,
        };
        PercentileConfig::new(need.percentile)
            .with_window(self.window)
            .with_interpolation(self.interpolation)
            .with_leap_years_only(self.leap_years_only)
            .with_wet_day_floor(floor)
    }

    /// Resolves the index against the built-in catalog and validates.
    ///
    /// # Errors
    ///
    /// See [`ComputeRequest::validate_with`].
    pub fn validate(&self) -> Result<IndexDef, EngineError> {
        self.validate_with(&IndexRegistry::builtin())
    }

    /// Resolves the index against `registry` and validates the request.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Index`] for an unknown index, a wrong number of
    ///   variables, an invalid user index or thresholds the index rejects
    /// - [`EngineError::SourceCountMismatch`] if variables and source lists differ
    /// - [`EngineError::MissingBasePeriod`] for a percentile index without base period
    /// - [`EngineError::InvalidRequest`] for any other invalid parameter
    pub fn validate_with(&self, registry: &IndexRegistry) -> Result<IndexDef, EngineError> {
        let invalid = |reason: String| Err(EngineError::InvalidRequest { reason });

        let def = match &self.index {
            IndexSpec::Builtin(name) => registry.get(name)?.clone(),
            IndexSpec::User { name, index } => IndexDef::user(name.clone(), *index)?,
        };

        if self.variables.len() != self.sources.len() {
            return Err(EngineError::SourceCountMismatch {
                variables: self.variables.len(),
                sources: self.sources.len(),
            });
        }
        if self.variables.len() != def.arity() {
            return Err(boreas_indices::IndexError::WrongVariableCount {
                index: def.name().to_string(),
                expected: def.arity(),
                got: self.variables.len(),
            }
            .into());
        }
        if let Some(i) = self.sources.iter().position(Vec::is_empty) {
            return invalid(format!("variable '{}' has no sources", self.variables[i]));
        }
        for (i, name) in self.variables.iter().enumerate() {
            if self.variables[..i].contains(name) {
                return invalid(format!("variable '{name}' given twice"));
            }
        }
        for name in self.levels.keys().chain(self.transforms.keys()) {
            if !self.variables.contains(name) {
                return invalid(format!("level or transform for unknown variable '{name}'"));
            }
        }
        if let Some((name, _)) = self.transforms.iter().find(|(_, t)| !t.is_valid()) {
            return invalid(format!("transform of '{name}' must have a finite non-zero scale"));
        }

        if !self.thresholds.is_empty() && !def.accepts_threshold() {
            return Err(boreas_indices::IndexError::ThresholdNotSupported {
                index: def.name().to_string(),
            }
            .into());
        }
        for (i, t) in self.thresholds.iter().enumerate() {
            if !t.is_finite() {
                return invalid(format!("threshold {t} is not finite"));
            }
            if self.thresholds[..i].contains(t) {
                return invalid(format!("threshold {t} given twice"));
            }
        }

        if def.needs_percentiles() {
            if self.base_period.is_none() {
                return Err(EngineError::MissingBasePeriod {
                    index: def.name().to_string(),
                });
            }
            for need in def.percentile_needs().iter().flatten() {
                self.percentile_config(need).validate()?;
            }
        } else if !self.cache.is_empty() {
            return invalid(format!("index {} uses no percentiles to cache", def.name()));
        }
        if let (Some(load), Some(save)) = (&self.cache.load, &self.cache.save)
            && load == save
        {
            return invalid(format!("cache {} is both loaded and saved", load.display()));
        }

        self.memory.validate()?;
        self.progress.validate()?;
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use boreas_calendar::{Calendar, Date};

    use super::*;

    fn base() -> TimeRange {
        let cal = Calendar::Standard;
        TimeRange::new(
            Date::new(1961, 1, 1, cal).unwrap(),
            Date::new(1990, 12, 31, cal).unwrap(),
        )
        .unwrap()
    }

    fn request(index: &str, variables: &[&str]) -> ComputeRequest {
        ComputeRequest::new(IndexSpec::Builtin(index.to_string()))
            .with_variables(variables.iter().map(|v| v.to_string()).collect())
            .with_sources(variables.iter().map(|v| vec![format!("{v}.nc")]).collect())
    }

    #[test]
    fn valid_simple_request() {
        let def = request("TXx", &["tasmax"]).validate().unwrap();
        assert_eq!(def.name(), "TXx");
    }

    #[test]
    fn unknown_index() {
        let err = request("TX42", &["tasmax"]).validate().unwrap_err();
        assert!(matches!(err, EngineError::Index(_)));
    }

    #[test]
    fn source_count_mismatch() {
        let err = request("DTR", &["tasmax", "tasmin"])
            .with_sources(vec![vec!["a.nc".to_string()]])
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::SourceCountMismatch {
                variables: 2,
                sources: 1
            }
        );
    }

    #[test]
    fn wrong_variable_count() {
        let err = request("DTR", &["tasmax"]).validate().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Index(boreas_indices::IndexError::WrongVariableCount { .. })
        ));
    }

    #[test]
    fn percentile_index_needs_base() {
        let err = request("TX90p", &["tasmax"]).validate().unwrap_err();
        assert!(matches!(err, EngineError::MissingBasePeriod { .. }));
        assert!(request("TX90p", &["tasmax"]).with_base_period(Some(base())).validate().is_ok());
    }

    #[test]
    fn even_window_rejected() {
        let err = request("TX90p", &["tasmax"])
            .with_base_period(Some(base()))
            .with_window(4)
            .validate()
            .unwrap_err();
        assert!(matches!(err, EngineError::Percentile(_)));
    }

    #[test]
    fn thresholds_checked() {
        let err = request("TG", &["tas"]).with_thresholds(vec![280.0]).validate().unwrap_err();
        assert!(matches!(err, EngineError::Index(_)));
        let err = request("SU", &["tasmax"])
            .with_thresholds(vec![300.0, 300.0])
            .validate()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest { .. }));
    }

    #[test]
    fn cache_without_percentiles_rejected() {
        let cache = CacheOptions {
            save: Some(PathBuf::from("thresholds.json")),
            ..CacheOptions::default()
        };
        let err = request("SU", &["tasmax"]).with_cache(cache).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest { .. }));
    }

    #[test]
    fn transform_for_unknown_variable() {
        let err = request("SU", &["tasmax"])
            .with_transform("tas", Transform::new(1.0, 273.15))
            .validate()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest { .. }));
    }
}
