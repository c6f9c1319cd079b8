use std::path::PathBuf;

use serde::Deserialize;

/// Top-level Boreas run file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoreasConfig {
    /// Built-in index name, e.g. `"TX90p"`.
    #[serde(default)]
    pub index: Option<String>,

    /// User-defined index, used when `index` is absent.
    #[serde(default)]
    pub user_index: Option<UserIndexToml>,

    /// Input variables in the index's binding order.
    #[serde(default)]
    pub variables: Vec<VariableToml>,

    /// Slicing and period settings.
    #[serde(default)]
    pub period: PeriodToml,

    /// Percentile threshold settings.
    #[serde(default)]
    pub percentile: PercentileToml,

    /// Fixed thresholds, stacked along a threshold axis when several.
    #[serde(default)]
    pub thresholds: Vec<f64>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputToml,

    /// Per-tile memory settings.
    #[serde(default)]
    pub memory: MemoryToml,

    /// Percentile cache settings.
    #[serde(default)]
    pub cache: CacheToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableToml {
    pub name: String,
    pub sources: Vec<String>,
    #[serde(default)]
    pub level: Option<f64>,
    #[serde(default)]
    pub transform: Option<TransformToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformToml {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub units: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

/// Inclusive date range written as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeToml {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodToml {
    /// `"year"`, `"month"`, a season name such as `"DJF"`, or `"custom"`.
    #[serde(default = "default_slice")]
    pub slice: String,
    /// Months of a custom season.
    #[serde(default)]
    pub season_months: Option<Vec<u8>>,
    #[serde(default)]
    pub time_range: Option<RangeToml>,
    /// `"keep"` or `"exclude"`.
    #[serde(default = "default_leap_days")]
    pub leap_days: String,
    #[serde(default = "default_time_variable")]
    pub time_variable: String,
}

impl Default for PeriodToml {
    fn default() -> Self {
        Self {
            slice: default_slice(),
            season_months: None,
            time_range: None,
            leap_days: default_leap_days(),
            time_variable: default_time_variable(),
        }
    }
}

fn default_slice() -> String {
    "year".to_string()
}

fn default_leap_days() -> String {
    "keep".to_string()
}

fn default_time_variable() -> String {
    "time".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PercentileToml {
    #[serde(default)]
    pub base_period: Option<RangeToml>,
    #[serde(default = "default_window")]
    pub window: usize,
    /// `"hyndman_fan"` or `"linear"`.
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
    #[serde(default)]
    pub leap_years_only: bool,
}

impl Default for PercentileToml {
    fn default() -> Self {
        Self {
            base_period: None,
            window: default_window(),
            interpolation: default_interpolation(),
            leap_years_only: false,
        }
    }
}

fn default_window() -> usize {
    5
}

fn default_interpolation() -> String {
    "hyndman_fan".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    pub path: Option<PathBuf>,
    /// `"days"` or `"percent"`.
    #[serde(default = "default_output_unit")]
    pub unit: String,
    #[serde(default)]
    pub date_of_event: bool,
    #[serde(default)]
    pub pretty: bool,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            path: None,
            unit: default_output_unit(),
            date_of_event: false,
            pretty: false,
        }
    }
}

fn default_output_unit() -> String {
    "days".to_string()
}

/// Exactly one of `bytes` or `transfer_limit_mb`, or neither for no limit.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MemoryToml {
    pub bytes: Option<u64>,
    pub transfer_limit_mb: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheToml {
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    /// `"out_of_base"` or `"all"`.
    #[serde(default = "default_cache_mode")]
    pub mode: String,
}

impl Default for CacheToml {
    fn default() -> Self {
        Self {
            load: None,
            save: None,
            mode: default_cache_mode(),
        }
    }
}

fn default_cache_mode() -> String {
    "out_of_base".to_string()
}

/// User-defined index record.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserIndexToml {
    pub name: String,
    /// `"temperature"` or `"precipitation"`.
    pub role: String,
    /// `min`, `max`, `mean`, `sum`, `event_count`,
    /// `max_consecutive_events`, `run_mean` or `run_sum`.
    pub operation: String,
    /// Window of running statistics.
    #[serde(default)]
    pub window: Option<usize>,
    /// `"min"` or `"max"` for running statistics.
    #[serde(default = "default_extreme")]
    pub extreme: String,
    /// Comparison symbol or name, e.g. `">="` or `"ge"`.
    #[serde(default)]
    pub comparison: Option<String>,
    /// Fixed threshold in input units.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Percentile threshold of the base period.
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub date_of_event: bool,
}

fn default_extreme() -> String {
    "max".to_string()
}
