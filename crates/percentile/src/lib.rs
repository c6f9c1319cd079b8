//! # boreas-percentile
//!
//! Percentile thresholds derived from a base period: per-cell day-of-year
//! thresholds for temperature indices and single wet-day thresholds for
//! precipitation indices.
//!
//! ```mermaid
//! graph LR
//!     A["base TimeSeries"] -->|"DoyPools::new()"| B["DoyPools"]
//!     B -->|"doy_threshold_with()"| C["DoyThreshold"]
//!     A -->|"WetDayThreshold::compute()"| D["WetDayThreshold"]
//!     C --> E["PercentileCache (JSON)"]
//!     D --> E
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_calendar::{Calendar, Date, daily_sequence};
//! use boreas_percentile::{PercentileConfig, doy_threshold};
//! use boreas_series::TimeSeries;
//! use ndarray::Array3;
//!
//! let cal = Calendar::NoLeap;
//! let dates = daily_sequence(Date::new(1981, 1, 1, cal).unwrap(), 365 * 3, cal);
//! let base = TimeSeries::new(dates, Array3::from_elem((365 * 3, 2, 2), 280.0), 1e20, cal, "K")
//!     .unwrap();
//!
//! let config = PercentileConfig::new(90.0).with_window(5);
//! let threshold = doy_threshold(&base, &config);
//! assert!(threshold.values().iter().all(|&v| v == 280.0));
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | `PercentileConfig` builder and `Interpolation` |
//! | `quantile` | Type 7 and type 8 sample quantiles |
//! | `doy` | Day-of-year pools and thresholds |
//! | `wet` | Wet-day thresholds |
//! | `cache` | JSON threshold cache |
//! | `error` | Error types |

mod cache;
mod config;
mod doy;
mod error;
mod quantile;
mod wet;

pub use cache::{
    CacheMode, CacheParameters, CachedThreshold, InBaseEntry, PercentileCache, VariableCache,
};
pub use config::{Interpolation, PercentileConfig};
pub use doy::{DoyPools, DoyThreshold, doy_threshold, doy_threshold_with};
pub use error::PercentileError;
pub use quantile::percentile_of_sorted;
pub use wet::{DEFAULT_WET_DAY_MIN, WetDayThreshold};
