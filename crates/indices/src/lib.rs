//! # boreas-indices
//!
//! Typed catalog of climate indices and their per-slice formulas.
//!
//! Indices are resolved once from a name through [`IndexRegistry`] into an
//! [`IndexDef`]. Evaluating a definition reduces one [`SliceView`] per
//! input variable, optionally against percentile thresholds, into an
//! [`IndexSlice`].
//!
//! [`SliceView`]: boreas_series::SliceView
//!
//! ```mermaid
//! graph LR
//!     A["name"] -->|"IndexRegistry::get()"| B["IndexDef"]
//!     C["SliceView(s)"] --> D["IndexDef::evaluate()"]
//!     E["VariableThreshold(s)"] --> D
//!     B --> D
//!     D --> F["IndexSlice"]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_calendar::{Calendar, Date, daily_sequence};
//! use boreas_indices::{EvalOptions, IndexRegistry};
//! use boreas_series::{SliceMode, TemporalSlicer, TimeSeries};
//! use ndarray::Array3;
//!
//! let cal = Calendar::NoLeap;
//! let dates = daily_sequence(Date::new(2001, 1, 1, cal).unwrap(), 365, cal);
//! let series = TimeSeries::new(dates, Array3::from_elem((365, 1, 1), 300.0), 1e20, cal, "K")
//!     .unwrap();
//! let slices = TemporalSlicer::new(SliceMode::Year).slice(&series);
//!
//! let su = IndexRegistry::builtin().get("SU").unwrap().clone();
//! let out = su.evaluate(&[slices[0].view(&series)], &[], &EvalOptions::default()).unwrap();
//! assert_eq!(out.values[[0, 0]], 365.0);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | `IndexRegistry`, `IndexDef` and `IndexKind` |
//! | `simple` | Single-variable and tasmax/tasmin indices |
//! | `percentile` | Day-of-year, wet-day and compound percentile indices |
//! | `user` | Declarative user-defined indices |
//! | `inputs` | Thresholds and evaluation options |
//! | `result` | `IndexSlice` and date-of-event arrays |
//! | `compare` | Comparison operators |
//! | `kernels` | Per-cell reductions |
//! | `error` | Error types |

mod compare;
mod error;
mod inputs;
mod kernels;
mod percentile;
mod registry;
mod result;
mod simple;
mod user;

/// Minimum daily precipitation of a wet day, mm/day.
pub const WET_DAY: f64 = 1.0;

/// 0 degrees Celsius in K.
pub const ZERO_CELSIUS: f64 = 273.15;

pub use compare::{Comparison, Extreme};
pub use error::IndexError;
pub use inputs::{EvalOptions, PercentileNeed, ThresholdKind, VariableThreshold};
pub use percentile::{CompoundIndex, PercentileIndex, SPELL_MIN_DAYS};
pub use registry::{IndexDef, IndexKind, IndexRegistry};
pub use result::{EventDates, EventShape, IndexSlice, OutputUnit};
pub use simple::{MultiIndex, SimpleIndex};
pub use user::{UserIndex, UserOperation, UserThreshold, VariableRole};
