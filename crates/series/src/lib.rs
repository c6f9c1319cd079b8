//! # boreas-series
//!
//! Daily gridded time series and their partition into calendar periods.
//!
//! ```mermaid
//! graph LR
//!     A["TimeSeries"] -->|"LeapDayPolicy::apply()"| B["TimeSeries"]
//!     B -->|"TemporalSlicer::slice()"| C["Vec of TemporalSlice"]
//!     C -->|".view(&series)"| D["SliceView"]
//!     B -->|".with_year_substituted(y, z)"| E["pseudo-base TimeSeries"]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_calendar::{Calendar, Date, daily_sequence};
//! use boreas_series::{SliceMode, TemporalSlicer, TimeSeries};
//! use ndarray::Array3;
//!
//! let cal = Calendar::Standard;
//! let dates = daily_sequence(Date::new(2000, 1, 1, cal).unwrap(), 731, cal);
//! let series = TimeSeries::new(dates, Array3::zeros((731, 2, 2)), 1e20, cal, "K").unwrap();
//!
//! let slices = TemporalSlicer::new(SliceMode::Year).slice(&series);
//! assert_eq!(slices.len(), 2);
//! assert_eq!(slices[0].len(), 366);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `series` | `TimeSeries` container, fill detection, pseudo-base construction |
//! | `season` | Predefined and custom seasons |
//! | `slice` | Slice modes, period keys and the slicer |
//! | `error` | Error types |

mod error;
mod season;
mod series;
mod slice;

pub use error::SeriesError;
pub use season::Season;
pub use series::{TimeSeries, is_fill};
pub use slice::{
    LeapDayPolicy, PeriodKey, PeriodLabel, SliceMode, SliceView, TemporalSlice, TemporalSlicer,
};
