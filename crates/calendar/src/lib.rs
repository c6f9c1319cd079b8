//! # boreas-calendar
//!
//! Date arithmetic for the CF calendars found in climate datasets.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["CF name"] -->|"Calendar::from_cf_name()"| B["Calendar"]
//!     B -->|"Date::new()"| C["Date"]
//!     C -->|"Calendar::day_number()"| D["i64 day number"]
//!     D -->|"Calendar::date_from_day_number()"| C
//!     C -->|".reference_doy()"| E["Doy (1..=max_doy)"]
//!     C -->|"daily_sequence()"| F["Vec of Date"]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_calendar::{Calendar, Date, TimeRange, dates_in_range};
//!
//! let cal = Calendar::from_cf_name("gregorian").unwrap();
//! let feb29 = Date::new(2000, 2, 29, cal).unwrap();
//! assert_eq!(feb29.reference_doy(cal).get(), 60);
//!
//! let range = TimeRange::new(
//!     Date::new(2000, 1, 1, cal).unwrap(),
//!     Date::new(2000, 12, 31, cal).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(dates_in_range(range, cal).len(), 366);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `calendar` | Calendar systems, leap rules and day numbers |
//! | `date` | Calendar-independent date value |
//! | `doy` | Reference day-of-year positions |
//! | `range` | Inclusive date ranges |
//! | `sequence` | Daily date sequences |
//! | `error` | Error types |

mod calendar;
mod date;
mod doy;
mod error;
mod range;
mod sequence;

pub use calendar::Calendar;
pub use date::Date;
pub use doy::Doy;
pub use error::CalendarError;
pub use range::TimeRange;
pub use sequence::{daily_sequence, dates_in_range};
