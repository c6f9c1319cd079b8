//! Error types for the boreas-series crate.

use boreas_calendar::CalendarError;

/// Error type for all fallible operations in the boreas-series crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    /// Returned when the date axis and the value array disagree in length.
    #[error("length mismatch: {dates} dates but {steps} time steps")]
    LengthMismatch {
        /// Number of dates.
        dates: usize,
        /// Length of the value array's time axis.
        steps: usize,
    },

    /// Returned when dates are not strictly ascending.
    #[error("dates must be strictly ascending (violated at index {index}: {date})")]
    UnorderedDates {
        /// Index of the first offending date.
        index: usize,
        /// The offending date.
        date: String,
    },

    /// Returned when a date does not exist in the series calendar.
    #[error("date {date} does not exist in the {calendar} calendar")]
    DateNotInCalendar {
        /// The offending date.
        date: String,
        /// CF name of the calendar.
        calendar: String,
    },

    /// Returned when a requested year has no rows in the series.
    #[error("year {year} is not present in the series")]
    YearNotPresent {
        /// The missing year.
        year: i32,
    },

    /// Returned when a season definition is invalid.
    #[error("invalid season: {reason}")]
    InvalidSeason {
        /// Description of the problem.
        reason: String,
    },

    /// Calendar errors propagated from boreas-calendar.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}
