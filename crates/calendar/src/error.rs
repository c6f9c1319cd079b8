//! Error types for the boreas-calendar crate.

/// Error type for all fallible operations in the boreas-calendar crate.
///
/// Covers validation failures for months, days, day-of-year positions,
/// calendar names, date strings and time ranges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum CalendarError {
    /// Returned when a day-of-year value is outside the calendar's range.
    #[error("invalid day of year: {doy} (must be 1..={max})")]
    InvalidDoy {
        /// The invalid day-of-year value that was provided.
        doy: u16,
        /// The largest valid day-of-year in the calendar.
        max: u16,
    },

    /// Returned when a month number is outside the valid range 1..=12.
    #[error("invalid month: {month} (must be 1..=12)")]
    InvalidMonth {
        /// The invalid month number that was provided.
        month: u8,
    },

    /// Returned when a day number exceeds the number of days in the given month.
    #[error("invalid day: {day} for month {month} (max {max_day})")]
    InvalidDay {
        /// The invalid day number that was provided.
        day: u8,
        /// The month for which the day is invalid.
        month: u8,
        /// The maximum valid day for the given month.
        max_day: u8,
    },

    /// Returned when a CF calendar name is not recognised.
    #[error("unknown calendar: '{name}'")]
    UnknownCalendar {
        /// The unrecognised calendar name.
        name: String,
    },

    /// Returned when a date string cannot be parsed as `YYYY-MM-DD`.
    #[error("cannot parse date: '{input}'")]
    ParseDate {
        /// The string that failed to parse.
        input: String,
    },

    /// Returned when a time range ends before it starts.
    #[error("invalid time range: {start} is after {end}")]
    InvalidRange {
        /// Range start, formatted as `YYYY-MM-DD`.
        start: String,
        /// Range end, formatted as `YYYY-MM-DD`.
        end: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_doy() {
        let err = CalendarError::InvalidDoy { doy: 0, max: 366 };
        assert_eq!(err.to_string(), "invalid day of year: 0 (must be 1..=366)");
    }

    #[test]
    fn error_invalid_month() {
        let err = CalendarError::InvalidMonth { month: 13 };
        assert_eq!(err.to_string(), "invalid month: 13 (must be 1..=12)");
    }

    #[test]
    fn error_invalid_day() {
        let err = CalendarError::InvalidDay {
            day: 29,
            month: 2,
            max_day: 28,
        };
        assert_eq!(err.to_string(), "invalid day: 29 for month 2 (max 28)");
    }

    #[test]
    fn error_unknown_calendar() {
        let err = CalendarError::UnknownCalendar {
            name: "lunar".into(),
        };
        assert_eq!(err.to_string(), "unknown calendar: 'lunar'");
    }

    #[test]
    fn error_invalid_range() {
        let err = CalendarError::InvalidRange {
            start: "2001-01-01".into(),
            end: "2000-01-01".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid time range: 2001-01-01 is after 2000-01-01"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<CalendarError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<CalendarError>();
    }
}
