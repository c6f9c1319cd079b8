//! Calendar date without time of day.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar::Calendar;
use crate::doy::Doy;
use crate::error::CalendarError;

/// A `(year, month, day)` date.
///
/// A `Date` does not carry its calendar: validity and arithmetic are always
/// relative to a [`Calendar`] passed by the caller. Ordering is
/// chronological and identical in every calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: i32,
    month: u8,
    day: u8,
}

impl Date {
    /// Creates a new `Date` valid in `calendar`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] or
    /// [`CalendarError::InvalidDay`] if the date does not exist in
    /// `calendar`.
    pub fn new(year: i32, month: u8, day: u8, calendar: Calendar) -> Result<Self, CalendarError> {
        calendar.validate(year, month, day)?;
        Ok(Self { year, month, day })
    }

    /// Internal constructor for already-validated parts.
    pub(crate) fn from_parts(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Returns the year.
    pub fn year(self) -> i32 {
        self.year
    }

    /// Returns the month (1..=12).
    pub fn month(self) -> u8 {
        self.month
    }

    /// Returns the day within the month.
    pub fn day(self) -> u8 {
        self.day
    }

    /// Returns `(month, day)` as a tuple.
    pub fn month_day(self) -> (u8, u8) {
        (self.month, self.day)
    }

    /// Returns `true` for February 29.
    pub fn is_feb29(self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// Returns the reference day-of-year of this date in `calendar`.
    ///
    /// A date that does not exist in `calendar` (for example December 31
    /// in the 360-day calendar) maps to the last position.
    pub fn reference_doy(self, calendar: Calendar) -> Doy {
        Doy::clamped(calendar.reference_doy(self.month, self.day), calendar)
    }

    /// Returns the date `n` days after this one (before, if negative).
    pub fn add_days(self, n: i64, calendar: Calendar) -> Self {
        calendar.date_from_day_number(calendar.day_number(self) + n)
    }

    /// Returns the following day.
    pub fn next(self, calendar: Calendar) -> Self {
        self.add_days(1, calendar)
    }

    /// Returns the same month and day in `year`, if it exists there.
    pub fn with_year(self, year: i32, calendar: Calendar) -> Option<Self> {
        Self::new(year, self.month, self.day, calendar).ok()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for Date {
    type Err = CalendarError;

    /// Parses `YYYY-MM-DD` (year may be signed). Day validity is checked
    /// against the all-leap calendar; callers re-validate against the
    /// calendar of their data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CalendarError::ParseDate {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (sign, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, trimmed),
        };
        let mut parts = body.splitn(3, '-');
        let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let month: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let day: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let cal = if month == 2 && day == 30 {
            Calendar::Day360
        } else {
            Calendar::AllLeap
        };
        Self::new(sign * year, month, day, cal)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
