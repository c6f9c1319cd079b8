//! Inclusive date ranges.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::date::Date;
use crate::error::CalendarError;

/// Inclusive `[start, end]` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: Date,
    end: Date,
}

impl TimeRange {
    /// Creates a new range.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRange`] if `start > end`.
    pub fn new(start: Date, end: Date) -> Result<Self, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Returns the first date of the range.
    pub fn start(&self) -> Date {
        self.start
    }

    /// Returns the last date of the range.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Returns `true` if `date` lies inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns the calendar years touched by the range.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    /// Returns the overlap of two ranges, if any.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(TimeRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Calendar;

    fn d(y: i32, m: u8, day: u8) -> Date {
        Date::new(y, m, day, Calendar::Standard).unwrap()
    }

    #[test]
    fn rejects_reversed() {
        assert!(matches!(
            TimeRange::new(d(2001, 1, 1), d(2000, 1, 1)),
            Err(CalendarError::InvalidRange { .. })
        ));
    }

    #[test]
    fn contains_bounds() {
        let r = TimeRange::new(d(2000, 1, 1), d(2000, 12, 31)).unwrap();
        assert!(r.contains(d(2000, 1, 1)));
        assert!(r.contains(d(2000, 12, 31)));
        assert!(!r.contains(d(2001, 1, 1)));
        assert_eq!(r.years(), 2000..=2000);
    }

    #[test]
    fn intersect() {
        let a = TimeRange::new(d(2000, 1, 1), d(2005, 12, 31)).unwrap();
        let b = TimeRange::new(d(2004, 6, 1), d(2010, 12, 31)).unwrap();
        let c = TimeRange::new(d(2011, 1, 1), d(2012, 1, 1)).unwrap();
        assert_eq!(
            a.intersect(&b),
            Some(TimeRange::new(d(2004, 6, 1), d(2005, 12, 31)).unwrap())
        );
        assert_eq!(a.intersect(&c), None);
    }
}
