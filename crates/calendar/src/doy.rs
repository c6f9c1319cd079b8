//! Reference day-of-year positions.
//!
//! A reference day-of-year is the position of a `(month, day)` pair in the
//! longest year of a calendar. Thresholds indexed this way line up across
//! leap and non-leap years: in the standard calendar February 29 is always
//! position 60 and December 31 is always position 366.

use crate::calendar::Calendar;
use crate::error::CalendarError;

/// Position on which each month starts in a 366-day year (index 0 unused).
pub(crate) const LEAP_MONTH_START_DOY: [u16; 13] =
    [0, 1, 32, 61, 92, 122, 153, 183, 214, 245, 275, 306, 336];

/// Position on which each month starts in a 365-day year (index 0 unused).
pub(crate) const NOLEAP_MONTH_START_DOY: [u16; 13] =
    [0, 1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Reference day-of-year, `1..=calendar.max_doy()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Doy(u16);

impl Doy {
    /// Creates a new `Doy` for `calendar`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDoy`] if `doy` is not in
    /// `1..=calendar.max_doy()`.
    pub fn new(doy: u16, calendar: Calendar) -> Result<Self, CalendarError> {
        let max = calendar.max_doy();
        if !(1..=max).contains(&doy) {
            return Err(CalendarError::InvalidDoy { doy, max });
        }
        Ok(Self(doy))
    }

    /// Creates a new `Doy` from a `(month, day)` pair.
    ///
    /// The pair is validated against the longest year of `calendar`, so
    /// `(2, 29)` is accepted for the standard calendar.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] or
    /// [`CalendarError::InvalidDay`] for pairs that never occur.
    pub fn from_month_day(month: u8, day: u8, calendar: Calendar) -> Result<Self, CalendarError> {
        // 2000 is a leap year in every calendar that has one.
        calendar.validate(2000, month, day)?;
        Ok(Self(calendar.reference_doy(month, day)))
    }

    /// Creates a `Doy`, clamping `doy` into the calendar's range.
    pub(crate) fn clamped(doy: u16, calendar: Calendar) -> Self {
        Self(doy.clamp(1, calendar.max_doy()))
    }

    /// Returns the inner value.
    pub fn get(self) -> u16 {
        self.0
    }

    /// Returns the 0-based index suitable for array indexing.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Returns the `(month, day)` pair at this position.
    pub fn month_day(self, calendar: Calendar) -> (u8, u8) {
        calendar.reference_month_day(self.0)
    }

    /// Iterates over all positions of `calendar` in ascending order.
    pub fn all(calendar: Calendar) -> impl Iterator<Item = Doy> {
        (1..=calendar.max_doy()).map(Doy)
    }
}
