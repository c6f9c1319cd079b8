//! Daily date sequence generation.

use crate::calendar::Calendar;
use crate::date::Date;
use crate::range::TimeRange;

/// Generates `n_days` consecutive dates starting at `start`.
///
/// Month, year and leap-day boundaries follow `calendar`.
///
/// # Example
///
/// ```
/// use boreas_calendar::{Calendar, Date, daily_sequence};
///
/// let cal = Calendar::Standard;
/// let start = Date::new(2000, 2, 28, cal).unwrap();
/// let dates = daily_sequence(start, 3, cal);
/// assert_eq!(dates[1], Date::new(2000, 2, 29, cal).unwrap());
/// ```
pub fn daily_sequence(start: Date, n_days: usize, calendar: Calendar) -> Vec<Date> {
    let first = calendar.day_number(start);
    (0..n_days as i64)
        .map(|offset| calendar.date_from_day_number(first + offset))
        .collect()
}

/// Generates every date of `range` (inclusive on both ends).
pub fn dates_in_range(range: TimeRange, calendar: Calendar) -> Vec<Date> {
    let first = calendar.day_number(range.start());
    let last = calendar.day_number(range.end());
    (first..=last)
        .map(|n| calendar.date_from_day_number(n))
        .collect()
}
