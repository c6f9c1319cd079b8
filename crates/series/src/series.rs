//! Daily gridded time series.

use std::ops::Range;

use boreas_calendar::{Calendar, Date, TimeRange};
use ndarray::{Array3, ArrayView3, Axis, s};

use crate::error::SeriesError;

/// Returns `true` if `value` is missing: equal to `fill_value` or NaN.
pub fn is_fill(value: f64, fill_value: f64) -> bool {
    value.is_nan() || value == fill_value
}

/// Values of one variable over a spatial window, indexed `(time, row, col)`.
///
/// Dates are strictly ascending and valid in the series calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<Date>,
    values: Array3<f64>,
    fill_value: f64,
    calendar: Calendar,
    units: String,
}

impl TimeSeries {
    /// Creates a new series.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] if `dates.len()` differs from
    /// the time axis of `values`, [`SeriesError::UnorderedDates`] if dates
    /// are not strictly ascending, or [`SeriesError::DateNotInCalendar`]
    /// for a date that does not exist in `calendar`.
    pub fn new(
        dates: Vec<Date>,
        values: Array3<f64>,
        fill_value: f64,
        calendar: Calendar,
        units: impl Into<String>,
    ) -> Result<Self, SeriesError> {
        if dates.len() != values.len_of(Axis(0)) {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                steps: values.len_of(Axis(0)),
            });
        }
        for (i, &date) in dates.iter().enumerate() {
            if Date::new(date.year(), date.month(), date.day(), calendar).is_err() {
                return Err(SeriesError::DateNotInCalendar {
                    date: date.to_string(),
                    calendar: calendar.to_string(),
                });
            }
            if i > 0 && dates[i - 1] >= date {
                return Err(SeriesError::UnorderedDates {
                    index: i,
                    date: date.to_string(),
                });
            }
        }
        Ok(Self {
            dates,
            values,
            fill_value,
            calendar,
            units: units.into(),
        })
    }

    /// Returns the dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns a view of the whole value array.
    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    /// Consumes the series and returns its value array.
    pub fn into_values(self) -> Array3<f64> {
        self.values
    }

    /// Returns the fill-value sentinel.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns the calendar.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns the unit string.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the number of time steps.
    pub fn n_steps(&self) -> usize {
        self.dates.len()
    }

    /// Returns `(rows, cols)` of the spatial window.
    pub fn grid_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.values.dim();
        (rows, cols)
    }

    /// Returns `true` if `value` is missing in this series.
    pub fn is_fill(&self, value: f64) -> bool {
        is_fill(value, self.fill_value)
    }

    /// Returns the row index of `date`, if present.
    pub fn row_of(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Returns the rows whose dates fall within `range`.
    pub fn rows_in(&self, range: TimeRange) -> Range<usize> {
        let start = self.dates.partition_point(|d| *d < range.start());
        let end = self.dates.partition_point(|d| *d <= range.end());
        start..end.max(start)
    }

    /// Returns the row range of `year`.
    pub fn year_rows(&self, year: i32) -> Range<usize> {
        let start = self.dates.partition_point(|d| d.year() < year);
        let end = self.dates.partition_point(|d| d.year() <= year);
        start..end
    }

    /// Returns the distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.dates.iter().map(|d| d.year()).collect();
        years.dedup();
        years
    }

    /// Returns the values of one time step.
    pub fn step(&self, row: usize) -> ndarray::ArrayView2<'_, f64> {
        self.values.index_axis(Axis(0), row)
    }

    /// Returns an owned copy restricted to `rows`.
    pub fn select_rows(&self, rows: Range<usize>) -> Self {
        Self {
            dates: self.dates[rows.clone()].to_vec(),
            values: self.values.slice(s![rows, .., ..]).to_owned(),
            fill_value: self.fill_value,
            calendar: self.calendar,
            units: self.units.clone(),
        }
    }

    /// Returns an owned copy restricted to the dates inside `range`.
    pub fn subset(&self, range: TimeRange) -> Self {
        self.select_rows(self.rows_in(range))
    }

    /// Returns a copy without February 29 rows.
    pub fn without_leap_days(&self) -> Self {
        let keep: Vec<usize> = (0..self.dates.len())
            .filter(|&i| !self.dates[i].is_feb29())
            .collect();
        if keep.len() == self.dates.len() {
            return self.clone();
        }
        Self {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            values: self.values.select(Axis(0), &keep),
            fill_value: self.fill_value,
            calendar: self.calendar,
            units: self.units.clone(),
        }
    }

    /// Applies `value * scale + offset` to every non-fill value.
    pub fn transform(&mut self, scale: f64, offset: f64) {
        if scale == 1.0 && offset == 0.0 {
            return;
        }
        let fill = self.fill_value;
        self.values.mapv_inplace(|v| {
            if is_fill(v, fill) {
                v
            } else {
                v * scale + offset
            }
        });
    }

    /// Replaces the unit string.
    pub fn set_units(&mut self, units: impl Into<String>) {
        self.units = units.into();
    }

    /// Builds a pseudo-base in which `year`'s values are replaced by those
    /// of `substitute`, matched by month and day.
    ///
    /// Dates of `year` without a counterpart in `substitute` (February 29
    /// when `substitute` is not a leap year) receive the fill value. The
    /// dates of the series are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::YearNotPresent`] if either year has no rows.
    pub fn with_year_substituted(&self, year: i32, substitute: i32) -> Result<Self, SeriesError> {
        let target = self.year_rows(year);
        if target.is_empty() {
            return Err(SeriesError::YearNotPresent { year });
        }
        if self.year_rows(substitute).is_empty() {
            return Err(SeriesError::YearNotPresent { year: substitute });
        }

        let mut out = self.clone();
        for row in target {
            let source = self.dates[row]
                .with_year(substitute, self.calendar)
                .and_then(|d| self.row_of(d));
            let mut dest = out.values.index_axis_mut(Axis(0), row);
            match source {
                Some(src) => dest.assign(&self.values.index_axis(Axis(0), src)),
                None => dest.fill(self.fill_value),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use boreas_calendar::daily_sequence;
    use ndarray::Array3;

    use super::*;

    fn series(start: Date, n: usize, calendar: Calendar) -> TimeSeries {
        let dates = daily_sequence(start, n, calendar);
        let values = Array3::from_shape_fn((n, 2, 3), |(t, r, c)| (t * 100 + r * 10 + c) as f64);
        TimeSeries::new(dates, values, -9999.0, calendar, "K").unwrap()
    }

    fn d(y: i32, m: u8, day: u8) -> Date {
        Date::new(y, m, day, Calendar::Standard).unwrap()
    }

    #[test]
    fn rejects_length_mismatch() {
        let dates = daily_sequence(d(2000, 1, 1), 3, Calendar::Standard);
        let err = TimeSeries::new(dates, Array3::zeros((4, 1, 1)), -1.0, Calendar::Standard, "")
            .unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { dates: 3, steps: 4 });
    }

    #[test]
    fn rejects_unordered_dates() {
        let dates = vec![d(2000, 1, 2), d(2000, 1, 1)];
        let err = TimeSeries::new(dates, Array3::zeros((2, 1, 1)), -1.0, Calendar::Standard, "")
            .unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { index: 1, .. }));
    }

    #[test]
    fn rejects_date_outside_calendar() {
        let dates = vec![d(2000, 2, 29)];
        let err =
            TimeSeries::new(dates, Array3::zeros((1, 1, 1)), -1.0, Calendar::NoLeap, "").unwrap_err();
        assert!(matches!(err, SeriesError::DateNotInCalendar { .. }));
    }

    #[test]
    fn year_rows_and_years() {
        let s = series(d(1999, 12, 30), 5, Calendar::Standard);
        assert_eq!(s.years(), vec![1999, 2000]);
        assert_eq!(s.year_rows(1999), 0..2);
        assert_eq!(s.year_rows(2000), 2..5);
        assert!(s.year_rows(2001).is_empty());
    }

    #[test]
    fn subset_by_range() {
        let s = series(d(2000, 1, 1), 10, Calendar::Standard);
        let r = TimeRange::new(d(2000, 1, 3), d(2000, 1, 5)).unwrap();
        let sub = s.subset(r);
        assert_eq!(sub.n_steps(), 3);
        assert_eq!(sub.dates()[0], d(2000, 1, 3));
        assert_eq!(sub.values()[[0, 1, 2]], 212.0);
    }

    #[test]
    fn leap_days_removed() {
        let s = series(d(2000, 2, 27), 4, Calendar::Standard);
        let f = s.without_leap_days();
        assert_eq!(f.n_steps(), 3);
        assert!(f.dates().iter().all(|d| !d.is_feb29()));
        assert_eq!(f.values()[[2, 0, 0]], 300.0);
    }

    #[test]
    fn transform_skips_fill() {
        let dates = daily_sequence(d(2000, 1, 1), 2, Calendar::Standard);
        let values = Array3::from_shape_vec((2, 1, 1), vec![10.0, -9999.0]).unwrap();
        let mut s = TimeSeries::new(dates, values, -9999.0, Calendar::Standard, "degC").unwrap();
        s.transform(1.0, 273.15);
        assert_eq!(s.values()[[0, 0, 0]], 283.15);
        assert_eq!(s.values()[[1, 0, 0]], -9999.0);
    }

    #[test]
    fn substitution_maps_month_day() {
        // 2000 (leap) and 2001: 731 rows.
        let s = series(d(2000, 1, 1), 731, Calendar::Standard);
        let p = s.with_year_substituted(2001, 2000).unwrap();
        let mar1_2001 = s.row_of(d(2001, 3, 1)).unwrap();
        let mar1_2000 = s.row_of(d(2000, 3, 1)).unwrap();
        assert_eq!(
            p.values()[[mar1_2001, 1, 1]],
            s.values()[[mar1_2000, 1, 1]]
        );
        // 2000 rows untouched.
        assert_eq!(p.values()[[10, 0, 0]], s.values()[[10, 0, 0]]);
        assert_eq!(p.dates(), s.dates());
    }

    #[test]
    fn substitution_fills_missing_feb29() {
        let s = series(d(2000, 1, 1), 731, Calendar::Standard);
        let p = s.with_year_substituted(2000, 2001).unwrap();
        let feb29 = s.row_of(d(2000, 2, 29)).unwrap();
        assert!(p.values().index_axis(Axis(0), feb29).iter().all(|&v| v == -9999.0));
    }

    #[test]
    fn substitution_requires_both_years() {
        let s = series(d(2000, 1, 1), 366, Calendar::Standard);
        assert_eq!(
            s.with_year_substituted(2000, 1990).unwrap_err(),
            SeriesError::YearNotPresent { year: 1990 }
        );
    }
}
