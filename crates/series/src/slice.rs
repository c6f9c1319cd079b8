//! Grouping of a series into calendar periods.

use std::fmt;
use std::ops::Range;

use boreas_calendar::{Calendar, Date};
use ndarray::{ArrayView3, s};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::season::Season;
use crate::series::TimeSeries;

/// Aggregation period of a slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceMode {
    /// Calendar years.
    #[default]
    Year,
    /// Calendar months.
    Month,
    /// One season per year.
    Season(Season),
}

/// Treatment of February 29 before slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapDayPolicy {
    /// Keep February 29 rows.
    #[default]
    Keep,
    /// Drop February 29 rows entirely.
    Exclude,
}

impl LeapDayPolicy {
    /// Applies the policy to `series`.
    pub fn apply(self, series: &TimeSeries) -> TimeSeries {
        match self {
            Self::Keep => series.clone(),
            Self::Exclude => series.without_leap_days(),
        }
    }
}

/// Period label within a year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodLabel {
    /// Whole year.
    Year,
    /// One month.
    Month(u8),
    /// A named season.
    Season(String),
}

/// Identifies one period: year plus label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Label year (for seasons, the year of the last month).
    pub year: i32,
    /// Period within the year.
    pub label: PeriodLabel,
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            PeriodLabel::Year => write!(f, "{}", self.year),
            PeriodLabel::Month(m) => write!(f, "{}-{m:02}", self.year),
            PeriodLabel::Season(name) => write!(f, "{}-{name}", self.year),
        }
    }
}

/// One calendar period of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalSlice {
    key: PeriodKey,
    centroid: Date,
    bounds: (Date, Date),
    rows: Range<usize>,
}

impl TemporalSlice {
    /// Returns the period key.
    pub fn key(&self) -> &PeriodKey {
        &self.key
    }

    /// Returns the period year.
    pub fn year(&self) -> i32 {
        self.key.year
    }

    /// Returns the midpoint of the bounds, rounded down to a whole day.
    pub fn centroid(&self) -> Date {
        self.centroid
    }

    /// Returns `(first, last)` date of the slice.
    pub fn bounds(&self) -> (Date, Date) {
        self.bounds
    }

    /// Returns the row range into the sliced series.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the slice has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrows the slice's values from the series it was cut from.
    pub fn view<'a>(&self, series: &'a TimeSeries) -> SliceView<'a> {
        SliceView {
            dates: &series.dates()[self.rows.clone()],
            values: series.values().slice_move(s![self.rows.clone(), .., ..]),
            fill_value: series.fill_value(),
            calendar: series.calendar(),
        }
    }
}

/// Borrowed values of one slice.
#[derive(Debug, Clone)]
pub struct SliceView<'a> {
    dates: &'a [Date],
    values: ArrayView3<'a, f64>,
    fill_value: f64,
    calendar: Calendar,
}

impl<'a> SliceView<'a> {
    /// Returns the dates of the slice.
    pub fn dates(&self) -> &'a [Date] {
        self.dates
    }

    /// Returns the values indexed `(time, row, col)`.
    pub fn values(&self) -> ArrayView3<'a, f64> {
        self.values.clone()
    }

    /// Returns the fill value.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns the calendar.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns `(time, rows, cols)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }
}

/// Groups series rows into [`TemporalSlice`]s.
#[derive(Debug, Clone, Default)]
pub struct TemporalSlicer {
    mode: SliceMode,
}

impl TemporalSlicer {
    /// Creates a slicer for `mode`.
    pub fn new(mode: SliceMode) -> Self {
        Self { mode }
    }

    /// Returns the slice mode.
    pub fn mode(&self) -> &SliceMode {
        &self.mode
    }

    fn key_of(&self, date: Date) -> Option<PeriodKey> {
        match &self.mode {
            SliceMode::Year => Some(PeriodKey {
                year: date.year(),
                label: PeriodLabel::Year,
            }),
            SliceMode::Month => Some(PeriodKey {
                year: date.year(),
                label: PeriodLabel::Month(date.month()),
            }),
            SliceMode::Season(season) => {
                season
                    .label_year(date.year(), date.month())
                    .map(|year| PeriodKey {
                        year,
                        label: PeriodLabel::Season(season.name().to_string()),
                    })
            }
        }
    }

    /// Cuts `series` into slices ordered by start date.
    ///
    /// Rows outside the slice mode's months are skipped. A season is only
    /// produced when its rows run from the first day of its first month to
    /// the last day of its last month; edge seasons cut by the time axis
    /// are dropped. A period whose values are all fill still produces a
    /// slice.
    pub fn slice(&self, series: &TimeSeries) -> Vec<TemporalSlice> {
        let calendar = series.calendar();
        let dates = series.dates();
        let mut slices = Vec::new();
        let mut current: Option<(PeriodKey, usize)> = None;
        let mut dropped = 0usize;

        let mut close = |key: PeriodKey, start: usize, end: usize| {
            let first = dates[start];
            let last = dates[end - 1];
            if let SliceMode::Season(season) = &self.mode
                && !season_complete(season, &dates[start..end], calendar)
            {
                debug!(period = %key, first = %first, last = %last, "incomplete season dropped");
                dropped += 1;
                return;
            }
            let mid = (calendar.day_number(first) + calendar.day_number(last)).div_euclid(2);
            slices.push(TemporalSlice {
                key,
                centroid: calendar.date_from_day_number(mid),
                bounds: (first, last),
                rows: start..end,
            });
        };

        for (row, &date) in dates.iter().enumerate() {
            let key = self.key_of(date);
            match (current.take(), key) {
                (Some((open, start)), Some(key)) if open == key => current = Some((open, start)),
                (Some((open, start)), key) => {
                    close(open, start, row);
                    current = key.map(|k| (k, row));
                }
                (None, key) => current = key.map(|k| (k, row)),
            }
        }
        if let Some((open, start)) = current {
            close(open, start, dates.len());
        }

        debug!(n_slices = slices.len(), dropped, n_rows = dates.len(), "series sliced");
        slices
    }
}

/// `true` if `dates` start on day 1 of the season's first month, end on the
/// last day of its last month and touch every month in between.
fn season_complete(season: &Season, dates: &[Date], calendar: Calendar) -> bool {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return false;
    };
    let (Some(&first_month), Some(&last_month)) = (season.months().first(), season.months().last())
    else {
        return false;
    };
    first.month_day() == (first_month, 1)
        && last.month() == last_month
        && last.next(calendar).day() == 1
        && season.months().iter().all(|&m| dates.iter().any(|d| d.month() == m))
}
