//! Day-of-year percentile thresholds.
//!
//! For every reference day-of-year `d` and every base year, the pool takes
//! the rows whose dates lie within `window / 2` calendar days of `d` in
//! that year. Windows run across the year boundary into neighbouring base
//! years. Pools depend only on the date axis, so they are built once and
//! reused for every pseudo-base sharing that axis.

use std::ops::Range;

use boreas_calendar::{Calendar, Date, Doy};
use boreas_series::{TimeSeries, is_fill};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis, s};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PercentileConfig;
use crate::error::PercentileError;
use crate::quantile::percentile_of;

/// Rows pooled for each reference day-of-year of a date axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoyPools {
    calendar: Calendar,
    n_rows: usize,
    pools: Vec<Vec<usize>>,
}

impl DoyPools {
    /// Builds the pools of `dates` for `config`'s window and leap handling.
    pub fn new(dates: &[Date], calendar: Calendar, config: &PercentileConfig) -> Self {
        let day_numbers: Vec<i64> = dates.iter().map(|&d| calendar.day_number(d)).collect();
        let mut years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
        years.dedup();
        let half = config.half_window();

        let pools = Doy::all(calendar)
            .map(|doy| {
                let (month, day) = doy.month_day(calendar);
                let mut rows = Vec::new();
                for &year in &years {
                    let Some(anchor) = anchor_date(year, month, day, calendar, config) else {
                        continue;
                    };
                    let centre = calendar.day_number(anchor);
                    let window = rows_between(&day_numbers, centre - half, centre + half);
                    rows.extend(window);
                }
                rows.sort_unstable();
                rows.dedup();
                rows
            })
            .collect();

        Self {
            calendar,
            n_rows: dates.len(),
            pools,
        }
    }

    /// Returns the calendar of the date axis.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns the number of reference positions.
    pub fn n_positions(&self) -> usize {
        self.pools.len()
    }

    /// Returns the pooled rows of `doy`.
    pub fn rows(&self, doy: Doy) -> &[usize] {
        self.pools.get(doy.index()).map_or(&[], Vec::as_slice)
    }
}

/// Date of `(month, day)` in `year`, or its stand-in.
///
/// February 29 falls back to February 28 in common years unless leap
/// years are required.
fn anchor_date(
    year: i32,
    month: u8,
    day: u8,
    calendar: Calendar,
    config: &PercentileConfig,
) -> Option<Date> {
    match Date::new(year, month, day, calendar) {
        Ok(date) => Some(date),
        Err(_) if month == 2 && day == 29 && !config.leap_years_only() => {
            Date::new(year, 2, 28, calendar).ok()
        }
        Err(_) => None,
    }
}

fn rows_between(day_numbers: &[i64], lo: i64, hi: i64) -> Range<usize> {
    let start = day_numbers.partition_point(|&n| n < lo);
    let end = day_numbers.partition_point(|&n| n <= hi);
    start..end.max(start)
}

/// Per-cell thresholds indexed by reference day-of-year.
///
/// Values are stored `(position, row, col)`; position `i` holds day-of-year
/// `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoyThreshold {
    values: Array3<f64>,
    calendar: Calendar,
    fill_value: f64,
}

impl DoyThreshold {
    /// Wraps precomputed threshold values.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::ShapeMismatch`] if the position axis does
    /// not have `calendar.max_doy()` entries.
    pub fn from_parts(
        values: Array3<f64>,
        calendar: Calendar,
        fill_value: f64,
    ) -> Result<Self, PercentileError> {
        let (positions, rows, cols) = values.dim();
        let expected = calendar.max_doy() as usize;
        if positions != expected {
            return Err(PercentileError::ShapeMismatch {
                expected: vec![expected, rows, cols],
                got: vec![positions, rows, cols],
            });
        }
        Ok(Self {
            values,
            calendar,
            fill_value,
        })
    }

    /// Creates a threshold filled with `fill_value`.
    pub fn filled(rows: usize, cols: usize, calendar: Calendar, fill_value: f64) -> Self {
        Self {
            values: Array3::from_elem((calendar.max_doy() as usize, rows, cols), fill_value),
            calendar,
            fill_value,
        }
    }

    /// Returns all values as `(position, row, col)`.
    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    /// Returns the calendar.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns the fill value.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns `(rows, cols)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.values.dim();
        (rows, cols)
    }

    /// Returns the threshold grid for `doy`.
    pub fn at_doy(&self, doy: Doy) -> ArrayView2<'_, f64> {
        self.values.index_axis(Axis(0), doy.index())
    }

    /// Returns the threshold grid applying to `date`.
    pub fn at(&self, date: Date) -> ArrayView2<'_, f64> {
        self.at_doy(date.reference_doy(self.calendar))
    }

    /// Returns a copy restricted to a spatial window.
    pub fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            values: self.values.slice(s![.., rows, cols]).to_owned(),
            calendar: self.calendar,
            fill_value: self.fill_value,
        }
    }

    /// Writes `tile` into this grid with its origin at `(row0, col0)`.
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::ShapeMismatch`] if `tile` does not fit.
    pub fn insert_window(
        &mut self,
        row0: usize,
        col0: usize,
        tile: &DoyThreshold,
    ) -> Result<(), PercentileError> {
        let (positions, rows, cols) = self.values.dim();
        let (tp, tr, tc) = tile.values.dim();
        if tp != positions || row0 + tr > rows || col0 + tc > cols {
            return Err(PercentileError::ShapeMismatch {
                expected: vec![positions, rows, cols],
                got: vec![tp, row0 + tr, col0 + tc],
            });
        }
        self.values
            .slice_mut(s![.., row0..row0 + tr, col0..col0 + tc])
            .assign(&tile.values);
        Ok(())
    }
}

/// Computes a day-of-year threshold over prebuilt pools.
///
/// Fill values (and values below the wet-day floor, if set) leave the
/// pool. An empty pool yields the fill value.
///
/// # Errors
///
/// Returns [`PercentileError::ShapeMismatch`] if `pools` were built for a
/// different date axis than `base`.
pub fn doy_threshold_with(
    base: &TimeSeries,
    pools: &DoyPools,
    config: &PercentileConfig,
) -> Result<DoyThreshold, PercentileError> {
    if pools.n_rows != base.n_steps() || pools.calendar != base.calendar() {
        return Err(PercentileError::ShapeMismatch {
            expected: vec![pools.n_rows],
            got: vec![base.n_steps()],
        });
    }
    let fill = base.fill_value();
    let (rows, cols) = base.grid_shape();
    let mut out = DoyThreshold::filled(rows, cols, base.calendar(), fill);
    let values = base.values();
    let floor = config.wet_day_floor();
    let mut buf = Vec::new();

    for doy in Doy::all(base.calendar()) {
        let pool = pools.rows(doy);
        if pool.is_empty() {
            continue;
        }
        let mut grid = out.values.index_axis_mut(Axis(0), doy.index());
        for r in 0..rows {
            for c in 0..cols {
                buf.clear();
                buf.extend(
                    pool.iter()
                        .map(|&t| values[[t, r, c]])
                        .filter(|&v| !is_fill(v, fill) && floor.is_none_or(|f| v >= f)),
                );
                if let Some(p) = percentile_of(&mut buf, config.percentile(), config.interpolation()) {
                    grid[[r, c]] = p;
                }
            }
        }
    }
    debug!(
        percentile = config.percentile(),
        window = config.window(),
        rows,
        cols,
        "day-of-year threshold computed"
    );
    Ok(out)
}

/// Computes a day-of-year threshold from `base`.
pub fn doy_threshold(base: &TimeSeries, config: &PercentileConfig) -> DoyThreshold {
    let pools = DoyPools::new(base.dates(), base.calendar(), config);
    // Pools were built from `base` itself, so the shapes always agree.
    doy_threshold_with(base, &pools, config).unwrap_or_else(|_| {
        let (rows, cols) = base.grid_shape();
        DoyThreshold::filled(rows, cols, base.calendar(), base.fill_value())
    })
}
