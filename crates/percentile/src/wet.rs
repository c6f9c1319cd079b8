//! Wet-day precipitation percentiles.

use std::ops::Range;

use boreas_series::{TimeSeries, is_fill};
use ndarray::{Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};

use crate::config::PercentileConfig;
use crate::error::PercentileError;
use crate::quantile::percentile_of;

/// Default minimum daily amount of a wet day, in mm/day.
pub const DEFAULT_WET_DAY_MIN: f64 = 1.0;

/// One threshold per cell over the whole base period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WetDayThreshold {
    values: Array2<f64>,
    fill_value: f64,
}

impl WetDayThreshold {
    /// Computes the percentile of all base values `>= wet_day_min`.
    ///
    /// Cells without wet days get the fill value.
    pub fn compute(base: &TimeSeries, config: &PercentileConfig, wet_day_min: f64) -> Self {
        let fill = base.fill_value();
        let (rows, cols) = base.grid_shape();
        let values = base.values();
        let mut out = Array2::from_elem((rows, cols), fill);
        let mut buf = Vec::with_capacity(base.n_steps());
        for r in 0..rows {
            for c in 0..cols {
                buf.clear();
                buf.extend(
                    values
                        .slice(s![.., r, c])
                        .iter()
                        .copied()
                        .filter(|&v| !is_fill(v, fill) && v >= wet_day_min),
                );
                if let Some(p) = percentile_of(&mut buf, config.percentile(), config.interpolation()) {
                    out[[r, c]] = p;
                }
            }
        }
        Self {
            values: out,
            fill_value: fill,
        }
    }

    /// Wraps precomputed values.
    pub fn from_parts(values: Array2<f64>, fill_value: f64) -> Self {
        Self { values, fill_value }
    }

    /// Returns the per-cell thresholds.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Returns the fill value.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns a copy restricted to a spatial window.
    pub fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            values: self.values.slice(s![rows, cols]).to_owned(),
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
        tile: &WetDayThreshold,
    ) -> Result<(), PercentileError> {
        let (rows, cols) = self.values.dim();
        let (tr, tc) = tile.values.dim();
        if row0 + tr > rows || col0 + tc > cols {
            return Err(PercentileError::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![row0 + tr, col0 + tc],
            });
        }
        self.values
            .slice_mut(s![row0..row0 + tr, col0..col0 + tc])
            .assign(&tile.values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boreas_calendar::{Calendar, Date, daily_sequence};
    use ndarray::Array3;

    use super::*;
    use crate::config::Interpolation;

    #[test]
    fn ignores_dry_days_and_fill() {
        let cal = Calendar::NoLeap;
        let dates = daily_sequence(Date::new(2001, 1, 1, cal).unwrap(), 6, cal);
        let values =
            Array3::from_shape_vec((6, 1, 2), vec![0.0, 0.0, 2.0, 0.5, 4.0, 0.2, -1.0, 0.0, 6.0, 0.9, 0.5, 0.0])
                .unwrap();
        let base = TimeSeries::new(dates, values, -1.0, cal, "mm/day").unwrap();
        let config = PercentileConfig::new(50.0).with_interpolation(Interpolation::Linear);
        let t = WetDayThreshold::compute(&base, &config, DEFAULT_WET_DAY_MIN);
        // Cell 0 wet values: 2, 4, 6.
        assert_eq!(t.values()[[0, 0]], 4.0);
        // Cell 1 has no wet day.
        assert_eq!(t.values()[[0, 1]], -1.0);
    }
}
