//! Evaluation inputs: slice views, thresholds and options.

use boreas_percentile::{DoyThreshold, WetDayThreshold};
use boreas_series::SliceView;
use ndarray::{ArrayView2, ArrayView3, s};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::result::OutputUnit;

/// How a variable's percentile threshold is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Day-of-year threshold, bootstrapped for in-base years. Values below
    /// `wet_day_floor` leave the pool.
    DayOfYear {
        /// Optional lower bound of pooled values.
        wet_day_floor: Option<f64>,
    },
    /// Single wet-day threshold over the base period, never bootstrapped.
    WetDay {
        /// Minimum amount of a wet day.
        wet_day_min: f64,
    },
}

/// Percentile threshold a variable needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileNeed {
    /// Percentile in (0, 100).
    pub percentile: f64,
    /// Estimation kind.
    pub kind: ThresholdKind,
}

impl PercentileNeed {
    pub(crate) fn doy(percentile: f64) -> Self {
        Self {
            percentile,
            kind: ThresholdKind::DayOfYear {
                wet_day_floor: None,
            },
        }
    }

    pub(crate) fn doy_wet(percentile: f64) -> Self {
        Self {
            percentile,
            kind: ThresholdKind::DayOfYear {
                wet_day_floor: Some(crate::WET_DAY),
            },
        }
    }

    pub(crate) fn wet(percentile: f64) -> Self {
        Self {
            percentile,
            kind: ThresholdKind::WetDay {
                wet_day_min: crate::WET_DAY,
            },
        }
    }

    /// Returns `true` for thresholds that are bootstrapped in the base.
    pub fn is_bootstrapped(&self) -> bool {
        matches!(self.kind, ThresholdKind::DayOfYear { .. })
    }
}

/// Threshold handed to one evaluation of one variable.
#[derive(Debug, Clone, Copy)]
pub enum VariableThreshold<'a> {
    /// The variable needs no percentile threshold.
    None,
    /// Day-of-year threshold over the tile.
    DayOfYear(&'a DoyThreshold),
    /// Wet-day threshold over the tile.
    WetDay(&'a WetDayThreshold),
}

/// Per-run evaluation options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvalOptions {
    /// Fixed threshold replacing the index default.
    pub fixed_threshold: Option<f64>,
    /// Unit of percentile count indices.
    pub output_unit: OutputUnit,
    /// Produce date-of-event arrays.
    pub date_of_event: bool,
}

enum Lookup<'a> {
    None,
    Doy {
        values: ArrayView3<'a, f64>,
        positions: Vec<usize>,
        fill: f64,
    },
    Wet {
        values: ArrayView2<'a, f64>,
        fill: f64,
    },
}

/// One variable's slice plus its threshold, read cell by cell.
pub(crate) struct CellSeries<'a> {
    values: ArrayView3<'a, f64>,
    fill: f64,
    lookup: Lookup<'a>,
}

impl<'a> CellSeries<'a> {
    /// Binds a slice view to its threshold.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::ShapeMismatch`] if the threshold grid differs
    /// from the slice grid or uses another calendar.
    pub(crate) fn new<'b: 'a>(
        view: &SliceView<'b>,
        threshold: VariableThreshold<'a>,
    ) -> Result<Self, IndexError> {
        let (_, rows, cols) = view.dim();
        let lookup = match threshold {
            VariableThreshold::None => Lookup::None,
            VariableThreshold::DayOfYear(t) => {
                if t.grid_shape() != (rows, cols) || t.calendar() != view.calendar() {
                    return Err(IndexError::ShapeMismatch {
                        reason: format!(
                            "day-of-year threshold {:?} ({}) vs slice {:?} ({})",
                            t.grid_shape(),
                            t.calendar(),
                            (rows, cols),
                            view.calendar()
                        ),
                    });
                }
                let positions = view
                    .dates()
                    .iter()
                    .map(|d| d.reference_doy(t.calendar()).index())
                    .collect();
                Lookup::Doy {
                    values: t.values(),
                    positions,
                    fill: t.fill_value(),
                }
            }
            VariableThreshold::WetDay(t) => {
                if t.values().dim() != (rows, cols) {
                    return Err(IndexError::ShapeMismatch {
                        reason: format!(
                            "wet-day threshold {:?} vs slice {:?}",
                            t.values().dim(),
                            (rows, cols)
                        ),
                    });
                }
                Lookup::Wet {
                    values: t.values(),
                    fill: t.fill_value(),
                }
            }
        };
        Ok(Self {
            values: view.values().reborrow(),
            fill: view.fill_value(),
            lookup,
        })
    }

    pub(crate) fn fill(&self) -> f64 {
        self.fill
    }

    /// Returns `(time, rows, cols)`.
    pub(crate) fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Loads one cell's values into `out`.
    pub(crate) fn load(&self, r: usize, c: usize, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.values.slice(s![.., r, c]).iter().copied());
    }

    /// Loads one cell's per-day thresholds into `out`.
    ///
    /// Missing thresholds become NaN, so no comparison against them holds.
    pub(crate) fn load_threshold(&self, r: usize, c: usize, out: &mut Vec<f64>) {
        out.clear();
        let n = self.values.dim().0;
        let clean = |v: f64, fill: f64| if boreas_series::is_fill(v, fill) { f64::NAN } else { v };
        match &self.lookup {
            Lookup::None => out.resize(n, f64::NAN),
            Lookup::Doy {
                values,
                positions,
                fill,
            } => out.extend(positions.iter().map(|&p| clean(values[[p, r, c]], *fill))),
            Lookup::Wet { values, fill } => out.resize(n, clean(values[[r, c]], *fill)),
        }
    }
}

/// Checks that all inputs share one grid and time axis.
pub(crate) fn check_aligned(inputs: &[CellSeries<'_>]) -> Result<(), IndexError> {
    if let Some((first, rest)) = inputs.split_first()
        && let Some(other) = rest.iter().find(|s| s.dim() != first.dim())
    {
        return Err(IndexError::ShapeMismatch {
            reason: format!("slices {:?} and {:?} differ", first.dim(), other.dim()),
        });
    }
    Ok(())
}
