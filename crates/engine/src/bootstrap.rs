//! In-base bootstrap of percentile indices.
//!
//! For a study year `Y` inside the base period, the index is evaluated once
//! per substitute year `Z != Y` against the threshold of the base with `Y`
//! replaced by a copy of `Z`, and the results are averaged.

use boreas_indices::{EvalOptions, IndexDef, IndexSlice};
use boreas_series::{SliceView, is_fill};
use boreas_tile::Tile;
use ndarray::{Array2, ArrayView2};
use tracing::trace;

use crate::bound::BoundSeries;
use crate::error::EngineError;
use crate::thresholds::{ThresholdStore, TileThresholds};

/// Cell-wise mean whose result does not depend on the order of pushes.
///
/// Fill values are skipped; a cell that never received a value is fill.
#[derive(Debug, Clone)]
pub struct OrderIndependentMean {
    cols: usize,
    fill_value: f64,
    cells: Vec<Vec<f64>>,
    shape: (usize, usize),
}

impl OrderIndependentMean {
    /// Creates an empty mean over a `rows x cols` grid.
    pub fn new(rows: usize, cols: usize, fill_value: f64) -> Self {
        Self {
            cols,
            fill_value,
            cells: vec![Vec::new(); rows * cols],
            shape: (rows, cols),
        }
    }

    /// Adds one grid of values.
    ///
    /// # Panics
    ///
    /// Panics if `grid` does not have the shape given to [`new`](Self::new).
    pub fn push(&mut self, grid: ArrayView2<'_, f64>) {
        assert_eq!(grid.dim(), self.shape, "grid shape");
        for ((r, c), &v) in grid.indexed_iter() {
            if !is_fill(v, self.fill_value) {
                self.cells[r * self.cols + c].push(v);
            }
        }
    }

    /// Returns the mean of each cell.
    pub fn finish(self) -> Array2<f64> {
        let fill = self.fill_value;
        let mut cells = self.cells;
        let values = cells
            .iter_mut()
            .map(|cell| {
                if cell.is_empty() {
                    return fill;
                }
                cell.sort_by(f64::total_cmp);
                cell.iter().sum::<f64>() / cell.len() as f64
            })
            .collect();
        Array2::from_shape_vec(self.shape, values).unwrap_or_else(|_| Array2::from_elem(self.shape, fill))
    }
}

/// Evaluates one slice of an in-base study year.
///
/// Date-of-event arrays come from a single evaluation against the
/// out-of-base thresholds.
#[allow(clippy::too_many_arguments)]
pub(crate) fn evaluate_in_base(
    def: &IndexDef,
    views: &[SliceView<'_>],
    bound: &[BoundSeries],
    thresholds: &mut TileThresholds,
    store: &mut ThresholdStore,
    tile: &Tile,
    study_year: i32,
    options: &EvalOptions,
) -> Result<IndexSlice, EngineError> {
    let substitutes: Vec<i32> = thresholds
        .base_years()
        .iter()
        .copied()
        .filter(|&z| z != study_year)
        .collect();
    let mut mean = OrderIndependentMean::new(tile.n_rows(), tile.n_cols(), views[0].fill_value());
    let quiet = EvalOptions {
        date_of_event: false,
        ..*options
    };
    for &z in &substitutes {
        thresholds.ensure_candidates(study_year, z, bound, store, tile)?;
        let result = def.evaluate(views, &thresholds.candidate_refs(z), &quiet)?;
        mean.push(result.values.view());
    }
    trace!(study_year, substitutes = substitutes.len(), tile = tile.id(), "bootstrap finished");

    let events = if def.wants_events(options) {
        def.evaluate(views, &thresholds.out_of_base_refs(), options)?.events
    } else {
        None
    };
    Ok(IndexSlice {
        values: mean.finish(),
        events,
    })
}
