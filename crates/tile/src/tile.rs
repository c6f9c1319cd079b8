//! Rectangular grid windows.

use std::ops::Range;

/// A rectangular sub-window of the spatial grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    id: usize,
    rows: Range<usize>,
    cols: Range<usize>,
}

impl Tile {
    pub(crate) fn new(id: usize, rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { id, rows, cols }
    }

    /// Returns the tile id (row-major position in the schedule).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the grid row range covered by the tile.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Returns the grid column range covered by the tile.
    pub fn cols(&self) -> Range<usize> {
        self.cols.clone()
    }

    /// Returns the number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// Returns the number of grid cells.
    pub fn n_cells(&self) -> usize {
        self.n_rows() * self.n_cols()
    }
}
