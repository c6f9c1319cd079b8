//! Row-major tile schedule for a memory budget.

use tracing::{debug, warn};

use crate::budget::MemoryBudget;
use crate::error::TileError;
use crate::tile::Tile;

/// Partition of a `rows x cols` grid into fixed-size tiles.
///
/// Tiles are numbered row-major. The last tile of each tile row and tile
/// column may be smaller than the nominal tile shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileScheduler {
    grid_rows: usize,
    grid_cols: usize,
    tile_rows: usize,
    tile_cols: usize,
}

impl TileScheduler {
    /// Plans tiles for a grid under `budget`.
    ///
    /// `bytes_per_cell` is the footprint of one grid cell over the whole
    /// time axis of every variable (see [`crate::CellFootprint`]).
    ///
    /// # Errors
    ///
    /// Returns [`TileError::EmptyGrid`] for an empty grid,
    /// [`TileError::ZeroCellFootprint`] for a zero footprint, or
    /// [`TileError::InvalidBudget`] when the budget itself is invalid.
    pub fn new(
        grid_rows: usize,
        grid_cols: usize,
        budget: MemoryBudget,
        bytes_per_cell: u64,
    ) -> Result<Self, TileError> {
        if grid_rows == 0 || grid_cols == 0 {
            return Err(TileError::EmptyGrid {
                rows: grid_rows,
                cols: grid_cols,
            });
        }
        if bytes_per_cell == 0 {
            return Err(TileError::ZeroCellFootprint);
        }
        budget.validate()?;

        let grid_cells = grid_rows * grid_cols;
        let (tile_rows, tile_cols) = match budget.bytes() {
            None => (grid_rows, grid_cols),
            Some(bytes) => {
                let mut cells = usize::try_from(bytes / bytes_per_cell).unwrap_or(usize::MAX);
                if cells == 0 {
                    warn!(
                        budget_bytes = bytes,
                        bytes_per_cell, "memory budget smaller than one grid cell, using 1x1 tiles"
                    );
                    cells = 1;
                }
                if cells >= grid_cells {
                    (grid_rows, grid_cols)
                } else {
                    let side = cells.isqrt().clamp(1, grid_rows);
                    let cols = (cells / side).clamp(1, grid_cols);
                    // Width capped by the grid: the rest of the budget goes to rows.
                    ((cells / cols).clamp(1, grid_rows), cols)
                }
            }
        };

        debug!(grid_rows, grid_cols, tile_rows, tile_cols, "tile schedule planned");
        Ok(Self {
            grid_rows,
            grid_cols,
            tile_rows,
            tile_cols,
        })
    }

    /// Returns `(grid_rows, grid_cols)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.grid_rows, self.grid_cols)
    }

    /// Returns the nominal `(tile_rows, tile_cols)`.
    pub fn tile_shape(&self) -> (usize, usize) {
        (self.tile_rows, self.tile_cols)
    }

    fn tiles_down(&self) -> usize {
        self.grid_rows.div_ceil(self.tile_rows)
    }

    fn tiles_across(&self) -> usize {
        self.grid_cols.div_ceil(self.tile_cols)
    }

    /// Returns the number of tiles.
    pub fn n_tiles(&self) -> usize {
        self.tiles_down() * self.tiles_across()
    }

    /// Returns the tile with the given id, if it exists.
    pub fn tile(&self, id: usize) -> Option<Tile> {
        if id >= self.n_tiles() {
            return None;
        }
        let across = self.tiles_across();
        let r0 = (id / across) * self.tile_rows;
        let c0 = (id % across) * self.tile_cols;
        let r1 = (r0 + self.tile_rows).min(self.grid_rows);
        let c1 = (c0 + self.tile_cols).min(self.grid_cols);
        Some(Tile::new(id, r0..r1, c0..c1))
    }

    /// Iterates over all tiles in id order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.n_tiles()).filter_map(|id| self.tile(id))
    }
}
