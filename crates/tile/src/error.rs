//! Error types for the boreas-tile crate.

/// Error type for all fallible operations in the boreas-tile crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TileError {
    /// Returned when the grid has no rows or no columns.
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid {
        /// Number of grid rows.
        rows: usize,
        /// Number of grid columns.
        cols: usize,
    },

    /// Returned when the per-cell footprint is zero.
    #[error("bytes per cell must be positive")]
    ZeroCellFootprint,

    /// Returned when a memory budget is not usable.
    #[error("invalid memory budget: {reason}")]
    InvalidBudget {
        /// Description of the problem.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_grid() {
        let e = TileError::EmptyGrid { rows: 0, cols: 4 };
        assert_eq!(
            e.to_string(),
            "grid must have at least one row and one column (got 0x4)"
        );
    }

    #[test]
    fn error_invalid_budget() {
        let e = TileError::InvalidBudget {
            reason: "transfer limit must be positive".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid memory budget: transfer limit must be positive"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<TileError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<TileError>();
    }
}
