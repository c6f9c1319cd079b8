//! Error types for the boreas-engine crate.

use boreas_calendar::CalendarError;
use boreas_indices::IndexError;
use boreas_percentile::PercentileError;
use boreas_series::SeriesError;
use boreas_tile::TileError;

/// Error type for all fallible operations in the boreas-engine crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Returned when a request parameter is invalid.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a percentile index is requested without a base period.
    #[error("index {index} needs a base period")]
    MissingBasePeriod {
        /// Index name.
        index: String,
    },

    /// Returned when variable names and source lists differ in number.
    #[error("{variables} variable(s) but {sources} source list(s)")]
    SourceCountMismatch {
        /// Number of variable names.
        variables: usize,
        /// Number of source lists.
        sources: usize,
    },

    /// Returned when a variable has no fill value attribute.
    #[error("variable '{variable}' has no fill value")]
    MissingFillValue {
        /// Variable name.
        variable: String,
    },

    /// Returned when the data source fails.
    #[error("reading '{variable}' failed: {reason}")]
    Source {
        /// Variable name.
        variable: String,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when the result sink fails.
    #[error("writing results failed: {reason}")]
    Sink {
        /// Description of the failure.
        reason: String,
    },

    /// Returned when a tile's slices differ from the first tile's.
    #[error("tile {tile}: {reason}")]
    SliceMismatch {
        /// Tile id.
        tile: usize,
        /// Description of the mismatch.
        reason: String,
    },

    /// Calendar error.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Tiling error.
    #[error(transparent)]
    Tile(#[from] TileError),

    /// Series error.
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// Percentile error.
    #[error(transparent)]
    Percentile(#[from] PercentileError),

    /// Index error.
    #[error(transparent)]
    Index(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_missing_base_period() {
        let e = EngineError::MissingBasePeriod {
            index: "TX90p".to_string(),
        };
        assert_eq!(e.to_string(), "index TX90p needs a base period");
    }

    #[test]
    fn error_source_count_mismatch() {
        let e = EngineError::SourceCountMismatch {
            variables: 2,
            sources: 1,
        };
        assert_eq!(e.to_string(), "2 variable(s) but 1 source list(s)");
    }

    #[test]
    fn error_slice_mismatch() {
        let e = EngineError::SliceMismatch {
            tile: 3,
            reason: "12 slices, expected 13".to_string(),
        };
        assert_eq!(e.to_string(), "tile 3: 12 slices, expected 13");
    }

    #[test]
    fn error_transparent_index() {
        let e: EngineError = IndexError::UnknownIndex {
            name: "XYZ".to_string(),
        }
        .into();
        assert_eq!(e.to_string(), "unknown index: 'XYZ'");
    }

    #[test]
    fn error_is_std_error() {
        let e = EngineError::Sink {
            reason: "disk full".to_string(),
        };
        let _: &dyn std::error::Error = &e;
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
