//! Error types for the boreas-percentile crate.

/// Error type for all fallible operations in the boreas-percentile crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PercentileError {
    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when threshold dimensions do not match.
    #[error("threshold shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected `(positions, rows, cols)` or `(rows, cols)`.
        expected: Vec<usize>,
        /// Actual dimensions.
        got: Vec<usize>,
    },

    /// Returned when a cached threshold was built with other parameters.
    #[error("percentile cache does not match the run: {reason}")]
    CacheMismatch {
        /// Description of the first differing parameter.
        reason: String,
    },

    /// Returned when a cache file cannot be read or written.
    #[error("percentile cache I/O failed for '{path}': {reason}")]
    CacheIo {
        /// Path of the cache file.
        path: String,
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let e = PercentileError::InvalidConfig {
            reason: "window must be odd".to_string(),
        };
        assert_eq!(e.to_string(), "invalid configuration: window must be odd");
    }

    #[test]
    fn error_shape_mismatch() {
        let e = PercentileError::ShapeMismatch {
            expected: vec![366, 2, 2],
            got: vec![365, 2, 2],
        };
        assert_eq!(
            e.to_string(),
            "threshold shape mismatch: expected [366, 2, 2], got [365, 2, 2]"
        );
    }

    #[test]
    fn error_cache_mismatch() {
        let e = PercentileError::CacheMismatch {
            reason: "window 5 != 7".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "percentile cache does not match the run: window 5 != 7"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<PercentileError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<PercentileError>();
    }
}
