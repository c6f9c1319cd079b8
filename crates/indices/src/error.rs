//! Error types for the boreas-indices crate.

/// Error type for all fallible operations in the boreas-indices crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    /// Returned when an index name is not in the registry.
    #[error("unknown index: '{name}'")]
    UnknownIndex {
        /// The requested name.
        name: String,
    },

    /// Returned when the number of input variables does not match the index.
    #[error("index {index} needs {expected} variable(s), got {got}")]
    WrongVariableCount {
        /// Index name.
        index: String,
        /// Number of variables the index reads.
        expected: usize,
        /// Number supplied.
        got: usize,
    },

    /// Returned when a percentile threshold required by the index is absent.
    #[error("index {index} needs a percentile threshold for variable {position}")]
    MissingThreshold {
        /// Index name.
        index: String,
        /// Position of the variable.
        position: usize,
    },

    /// Returned when a fixed threshold is given to an index that has none.
    #[error("index {index} does not accept a threshold")]
    ThresholdNotSupported {
        /// Index name.
        index: String,
    },

    /// Returned when a user-defined index is inconsistent.
    #[error("invalid user index: {reason}")]
    InvalidUserIndex {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when input slices disagree in shape.
    #[error("input shape mismatch: {reason}")]
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unknown_index() {
        let e = IndexError::UnknownIndex {
            name: "TX42p".to_string(),
        };
        assert_eq!(e.to_string(), "unknown index: 'TX42p'");
    }

    #[test]
    fn error_wrong_variable_count() {
        let e = IndexError::WrongVariableCount {
            index: "DTR".to_string(),
            expected: 2,
            got: 1,
        };
        assert_eq!(e.to_string(), "index DTR needs 2 variable(s), got 1");
    }

    #[test]
    fn error_threshold_not_supported() {
        let e = IndexError::ThresholdNotSupported {
            index: "TG".to_string(),
        };
        assert_eq!(e.to_string(), "index TG does not accept a threshold");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<IndexError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<IndexError>();
    }
}
