//! Error types for boreas-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the boreas-io crate.
///
/// This enum covers NetCDF failures, CF time and calendar problems,
/// inconsistent multi-file inputs, and JSON output errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Wraps an error originating from the boreas-calendar crate.
    #[error("calendar error: {reason}")]
    Calendar {
        /// Description of the underlying calendar failure.
        reason: String,
    },

    /// Returned when a variable is requested without any source file.
    #[error("no source files given for variable '{variable}'")]
    NoSources {
        /// Name of the variable.
        variable: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a time value cannot be parsed or is out of range.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time parsing issue.
        reason: String,
    },

    /// Returned when a vertical level is missing, unexpected or unknown.
    #[error("level selection failed for '{variable}': {reason}")]
    Level {
        /// Name of the variable.
        variable: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the files of one variable do not fit together.
    #[error("inconsistent source files for '{variable}': {reason}")]
    InconsistentFiles {
        /// Name of the variable.
        variable: String,
        /// Description of the inconsistency.
        reason: String,
    },

    /// Returned when the output location cannot be written.
    #[error("cannot write {}: {reason}", path.display())]
    NotWritable {
        /// Output path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when JSON output cannot be encoded or decoded.
    #[error("json error for {}: {reason}", path.display())]
    Json {
        /// Path of the JSON file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<boreas_calendar::CalendarError> for IoError {
    fn from(e: boreas_calendar::CalendarError) -> Self {
        IoError::Calendar {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_not_found() {
        let err = IoError::FileNotFound {
            path: PathBuf::from("/tmp/missing.nc"),
        };
        assert_eq!(err.to_string(), "file not found: /tmp/missing.nc");
    }

    #[test]
    fn display_netcdf() {
        let err = IoError::Netcdf {
            reason: "bad header".to_string(),
        };
        assert_eq!(err.to_string(), "netcdf error: bad header");
    }

    #[test]
    fn display_missing_variable() {
        let err = IoError::MissingVariable {
            name: "tasmax".to_string(),
            path: PathBuf::from("/data/tasmax.nc"),
        };
        assert_eq!(err.to_string(), "variable 'tasmax' not found in /data/tasmax.nc");
    }

    #[test]
    fn display_dimension_mismatch() {
        let err = IoError::DimensionMismatch {
            name: "lat".to_string(),
            expected: 180,
            got: 90,
        };
        assert_eq!(err.to_string(), "dimension 'lat' mismatch: expected 180, got 90");
    }

    #[test]
    fn display_level() {
        let err = IoError::Level {
            variable: "ta".to_string(),
            reason: "no level 850".to_string(),
        };
        assert_eq!(err.to_string(), "level selection failed for 'ta': no level 850");
    }

    #[test]
    fn display_inconsistent_files() {
        let err = IoError::InconsistentFiles {
            variable: "pr".to_string(),
            reason: "calendar noleap then standard".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "inconsistent source files for 'pr': calendar noleap then standard"
        );
    }

    #[test]
    fn display_not_writable() {
        let err = IoError::NotWritable {
            path: PathBuf::from("/out/su.json"),
            reason: "directory does not exist".to_string(),
        };
        assert_eq!(err.to_string(), "cannot write /out/su.json: directory does not exist");
    }

    #[test]
    fn from_netcdf_error() {
        let nc_err = netcdf::Error::Str("test nc error".to_string());
        let err: IoError = nc_err.into();
        assert!(matches!(err, IoError::Netcdf { .. }));
        assert!(err.to_string().contains("test nc error"));
    }

    #[test]
    fn from_calendar_error() {
        let cal_err = boreas_calendar::CalendarError::UnknownCalendar {
            name: "julian".to_string(),
        };
        let err: IoError = cal_err.into();
        assert!(matches!(err, IoError::Calendar { .. }));
        assert!(err.to_string().contains("julian"));
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<IoError>();
    }
}
