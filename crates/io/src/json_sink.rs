//! JSON result sink.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use boreas_calendar::{Calendar, Date};
use boreas_engine::{IndexOutput, OutputMetadata, ResultSink};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::IoError;

/// One date-of-event array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEvent {
    /// Array name.
    pub name: String,
    /// Day numbers of the calendar, shaped like the values.
    pub values: ArrayD<f64>,
}

/// On-disk form of an [`IndexOutput`].
///
/// Non-finite values (a NaN fill) are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    /// Run description.
    pub metadata: OutputMetadata,
    /// Unit string of the values.
    pub units: String,
    /// Calendar of every date.
    pub calendar: Calendar,
    /// Fill value of the values.
    pub fill_value: f64,
    /// Period label of each slice.
    pub periods: Vec<String>,
    /// Centroid of each slice.
    pub centroids: Vec<Date>,
    /// First and last date of each slice.
    pub bounds: Vec<(Date, Date)>,
    /// Fixed thresholds along the threshold axis.
    pub thresholds: Vec<f64>,
    /// Values shaped `(slice, rows, cols)` or `(slice, threshold, rows, cols)`.
    pub values: ArrayD<f64>,
    /// Date-of-event arrays.
    pub events: Vec<JsonEvent>,
}

impl JsonDocument {
    /// Builds a document from a finished run.
    pub fn new(output: &IndexOutput, metadata: &OutputMetadata) -> Self {
        Self {
            metadata: metadata.clone(),
            units: output.units().to_string(),
            calendar: output.calendar(),
            fill_value: output.fill_value(),
            periods: output.keys().iter().map(ToString::to_string).collect(),
            centroids: output.centroids().to_vec(),
            bounds: output.bounds().to_vec(),
            thresholds: output.thresholds().to_vec(),
            values: output.values().to_owned(),
            events: output
                .events()
                .iter()
                .map(|(name, values)| JsonEvent {
                    name: name.clone(),
                    values: values.clone(),
                })
                .collect(),
        }
    }

    /// Reads a document written by [`JsonSink`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] or [`IoError::Json`].
    pub fn load(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path).map_err(|_| IoError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| IoError::Json {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Writes each result to one JSON file.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
    pretty: bool,
}

impl JsonSink {
    /// Creates a sink writing compact JSON to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: false,
        }
    }

    /// Enable or disable indented output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn not_writable(&self, reason: impl Into<String>) -> IoError {
        IoError::NotWritable {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl ResultSink for JsonSink {
    type Handle = PathBuf;
    type Error = IoError;

    fn check_writable(&self) -> Result<(), IoError> {
        if self.path.is_dir() {
            return Err(self.not_writable("path is a directory"));
        }
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = std::fs::metadata(parent)
            .map_err(|_| self.not_writable(format!("directory {} does not exist", parent.display())))?;
        if !meta.is_dir() {
            return Err(self.not_writable(format!("{} is not a directory", parent.display())));
        }
        if meta.permissions().readonly() {
            return Err(self.not_writable(format!("directory {} is read-only", parent.display())));
        }
        Ok(())
    }

    fn write(&mut self, output: &IndexOutput, metadata: &OutputMetadata) -> Result<PathBuf, IoError> {
        let document = JsonDocument::new(output, metadata);
        let file = File::create(&self.path).map_err(|e| self.not_writable(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let encoded = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &document)
        } else {
            serde_json::to_writer(&mut writer, &document)
        };
        encoded.map_err(|e| IoError::Json {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        writer.flush().map_err(|e| self.not_writable(e.to_string()))?;
        info!(path = %self.path.display(), index = %metadata.index, "result written");
        Ok(self.path.clone())
    }
}
