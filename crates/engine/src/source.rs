//! Raw-data source contract and an in-memory implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use boreas_calendar::{Calendar, Date, TimeRange};
use boreas_series::TimeSeries;
use ndarray::{Array3, s};

use crate::error::EngineError;

/// Shape and type of one variable, as found by [`DataSource::describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Time steps inside the requested range.
    pub time_steps: usize,
    /// Bytes per stored value.
    pub value_size: usize,
    /// Calendar of the time axis.
    pub calendar: Calendar,
}

/// A tile-scoped read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest<'a> {
    /// Variable name.
    pub variable: &'a str,
    /// Files (or other locations) holding the variable, in time order.
    pub sources: &'a [String],
    /// Dates to read; `None` for the whole time axis.
    pub time_range: Option<TimeRange>,
    /// Vertical level value, for 4-D variables.
    pub level: Option<f64>,
    /// Grid rows of the tile.
    pub rows: Range<usize>,
    /// Grid columns of the tile.
    pub cols: Range<usize>,
}

/// Values of one variable over one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTile {
    /// Ascending dates.
    pub dates: Vec<Date>,
    /// Values indexed `(time, row, col)`.
    pub values: Array3<f64>,
    /// Fill value, if the source declares one.
    pub fill_value: Option<f64>,
    /// Calendar of `dates`.
    pub calendar: Calendar,
    /// Unit string as stored.
    pub units: String,
}

/// Provider of raw gridded data.
pub trait DataSource {
    /// Error returned by the source.
    type Error: fmt::Display;

    /// Describes `variable` over `time_range` without reading values.
    fn describe(
        &self,
        variable: &str,
        sources: &[String],
        time_range: Option<TimeRange>,
        level: Option<f64>,
    ) -> Result<VariableInfo, Self::Error>;

    /// Reads one tile.
    fn read(&self, request: &ReadRequest<'_>) -> Result<RawTile, Self::Error>;
}

/// Full-grid series held in memory, keyed by variable name.
///
/// Source lists and levels are ignored.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: BTreeMap<String, TimeSeries>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with_variable(mut self, name: impl Into<String>, series: TimeSeries) -> Self {
        self.variables.insert(name.into(), series);
        self
    }

    fn get(&self, variable: &str) -> Result<&TimeSeries, EngineError> {
        self.variables
            .get(variable)
            .ok_or_else(|| EngineError::Source {
                variable: variable.to_string(),
                reason: "not in memory source".to_string(),
            })
    }
}

impl DataSource for MemorySource {
    type Error = EngineError;

    fn describe(
        &self,
        variable: &str,
        _sources: &[String],
        time_range: Option<TimeRange>,
        _level: Option<f64>,
    ) -> Result<VariableInfo, EngineError> {
        let series = self.get(variable)?;
        let (rows, cols) = series.grid_shape();
        let time_steps = time_range.map_or(series.n_steps(), |r| series.rows_in(r).len());
        Ok(VariableInfo {
            rows,
            cols,
            time_steps,
            value_size: std::mem::size_of::<f64>(),
            calendar: series.calendar(),
        })
    }

    fn read(&self, request: &ReadRequest<'_>) -> Result<RawTile, EngineError> {
        let series = self.get(request.variable)?;
        let (rows, cols) = series.grid_shape();
        if request.rows.end > rows || request.cols.end > cols {
            return Err(EngineError::Source {
                variable: request.variable.to_string(),
                reason: format!(
                    "window {:?} x {:?} outside grid {rows} x {cols}",
                    request.rows, request.cols
                ),
            });
        }
        let time = request
            .time_range
            .map_or(0..series.n_steps(), |r| series.rows_in(r));
        Ok(RawTile {
            dates: series.dates()[time.clone()].to_vec(),
            values: series
                .values()
                .slice(s![time, request.rows.clone(), request.cols.clone()])
                .to_owned(),
            fill_value: Some(series.fill_value()),
            calendar: series.calendar(),
            units: series.units().to_string(),
        })
    }
}
