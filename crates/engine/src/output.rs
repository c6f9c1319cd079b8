//! Output buffer, its assembly from tiles, and the finished result.

use boreas_calendar::{Calendar, Date, TimeRange};
use boreas_indices::{EventShape, IndexSlice, OutputUnit};
use boreas_series::{PeriodKey, TemporalSlice};
use boreas_tile::Tile;
use ndarray::{Array4, ArrayD, ArrayViewD, Axis, s};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

/// Computed index over the full grid.
///
/// `values` is `(slice, rows, cols)`, or `(slice, threshold, rows, cols)`
/// when more than one threshold was given. Date-of-event arrays share that
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOutput {
    values: ArrayD<f64>,
    keys: Vec<PeriodKey>,
    centroids: Vec<Date>,
    bounds: Vec<(Date, Date)>,
    fill_value: f64,
    calendar: Calendar,
    units: String,
    thresholds: Vec<f64>,
    events: Vec<(String, ArrayD<f64>)>,
}

impl IndexOutput {
    /// Returns the values.
    pub fn values(&self) -> ArrayViewD<'_, f64> {
        self.values.view()
    }

    /// Returns the output shape.
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Returns `true` if the output has a threshold axis.
    pub fn has_threshold_axis(&self) -> bool {
        self.values.ndim() == 4
    }

    /// Returns the value at `(slice, threshold, row, col)`.
    ///
    /// `threshold` is ignored without a threshold axis.
    pub fn value(&self, slice: usize, threshold: usize, row: usize, col: usize) -> Option<f64> {
        if self.has_threshold_axis() {
            self.values.get([slice, threshold, row, col]).copied()
        } else {
            self.values.get([slice, row, col]).copied()
        }
    }

    /// Returns the period key of each slice.
    pub fn keys(&self) -> &[PeriodKey] {
        &self.keys
    }

    /// Returns the centroid date of each slice.
    pub fn centroids(&self) -> &[Date] {
        &self.centroids
    }

    /// Returns the first and last date of each slice.
    pub fn bounds(&self) -> &[(Date, Date)] {
        &self.bounds
    }

    /// Returns the fill value.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Returns the calendar of the dates.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns the unit string.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the fixed thresholds, in axis order.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Returns the date-of-event arrays by name.
    pub fn events(&self) -> &[(String, ArrayD<f64>)] {
        &self.events
    }

    /// Returns the date-of-event array called `name`.
    pub fn event(&self, name: &str) -> Option<ArrayViewD<'_, f64>> {
        self.events
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.view())
    }
}

/// Descriptive attributes handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Index name.
    pub index: String,
    /// Input variable names.
    pub variables: Vec<String>,
    /// Slice mode label (`year`, `month` or a season name).
    pub slice_mode: String,
    /// Requested study period.
    pub time_range: Option<TimeRange>,
    /// Base period of percentile indices.
    pub base_period: Option<TimeRange>,
    /// Unit of count indices.
    pub output_unit: OutputUnit,
    /// Day-of-year window width.
    pub window: usize,
}

/// Names of the date-of-event arrays of a shape.
pub fn event_names(shape: EventShape) -> &'static [&'static str] {
    match shape {
        EventShape::Extreme => &["date_of_event"],
        EventShape::Span => &["event_start", "event_end"],
    }
}

/// Writes tile results into the output buffer.
#[derive(Debug)]
pub(crate) struct Accumulator {
    grid: (usize, usize),
    thresholds: Vec<f64>,
    events: Option<EventShape>,
    slices: Option<Vec<TemporalSlice>>,
    fill_value: f64,
    values: Array4<f64>,
    event_values: Vec<Array4<f64>>,
}

impl Accumulator {
    /// `thresholds` is empty for a run without fixed thresholds.
    pub(crate) fn new(grid: (usize, usize), thresholds: Vec<f64>, events: Option<EventShape>) -> Self {
        let empty = Array4::zeros((0, thresholds.len().max(1), grid.0, grid.1));
        Self {
            grid,
            thresholds,
            events,
            slices: None,
            fill_value: f64::NAN,
            values: empty,
            event_values: Vec::new(),
        }
    }

    fn n_thresholds(&self) -> usize {
        self.thresholds.len().max(1)
    }

    /// Registers a tile's slices. The first call sizes the buffer; later
    /// calls must present the same periods.
    pub(crate) fn register_slices(
        &mut self,
        tile: usize,
        slices: &[TemporalSlice],
        fill_value: f64,
    ) -> Result<(), EngineError> {
        match &self.slices {
            None => {
                let shape = (slices.len(), self.n_thresholds(), self.grid.0, self.grid.1);
                self.fill_value = fill_value;
                self.values = Array4::from_elem(shape, fill_value);
                let n_events = self.events.map_or(0, |e| event_names(e).len());
                self.event_values = (0..n_events).map(|_| Array4::from_elem(shape, fill_value)).collect();
                self.slices = Some(slices.to_vec());
                debug!(?shape, "output buffer allocated");
                Ok(())
            }
            Some(first) => {
                if first.len() != slices.len() {
                    return Err(EngineError::SliceMismatch {
                        tile,
                        reason: format!("{} slices, expected {}", slices.len(), first.len()),
                    });
                }
                match first.iter().zip(slices).position(|(a, b)| a.key() != b.key()) {
                    Some(i) => Err(EngineError::SliceMismatch {
                        tile,
                        reason: format!("slice {i} is {}, expected {}", slices[i].key(), first[i].key()),
                    }),
                    None => Ok(()),
                }
            }
        }
    }

    /// Writes one slice result into the tile's window.
    pub(crate) fn write(
        &mut self,
        slice: usize,
        threshold: usize,
        tile: &Tile,
        result: &IndexSlice,
    ) -> Result<(), EngineError> {
        let (n_slices, n_thr, _, _) = self.values.dim();
        if slice >= n_slices || threshold >= n_thr || result.dim() != (tile.n_rows(), tile.n_cols()) {
            return Err(EngineError::SliceMismatch {
                tile: tile.id(),
                reason: format!(
                    "result {:?} for slice {slice} threshold {threshold} does not fit",
                    result.dim()
                ),
            });
        }
        self.values
            .slice_mut(s![slice, threshold, tile.rows(), tile.cols()])
            .assign(&result.values);
        if let Some(events) = &result.events {
            for (dest, src) in self.event_values.iter_mut().zip(events.arrays()) {
                dest.slice_mut(s![slice, threshold, tile.rows(), tile.cols()])
                    .assign(src);
            }
        }
        Ok(())
    }

    /// Finishes the run.
    pub(crate) fn finish(self, calendar: Calendar, units: String) -> IndexOutput {
        let slices = self.slices.unwrap_or_default();
        let single = self.thresholds.len() <= 1;
        let shape_out = |a: Array4<f64>| -> ArrayD<f64> {
            if single {
                a.index_axis_move(Axis(1), 0).into_dyn()
            } else {
                a.into_dyn()
            }
        };
        let names = self.events.map_or(&[][..], event_names);
        let events = names
            .iter()
            .zip(self.event_values)
            .map(|(n, a)| (n.to_string(), shape_out(a)))
            .collect();
        IndexOutput {
            values: shape_out(self.values),
            keys: slices.iter().map(|s| s.key().clone()).collect(),
            centroids: slices.iter().map(TemporalSlice::centroid).collect(),
            bounds: slices.iter().map(TemporalSlice::bounds).collect(),
            fill_value: self.fill_value,
            calendar,
            units,
            thresholds: self.thresholds,
            events,
        }
    }
}
