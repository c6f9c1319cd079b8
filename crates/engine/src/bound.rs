//! Per-variable tile state.

use boreas_calendar::TimeRange;
use boreas_indices::PercentileNeed;
use boreas_series::TimeSeries;
use boreas_tile::Tile;
use tracing::debug;

use crate::error::EngineError;
use crate::request::ComputeRequest;
use crate::source::{DataSource, RawTile, ReadRequest};

/// One input variable over one tile: its study series and, for percentile
/// indices, its base series.
#[derive(Debug, Clone)]
pub struct BoundSeries {
    name: String,
    need: Option<PercentileNeed>,
    study: TimeSeries,
    base: Option<TimeSeries>,
}

impl BoundSeries {
    /// Reads variable `position` of `request` over `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Source`] if reading fails,
    /// [`EngineError::MissingFillValue`] if the source has no fill value, or
    /// [`EngineError::Series`] if the values are not a valid series.
    pub fn read<S: DataSource>(
        source: &S,
        request: &ComputeRequest,
        position: usize,
        need: Option<PercentileNeed>,
        tile: &Tile,
    ) -> Result<Self, EngineError> {
        let name = request.variables()[position].clone();
        let read = |range: Option<TimeRange>| -> Result<TimeSeries, EngineError> {
            let raw = source
                .read(&ReadRequest {
                    variable: &name,
                    sources: &request.sources()[position],
                    time_range: range,
                    level: request.level(&name),
                    rows: tile.rows(),
                    cols: tile.cols(),
                })
                .map_err(|e| EngineError::Source {
                    variable: name.clone(),
                    reason: e.to_string(),
                })?;
            let series = to_series(&name, raw, request)?;
            Ok(request.leap_days().apply(&series))
        };

        let study = read(request.time_range())?;
        let base = match (need, request.base_period()) {
            (Some(_), Some(range)) => Some(read(Some(range))?),
            _ => None,
        };
        debug!(
            variable = %name,
            tile = tile.id(),
            study_steps = study.n_steps(),
            base_steps = base.as_ref().map_or(0, TimeSeries::n_steps),
            "variable bound"
        );
        Ok(Self {
            name,
            need,
            study,
            base,
        })
    }

    /// Wraps series already in memory.
    pub fn new(
        name: impl Into<String>,
        need: Option<PercentileNeed>,
        study: TimeSeries,
        base: Option<TimeSeries>,
    ) -> Self {
        Self {
            name: name.into(),
            need,
            study,
            base,
        }
    }

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the percentile threshold the variable needs.
    pub fn need(&self) -> Option<PercentileNeed> {
        self.need
    }

    /// Returns the study series.
    pub fn study(&self) -> &TimeSeries {
        &self.study
    }

    /// Returns the base series.
    pub fn base(&self) -> Option<&TimeSeries> {
        self.base.as_ref()
    }
}

fn to_series(name: &str, raw: RawTile, request: &ComputeRequest) -> Result<TimeSeries, EngineError> {
    let fill = raw.fill_value.ok_or_else(|| EngineError::MissingFillValue {
        variable: name.to_string(),
    })?;
    let mut series = TimeSeries::new(raw.dates, raw.values, fill, raw.calendar, raw.units)?;
    if let Some(t) = request.transform(name) {
        series.transform(t.scale, t.offset);
        if let Some(units) = &t.units {
            series.set_units(units.clone());
        }
    }
    Ok(series)
}
