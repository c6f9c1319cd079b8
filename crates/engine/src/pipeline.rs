//! Tiled compute loop and the public entry points.

use boreas_calendar::Calendar;
use boreas_indices::{EvalOptions, IndexDef};
use boreas_percentile::CacheParameters;
use boreas_series::{LeapDayPolicy, SliceMode, SliceView, TemporalSlice, TemporalSlicer};
use boreas_tile::{CellFootprint, TileScheduler};
use tracing::{debug, info, warn};

use crate::bootstrap::evaluate_in_base;
use crate::bound::BoundSeries;
use crate::error::EngineError;
use crate::output::{Accumulator, IndexOutput, OutputMetadata};
use crate::progress::{ProgressReporter, RunContext};
use crate::request::ComputeRequest;
use crate::sink::ResultSink;
use crate::source::{DataSource, VariableInfo};
use crate::thresholds::{ThresholdStore, TileThresholds};

/// Computes the requested index and hands it to `sink`.
///
/// The sink is checked before any data is read.
///
/// # Errors
///
/// Returns [`EngineError::Sink`] if the sink cannot be written, or any
/// error of [`evaluate`].
pub fn compute<S, K>(
    request: &ComputeRequest,
    source: &S,
    sink: &mut K,
    progress: &mut dyn ProgressReporter,
) -> Result<K::Handle, EngineError>
where
    S: DataSource,
    K: ResultSink,
{
    let sink_error = |e: K::Error| EngineError::Sink { reason: e.to_string() };
    let def = request.validate()?;
    sink.check_writable().map_err(sink_error)?;
    let output = run(request, &def, source, progress)?;
    let metadata = metadata(request, &def);
    let handle = sink.write(&output, &metadata).map_err(sink_error)?;
    info!(index = def.name(), "result written");
    Ok(handle)
}

/// Computes the requested index in memory.
///
/// # Errors
///
/// Returns an error if the request is invalid, the source fails, or the
/// percentile cache cannot be used.
pub fn evaluate<S: DataSource>(
    request: &ComputeRequest,
    source: &S,
    progress: &mut dyn ProgressReporter,
) -> Result<IndexOutput, EngineError> {
    let def = request.validate()?;
    run(request, &def, source, progress)
}

/// Builds the sink metadata of a request.
pub fn metadata(request: &ComputeRequest, def: &IndexDef) -> OutputMetadata {
    OutputMetadata {
        index: def.name().to_string(),
        variables: request.variables().to_vec(),
        slice_mode: match request.slice_mode() {
            SliceMode::Year => "year".to_string(),
            SliceMode::Month => "month".to_string(),
            SliceMode::Season(s) => s.to_string(),
        },
        time_range: request.time_range(),
        base_period: request.base_period(),
        output_unit: request.output_unit(),
        window: request.window(),
    }
}

fn describe_all<S: DataSource>(
    request: &ComputeRequest,
    def: &IndexDef,
    source: &S,
) -> Result<(Vec<VariableInfo>, u64), EngineError> {
    let needs = def.percentile_needs();
    let mut infos: Vec<VariableInfo> = Vec::with_capacity(request.variables().len());
    let mut footprint = CellFootprint::new();
    for (i, name) in request.variables().iter().enumerate() {
        let describe = |range| {
            source
                .describe(name, &request.sources()[i], range, request.level(name))
                .map_err(|e| EngineError::Source {
                    variable: name.clone(),
                    reason: e.to_string(),
                })
        };
        let info = describe(request.time_range())?;
        let base_steps = match (needs[i], request.base_period()) {
            (Some(_), Some(range)) => describe(Some(range))?.time_steps,
            _ => 0,
        };
        footprint = footprint.with_variable(info.value_size, info.time_steps, base_steps);
        if let Some(first) = infos.first() {
            if (first.rows, first.cols) != (info.rows, info.cols) {
                return Err(EngineError::InvalidRequest {
                    reason: format!(
                        "variable '{name}' has grid {}x{}, expected {}x{}",
                        info.rows, info.cols, first.rows, first.cols
                    ),
                });
            }
            if first.calendar != info.calendar {
                return Err(EngineError::InvalidRequest {
                    reason: format!(
                        "variable '{name}' uses calendar {}, expected {}",
                        info.calendar, first.calendar
                    ),
                });
            }
        }
        debug!(variable = %name, rows = info.rows, cols = info.cols, steps = info.time_steps, base_steps, "variable described");
        infos.push(info);
    }
    Ok((infos, footprint.bytes()))
}

fn cache_parameters(request: &ComputeRequest, def: &IndexDef, grid: (usize, usize), calendar: Calendar) -> Option<CacheParameters> {
    if !def.needs_percentiles() || request.cache().is_empty() {
        return None;
    }
    Some(CacheParameters {
        base_period: request.base_period()?,
        window: request.window(),
        interpolation: request.interpolation(),
        leap_years_only: request.leap_years_only(),
        exclude_leap_days: request.leap_days() == LeapDayPolicy::Exclude,
        calendar,
        grid,
    })
}

fn slice_all(bound: &[BoundSeries], mode: &SliceMode, tile: usize) -> Result<Vec<TemporalSlice>, EngineError> {
    let slicer = TemporalSlicer::new(mode.clone());
    let first = slicer.slice(bound[0].study());
    for b in &bound[1..] {
        let other = slicer.slice(b.study());
        let same = other.len() == first.len()
            && other
                .iter()
                .zip(&first)
                .all(|(a, b)| a.key() == b.key() && a.len() == b.len());
        if !same {
            return Err(EngineError::SliceMismatch {
                tile,
                reason: format!("variable '{}' has other periods than '{}'", b.name(), bound[0].name()),
            });
        }
    }
    Ok(first)
}

fn run<S: DataSource>(
    request: &ComputeRequest,
    def: &IndexDef,
    source: &S,
    progress: &mut dyn ProgressReporter,
) -> Result<IndexOutput, EngineError> {
    let (infos, bytes_per_cell) = describe_all(request, def, source)?;
    let grid = (infos[0].rows, infos[0].cols);
    let calendar = infos[0].calendar;
    let scheduler = TileScheduler::new(grid.0, grid.1, request.memory(), bytes_per_cell)?;
    info!(
        index = def.name(),
        rows = grid.0,
        cols = grid.1,
        tiles = scheduler.n_tiles(),
        "computing index"
    );

    let mut store = ThresholdStore::open(request.cache(), cache_parameters(request, def, grid, calendar))?;
    let mut options = EvalOptions {
        fixed_threshold: None,
        output_unit: request.output_unit(),
        date_of_event: request.date_of_event(),
    };
    let events = def.event_shape().filter(|_| def.wants_events(&options));
    let mut accumulator = Accumulator::new(grid, request.thresholds().to_vec(), events);
    let thresholds: Vec<Option<f64>> = if request.thresholds().is_empty() {
        vec![None]
    } else {
        request.thresholds().iter().copied().map(Some).collect()
    };

    let mut ctx = RunContext::new(request.progress(), progress);
    let needs = def.percentile_needs();
    let mut units = Vec::new();
    let mut out_calendar = calendar;

    for tile in scheduler.tiles() {
        let bound = needs
            .iter()
            .enumerate()
            .map(|(i, need)| BoundSeries::read(source, request, i, *need, &tile))
            .collect::<Result<Vec<_>, _>>()?;
        let slices = slice_all(&bound, request.slice_mode(), tile.id())?;
        if tile.id() == 0 {
            ctx.set_total(slices.len() * scheduler.n_tiles() * thresholds.len());
            units = bound.iter().map(|b| b.study().units().to_string()).collect();
            out_calendar = bound[0].study().calendar();
        }
        accumulator.register_slices(tile.id(), &slices, bound[0].study().fill_value())?;

        let mut tile_thresholds = TileThresholds::prepare(request, &bound, &mut store, &tile)?;
        let bootstraps = def.needs_bootstrap();
        let base_years = tile_thresholds.base_years().to_vec();
        if bootstraps && base_years.len() < 2 && !base_years.is_empty() && ctx.first_single_year_warning() {
            warn!(
                year = base_years[0],
                "base period covers a single year, in-base years use the out-of-base threshold"
            );
        }

        for (s, slice) in slices.iter().enumerate() {
            let views: Vec<SliceView<'_>> = bound.iter().map(|b| slice.view(b.study())).collect();
            let year = slice.key().year;
            let in_base = bootstraps && base_years.len() >= 2 && base_years.contains(&year);
            for (t, fixed) in thresholds.iter().enumerate() {
                options.fixed_threshold = *fixed;
                let result = if in_base {
                    evaluate_in_base(def, &views, &bound, &mut tile_thresholds, &mut store, &tile, year, &options)?
                } else {
                    def.evaluate(&views, &tile_thresholds.out_of_base_refs(), &options)?
                };
                accumulator.write(s, t, &tile, &result)?;
                ctx.advance();
            }
        }
        debug!(tile = tile.id(), slices = slices.len(), "tile finished");
    }

    store.finish()?;
    let unit_refs: Vec<&str> = units.iter().map(String::as_str).collect();
    Ok(accumulator.finish(out_calendar, def.output_units(&unit_refs, request.output_unit())))
}
