//! Tile-scoped percentile thresholds and the persisted cache.

use std::collections::BTreeMap;
use std::path::PathBuf;

use boreas_indices::{PercentileNeed, ThresholdKind, VariableThreshold};
use boreas_percentile::{
    CacheMode, CacheParameters, CachedThreshold, DoyPools, DoyThreshold, PercentileCache,
    PercentileConfig, PercentileError, WetDayThreshold, doy_threshold, doy_threshold_with,
};
use boreas_tile::Tile;
use ndarray::Array2;
use tracing::debug;

use crate::bound::BoundSeries;
use crate::error::EngineError;
use crate::request::{CacheOptions, ComputeRequest};

fn window(threshold: &CachedThreshold, tile: &Tile) -> CachedThreshold {
    match threshold {
        CachedThreshold::DayOfYear(t) => CachedThreshold::DayOfYear(t.window(tile.rows(), tile.cols())),
        CachedThreshold::WetDay(t) => CachedThreshold::WetDay(t.window(tile.rows(), tile.cols())),
    }
}

fn same_kind(threshold: &CachedThreshold, need: &PercentileNeed) -> bool {
    matches!(
        (threshold, need.kind),
        (CachedThreshold::DayOfYear(_), ThresholdKind::DayOfYear { .. })
            | (CachedThreshold::WetDay(_), ThresholdKind::WetDay { .. })
    )
}

/// Reads thresholds from a loaded cache and records them for saving.
#[derive(Debug, Default)]
pub(crate) struct ThresholdStore {
    loaded: Option<PercentileCache>,
    saving: Option<(PathBuf, PercentileCache)>,
}

impl ThresholdStore {
    /// Loads and checks the requested cache, and checks that the save
    /// path can be written.
    pub(crate) fn open(options: &CacheOptions, params: Option<CacheParameters>) -> Result<Self, EngineError> {
        let Some(params) = params else {
            return Ok(Self::default());
        };
        if let Some(path) = &options.save {
            PercentileCache::check_writable(path)?;
        }
        let loaded = match &options.load {
            Some(path) => {
                let cache = PercentileCache::load(path)?;
                cache.check(&params)?;
                Some(cache)
            }
            None => None,
        };
        let saving = options
            .save
            .as_ref()
            .map(|path| (path.clone(), PercentileCache::new(params, options.mode)));
        Ok(Self { loaded, saving })
    }

    fn record_out_of_base(
        &mut self,
        variable: &str,
        percentile: f64,
        tile: &Tile,
        threshold: &CachedThreshold,
    ) -> Result<(), PercentileError> {
        let Some((_, cache)) = &mut self.saving else {
            return Ok(());
        };
        let (rows, cols) = cache.parameters().grid;
        let calendar = cache.parameters().calendar;
        let entry = cache.variable_mut(variable, percentile);
        let (r0, c0) = (tile.rows().start, tile.cols().start);
        match (threshold, &mut entry.out_of_base) {
            (CachedThreshold::DayOfYear(t), Some(CachedThreshold::DayOfYear(full))) => {
                full.insert_window(r0, c0, t)
            }
            (CachedThreshold::WetDay(t), Some(CachedThreshold::WetDay(full))) => {
                full.insert_window(r0, c0, t)
            }
            (CachedThreshold::DayOfYear(t), slot) => {
                let mut full = DoyThreshold::filled(rows, cols, calendar, t.fill_value());
                full.insert_window(r0, c0, t)?;
                *slot = Some(CachedThreshold::DayOfYear(full));
                Ok(())
            }
            (CachedThreshold::WetDay(t), slot) => {
                let mut full =
                    WetDayThreshold::from_parts(Array2::from_elem((rows, cols), t.fill_value()), t.fill_value());
                full.insert_window(r0, c0, t)?;
                *slot = Some(CachedThreshold::WetDay(full));
                Ok(())
            }
        }
    }

    /// Returns the out-of-base threshold of `variable` over `tile`.
    pub(crate) fn out_of_base(
        &mut self,
        variable: &str,
        need: &PercentileNeed,
        tile: &Tile,
        compute: impl FnOnce() -> Result<CachedThreshold, EngineError>,
    ) -> Result<CachedThreshold, EngineError> {
        let cached = match &self.loaded {
            Some(cache) => cache
                .variable(variable, need.percentile)?
                .and_then(|v| v.out_of_base.as_ref())
                .map(|t| window(t, tile)),
            None => None,
        };
        let threshold = match cached {
            Some(t) if same_kind(&t, need) => {
                debug!(variable, tile = tile.id(), "out-of-base threshold from cache");
                t
            }
            Some(_) => {
                return Err(PercentileError::CacheMismatch {
                    reason: format!("variable '{variable}' cached with another threshold kind"),
                }
                .into());
            }
            None => compute()?,
        };
        self.record_out_of_base(variable, need.percentile, tile, &threshold)?;
        Ok(threshold)
    }

    /// Returns the bootstrap candidate of `variable` for
    /// `(study_year, substitute_year)` over `tile`.
    pub(crate) fn candidate(
        &mut self,
        variable: &str,
        percentile: f64,
        years: (i32, i32),
        tile: &Tile,
        compute: impl FnOnce() -> Result<DoyThreshold, EngineError>,
    ) -> Result<DoyThreshold, EngineError> {
        let cached = match &self.loaded {
            Some(cache) => cache
                .variable(variable, percentile)?
                .and_then(|v| v.candidate(years.0, years.1))
                .map(|t| t.window(tile.rows(), tile.cols())),
            None => None,
        };
        let threshold = match cached {
            Some(t) => t,
            None => compute()?,
        };
        if let Some((_, cache)) = &mut self.saving
            && cache.mode() == CacheMode::All
        {
            let params = cache.parameters().clone();
            cache
                .variable_mut(variable, percentile)
                .candidate_mut(years.0, years.1, &params, threshold.fill_value())
                .insert_window(tile.rows().start, tile.cols().start, &threshold)?;
        }
        Ok(threshold)
    }

    /// Writes the cache, if saving was requested.
    pub(crate) fn finish(self) -> Result<(), EngineError> {
        if let Some((path, cache)) = self.saving {
            cache.save(&path)?;
        }
        Ok(())
    }
}

/// Thresholds of one tile: out-of-base thresholds per variable and the
/// bootstrap candidates of the current study year.
#[derive(Debug)]
pub(crate) struct TileThresholds {
    out_of_base: Vec<Option<CachedThreshold>>,
    pools: Vec<Option<DoyPools>>,
    configs: Vec<Option<PercentileConfig>>,
    base_years: Vec<i32>,
    study_year: Option<i32>,
    candidates: BTreeMap<(usize, i32), DoyThreshold>,
}

impl TileThresholds {
    /// Computes (or loads) the out-of-base thresholds of every variable.
    pub(crate) fn prepare(
        request: &ComputeRequest,
        bound: &[BoundSeries],
        store: &mut ThresholdStore,
        tile: &Tile,
    ) -> Result<Self, EngineError> {
        let mut out = Self {
            out_of_base: Vec::with_capacity(bound.len()),
            pools: Vec::with_capacity(bound.len()),
            configs: Vec::with_capacity(bound.len()),
            base_years: Vec::new(),
            study_year: None,
            candidates: BTreeMap::new(),
        };
        for b in bound {
            let (Some(need), Some(base)) = (b.need(), b.base()) else {
                out.out_of_base.push(None);
                out.pools.push(None);
                out.configs.push(None);
                continue;
            };
            let config = request.percentile_config(&need);
            let pools = match need.kind {
                ThresholdKind::DayOfYear { .. } => {
                    if out.base_years.is_empty() {
                        out.base_years = base.years();
                    }
                    Some(DoyPools::new(base.dates(), base.calendar(), &config))
                }
                ThresholdKind::WetDay { .. } => None,
            };
            let threshold = store.out_of_base(b.name(), &need, tile, || match (&pools, need.kind) {
                (Some(pools), _) => Ok(CachedThreshold::DayOfYear(doy_threshold_with(base, pools, &config)?)),
                (None, ThresholdKind::WetDay { wet_day_min }) => Ok(CachedThreshold::WetDay(
                    WetDayThreshold::compute(base, &config, wet_day_min),
                )),
                (None, ThresholdKind::DayOfYear { .. }) => Ok(CachedThreshold::DayOfYear(
                    doy_threshold(base, &config),
                )),
            })?;
            debug!(variable = b.name(), percentile = need.percentile, tile = tile.id(), "threshold ready");
            out.out_of_base.push(Some(threshold));
            out.pools.push(pools);
            out.configs.push(Some(config));
        }
        Ok(out)
    }

    /// Returns the base years of the bootstrapped variables.
    pub(crate) fn base_years(&self) -> &[i32] {
        &self.base_years
    }

    /// Returns the out-of-base thresholds in evaluation form.
    pub(crate) fn out_of_base_refs(&self) -> Vec<VariableThreshold<'_>> {
        self.out_of_base
            .iter()
            .map(|t| match t {
                None => VariableThreshold::None,
                Some(CachedThreshold::DayOfYear(t)) => VariableThreshold::DayOfYear(t),
                Some(CachedThreshold::WetDay(t)) => VariableThreshold::WetDay(t),
            })
            .collect()
    }

    /// Makes sure every bootstrapped variable has its candidate for
    /// `(study_year, substitute)`. Candidates of other study years are
    /// dropped.
    pub(crate) fn ensure_candidates(
        &mut self,
        study_year: i32,
        substitute: i32,
        bound: &[BoundSeries],
        store: &mut ThresholdStore,
        tile: &Tile,
    ) -> Result<(), EngineError> {
        if self.study_year != Some(study_year) {
            self.candidates.clear();
            self.study_year = Some(study_year);
        }
        for (i, b) in bound.iter().enumerate() {
            if self.candidates.contains_key(&(i, substitute)) {
                continue;
            }
            let (Some(need), Some(base), Some(pools), Some(config)) =
                (b.need(), b.base(), &self.pools[i], &self.configs[i])
            else {
                continue;
            };
            let threshold = store.candidate(b.name(), need.percentile, (study_year, substitute), tile, || {
                let pseudo = base.with_year_substituted(study_year, substitute)?;
                Ok(doy_threshold_with(&pseudo, pools, config)?)
            })?;
            self.candidates.insert((i, substitute), threshold);
        }
        Ok(())
    }

    /// Returns the thresholds of one bootstrap candidate: the candidate for
    /// bootstrapped variables, the out-of-base threshold otherwise.
    pub(crate) fn candidate_refs(&self, substitute: i32) -> Vec<VariableThreshold<'_>> {
        self.out_of_base_refs()
            .into_iter()
            .enumerate()
            .map(|(i, t)| match self.candidates.get(&(i, substitute)) {
                Some(c) => VariableThreshold::DayOfYear(c),
                None => t,
            })
            .collect()
    }
}
