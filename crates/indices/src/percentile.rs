//! Percentile-based indices.
//!
//! Day-of-year indices compare each day against the threshold of its
//! reference day. Wet-day indices compare wet days against one threshold per
//! cell. The compound indices combine a temperature and a precipitation
//! day-of-year threshold on wet days.

use boreas_calendar::{Calendar, Date};
use serde::{Deserialize, Serialize};

use crate::WET_DAY;
use crate::inputs::{CellSeries, EvalOptions, PercentileNeed};
use crate::kernels::{self, CellEvent};
use crate::result::{EventShape, IndexSlice, OutputUnit, collect_cells};

/// Minimum run length of warm and cold spells.
pub const SPELL_MIN_DAYS: usize = 6;

/// Built-in single-variable percentile indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PercentileIndex {
    /// Days with `tas` below its 10th percentile.
    Tg10p,
    /// Days with `tasmax` below its 10th percentile.
    Tx10p,
    /// Days with `tasmin` below its 10th percentile.
    Tn10p,
    /// Days with `tas` above its 90th percentile.
    Tg90p,
    /// Days with `tasmax` above its 90th percentile.
    Tx90p,
    /// Days with `tasmin` above its 90th percentile.
    Tn90p,
    /// Warm spell duration: days in runs of at least six TX90p days.
    Wsdi,
    /// Cold spell duration: days in runs of at least six TN10p days.
    Csdi,
    /// Wet days above the 75th wet-day percentile.
    R75p,
    /// Wet days above the 95th wet-day percentile.
    R95p,
    /// Wet days above the 99th wet-day percentile.
    R99p,
    /// Share of precipitation falling on R75p days.
    R75ptot,
    /// Share of precipitation falling on R95p days.
    R95ptot,
    /// Share of precipitation falling on R99p days.
    R99ptot,
}

impl PercentileIndex {
    /// All variants in catalog order.
    pub const ALL: [PercentileIndex; 14] = [
        Self::Tg10p,
        Self::Tx10p,
        Self::Tn10p,
        Self::Tg90p,
        Self::Tx90p,
        Self::Tn90p,
        Self::Wsdi,
        Self::Csdi,
        Self::R75p,
        Self::R95p,
        Self::R99p,
        Self::R75ptot,
        Self::R95ptot,
        Self::R99ptot,
    ];

    /// Returns the catalog name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tg10p => "TG10p",
            Self::Tx10p => "TX10p",
            Self::Tn10p => "TN10p",
            Self::Tg90p => "TG90p",
            Self::Tx90p => "TX90p",
            Self::Tn90p => "TN90p",
            Self::Wsdi => "WSDI",
            Self::Csdi => "CSDI",
            Self::R75p => "R75p",
            Self::R95p => "R95p",
            Self::R99p => "R99p",
            Self::R75ptot => "R75pTOT",
            Self::R95ptot => "R95pTOT",
            Self::R99ptot => "R99pTOT",
        }
    }

    /// Returns the conventional input variable name.
    pub fn variable(self) -> &'static str {
        match self {
            Self::Tg10p | Self::Tg90p => "tas",
            Self::Tx10p | Self::Tx90p | Self::Wsdi => "tasmax",
            Self::Tn10p | Self::Tn90p | Self::Csdi => "tasmin",
            _ => "pr",
        }
    }

    /// Returns the threshold the index is measured against.
    pub fn need(self) -> PercentileNeed {
        match self {
            Self::Tg10p | Self::Tx10p | Self::Tn10p | Self::Csdi => PercentileNeed::doy(10.0),
            Self::Tg90p | Self::Tx90p | Self::Tn90p | Self::Wsdi => PercentileNeed::doy(90.0),
            Self::R75p | Self::R75ptot => PercentileNeed::wet(75.0),
            Self::R95p | Self::R95ptot => PercentileNeed::wet(95.0),
            Self::R99p | Self::R99ptot => PercentileNeed::wet(99.0),
        }
    }

    /// Returns the date-of-event shape, if supported.
    pub fn event_shape(self) -> Option<EventShape> {
        match self {
            Self::R75ptot | Self::R95ptot | Self::R99ptot => None,
            _ => Some(EventShape::Span),
        }
    }

    /// Returns `true` for day counts that honour [`OutputUnit::Percent`].
    pub fn is_count(self) -> bool {
        !matches!(
            self,
            Self::Wsdi | Self::Csdi | Self::R75ptot | Self::R95ptot | Self::R99ptot
        )
    }

    /// Returns the output units.
    pub fn units(self, unit: OutputUnit) -> String {
        if matches!(self, Self::R75ptot | Self::R95ptot | Self::R99ptot) {
            return "%".to_string();
        }
        match (self.is_count(), unit) {
            (true, OutputUnit::Percent) => "%".to_string(),
            _ => "days".to_string(),
        }
    }

    fn cell(self, v: &[f64], fill: f64, thr: &[f64], unit: OutputUnit) -> Option<(f64, CellEvent)> {
        let span = |s: Option<(usize, usize)>| s.map_or(CellEvent::None, |(a, b)| CellEvent::Span(a, b));
        let scaled = |n: usize, of: usize| match unit {
            OutputUnit::Days => n as f64,
            OutputUnit::Percent if of == 0 => 0.0,
            OutputUnit::Percent => 100.0 * n as f64 / of as f64,
        };
        match self {
            Self::Tg10p | Self::Tx10p | Self::Tn10p => {
                let c = kernels::count(v, fill, |t, x| x < thr[t])?;
                Some((scaled(c.n, c.valid), span(c.span)))
            }
            Self::Tg90p | Self::Tx90p | Self::Tn90p => {
                let c = kernels::count(v, fill, |t, x| x > thr[t])?;
                Some((scaled(c.n, c.valid), span(c.span)))
            }
            Self::Wsdi => kernels::spell_days(v, fill, SPELL_MIN_DAYS, |t, x| x > thr[t])
                .map(|(n, s)| (n as f64, span(s))),
            Self::Csdi => kernels::spell_days(v, fill, SPELL_MIN_DAYS, |t, x| x < thr[t])
                .map(|(n, s)| (n as f64, span(s))),
            Self::R75p | Self::R95p | Self::R99p => {
                let c = kernels::count(v, fill, |t, x| x >= WET_DAY && x > thr[t])?;
                let wet = kernels::count(v, fill, |_, x| x >= WET_DAY)?.n;
                Some((scaled(c.n, wet), span(c.span)))
            }
            Self::R75ptot | Self::R95ptot | Self::R99ptot => {
                let total = kernels::sum(v, fill, |_, x| (x >= WET_DAY).then_some(x))?;
                let above = kernels::sum(v, fill, |t, x| (x >= WET_DAY && x > thr[t]).then_some(x))?;
                let share = if total > 0.0 { 100.0 * above / total } else { 0.0 };
                Some((share, CellEvent::None))
            }
        }
    }

    /// Evaluates the index over one slice.
    pub(crate) fn evaluate(
        self,
        input: &CellSeries<'_>,
        options: &EvalOptions,
        events: Option<(EventShape, &[Date], Calendar)>,
    ) -> IndexSlice {
        let (_, rows, cols) = input.dim();
        let fill = input.fill();
        let (mut buf, mut thr) = (Vec::new(), Vec::new());
        collect_cells(rows, cols, fill, events, |r, c| {
            input.load(r, c, &mut buf);
            input.load_threshold(r, c, &mut thr);
            self.cell(&buf, fill, &thr, options.output_unit)
        })
    }
}

/// Built-in compound indices over mean temperature and precipitation.
///
/// Only wet days count; the precipitation threshold is pooled over wet days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompoundIndex {
    /// Cold and dry: `tas < tas25` and `pr < pr25`.
    Cd,
    /// Cold and wet: `tas < tas25` and `pr > pr75`.
    Cw,
    /// Warm and dry: `tas > tas75` and `pr < pr25`.
    Wd,
    /// Warm and wet: `tas > tas75` and `pr > pr75`.
    Ww,
}

impl CompoundIndex {
    /// All variants in catalog order.
    pub const ALL: [CompoundIndex; 4] = [Self::Cd, Self::Cw, Self::Wd, Self::Ww];

    /// Returns the catalog name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cd => "CD",
            Self::Cw => "CW",
            Self::Wd => "WD",
            Self::Ww => "WW",
        }
    }

    /// Returns the input variable names, in binding order.
    pub fn variables(self) -> [&'static str; 2] {
        ["tas", "pr"]
    }

    /// Returns the thresholds of `[tas, pr]`.
    pub fn needs(self) -> [PercentileNeed; 2] {
        let (t, p) = match self {
            Self::Cd => (25.0, 25.0),
            Self::Cw => (25.0, 75.0),
            Self::Wd => (75.0, 25.0),
            Self::Ww => (75.0, 75.0),
        };
        [PercentileNeed::doy(t), PercentileNeed::doy_wet(p)]
    }

    /// Returns the output units.
    pub fn units(self, unit: OutputUnit) -> String {
        match unit {
            OutputUnit::Days => "days".to_string(),
            OutputUnit::Percent => "%".to_string(),
        }
    }

    fn event(self, tas: f64, tas_thr: f64, pr: f64, pr_thr: f64) -> bool {
        if pr < WET_DAY {
            return false;
        }
        let cold = tas < tas_thr;
        let warm = tas > tas_thr;
        let dry = pr < pr_thr;
        let wet = pr > pr_thr;
        match self {
            Self::Cd => cold && dry,
            Self::Cw => cold && wet,
            Self::Wd => warm && dry,
            Self::Ww => warm && wet,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cell(
        self,
        tas: &[f64],
        tas_fill: f64,
        tas_thr: &[f64],
        pr: &[f64],
        pr_fill: f64,
        pr_thr: &[f64],
        unit: OutputUnit,
    ) -> Option<(f64, CellEvent)> {
        let (mut n, mut valid) = (0usize, 0usize);
        let mut span: Option<(usize, usize)> = None;
        for t in 0..tas.len() {
            if boreas_series::is_fill(tas[t], tas_fill) || boreas_series::is_fill(pr[t], pr_fill) {
                continue;
            }
            valid += 1;
            if self.event(tas[t], tas_thr[t], pr[t], pr_thr[t]) {
                n += 1;
                span = Some(span.map_or((t, t), |(s, _)| (s, t)));
            }
        }
        if valid == 0 {
            return None;
        }
        let value = match unit {
            OutputUnit::Days => n as f64,
            OutputUnit::Percent => 100.0 * n as f64 / valid as f64,
        };
        Some((value, span.map_or(CellEvent::None, |(s, e)| CellEvent::Span(s, e))))
    }

    /// Evaluates the index over one slice.
    pub(crate) fn evaluate(
        self,
        tas: &CellSeries<'_>,
        pr: &CellSeries<'_>,
        options: &EvalOptions,
        events: Option<(EventShape, &[Date], Calendar)>,
    ) -> IndexSlice {
        let (_, rows, cols) = tas.dim();
        let (tf, pf) = (tas.fill(), pr.fill());
        let (mut a, mut at, mut b, mut bt) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        collect_cells(rows, cols, tf, events, |r, c| {
            tas.load(r, c, &mut a);
            tas.load_threshold(r, c, &mut at);
            pr.load(r, c, &mut b);
            pr.load_threshold(r, c, &mut bt);
            self.cell(&a, tf, &at, &b, pf, &bt, options.output_unit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: f64 = 1e20;

    #[test]
    fn counts_against_daily_thresholds() {
        let v = [1.0, 5.0, 3.0, F];
        let thr = [2.0, 4.0, f64::NAN, 0.0];
        let (n, ev) = PercentileIndex::Tx90p.cell(&v, F, &thr, OutputUnit::Days).unwrap();
        assert_eq!(n, 1.0);
        assert_eq!(ev, CellEvent::Span(1, 1));
        let (p, _) = PercentileIndex::Tx10p.cell(&v, F, &thr, OutputUnit::Percent).unwrap();
        approx::assert_relative_eq!(p, 100.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn warm_spells_need_six_days() {
        let v = [10.0; 8];
        let mut thr = [5.0; 8];
        thr[6] = 20.0;
        assert_eq!(PercentileIndex::Wsdi.cell(&v, F, &thr, OutputUnit::Percent).unwrap().0, 6.0);
        thr[3] = 20.0;
        assert_eq!(PercentileIndex::Wsdi.cell(&v, F, &thr, OutputUnit::Days).unwrap().0, 0.0);
    }

    #[test]
    fn wet_day_family() {
        let v = [0.0, 2.0, 8.0, 20.0, 0.5];
        let thr = [5.0; 5];
        let (n, _) = PercentileIndex::R95p.cell(&v, F, &thr, OutputUnit::Days).unwrap();
        assert_eq!(n, 2.0);
        let (p, _) = PercentileIndex::R95p.cell(&v, F, &thr, OutputUnit::Percent).unwrap();
        approx::assert_relative_eq!(p, 200.0 / 3.0, epsilon = 1e-9);
        let (tot, _) = PercentileIndex::R95ptot.cell(&v, F, &thr, OutputUnit::Days).unwrap();
        approx::assert_relative_eq!(tot, 100.0 * 28.0 / 30.0, epsilon = 1e-9);
    }

    #[test]
    fn compound_counts_only_wet_days() {
        let tas = [270.0, 270.0, 290.0, 290.0];
        let pr = [0.5, 0.9, 10.0, 10.0];
        let tas_thr = [280.0; 4];
        let pr_thr = [5.0; 4];
        let cold_dry = CompoundIndex::Cd
            .cell(&tas, F, &tas_thr, &pr, F, &pr_thr, OutputUnit::Days)
            .unwrap();
        assert_eq!(cold_dry.0, 0.0);
        let warm_wet = CompoundIndex::Ww
            .cell(&tas, F, &tas_thr, &pr, F, &pr_thr, OutputUnit::Days)
            .unwrap();
        assert_eq!(warm_wet, (2.0, CellEvent::Span(2, 3)));
    }

    #[test]
    fn thresholds_kinds() {
        assert!(PercentileIndex::Tx90p.need().is_bootstrapped());
        assert!(!PercentileIndex::R95p.need().is_bootstrapped());
        assert!(CompoundIndex::Cw.needs().iter().all(PercentileNeed::is_bootstrapped));
    }
}
