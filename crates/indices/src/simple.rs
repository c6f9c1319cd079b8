//! Single-variable and two-variable indices without percentiles.

use serde::{Deserialize, Serialize};

use crate::compare::Extreme;
use crate::inputs::CellSeries;
use crate::kernels::{self, CellEvent, RunStat};
use crate::result::{EventShape, IndexSlice, collect_cells};
use crate::{WET_DAY, ZERO_CELSIUS};

/// Built-in single-variable indices.
///
/// Temperatures are in K, precipitation in mm/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleIndex {
    /// Mean of daily mean temperature.
    Tg,
    /// Mean of daily maximum temperature.
    Tx,
    /// Mean of daily minimum temperature.
    Tn,
    /// Maximum of daily maximum temperature.
    Txx,
    /// Minimum of daily maximum temperature.
    Txn,
    /// Maximum of daily minimum temperature.
    Tnx,
    /// Minimum of daily minimum temperature.
    Tnn,
    /// Summer days: `tasmax > 25 C`.
    Su,
    /// Ice days: `tasmax < 0 C`.
    Id,
    /// Frost days: `tasmin < 0 C`.
    Fd,
    /// Tropical nights: `tasmin > 20 C`.
    Tr,
    /// Longest run of summer days.
    Csu,
    /// Longest run of frost days.
    Cfd,
    /// Growing degree days above 4 C.
    Gd4,
    /// Heating degree days below 17 C.
    Hd17,
    /// Total precipitation on wet days.
    Prcptot,
    /// Number of wet days (`pr >= 1 mm`).
    Rr1,
    /// Mean precipitation of wet days.
    Sdii,
    /// Longest dry spell (`pr < 1 mm`).
    Cdd,
    /// Longest wet spell (`pr >= 1 mm`).
    Cwd,
    /// Days with `pr >= 10 mm`.
    R10mm,
    /// Days with `pr >= 20 mm`.
    R20mm,
    /// Maximum one-day precipitation.
    Rx1day,
    /// Maximum five-day precipitation.
    Rx5day,
}

impl SimpleIndex {
    /// All variants in catalog order.
    pub const ALL: [SimpleIndex; 24] = [
        Self::Tg,
        Self::Tx,
        Self::Tn,
        Self::Txx,
        Self::Txn,
        Self::Tnx,
        Self::Tnn,
        Self::Su,
        Self::Id,
        Self::Fd,
        Self::Tr,
        Self::Csu,
        Self::Cfd,
        Self::Gd4,
        Self::Hd17,
        Self::Prcptot,
        Self::Rr1,
        Self::Sdii,
        Self::Cdd,
        Self::Cwd,
        Self::R10mm,
        Self::R20mm,
        Self::Rx1day,
        Self::Rx5day,
    ];

    /// Returns the catalog name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tg => "TG",
            Self::Tx => "TX",
            Self::Tn => "TN",
            Self::Txx => "TXx",
            Self::Txn => "TXn",
            Self::Tnx => "TNx",
            Self::Tnn => "TNn",
            Self::Su => "SU",
            Self::Id => "ID",
            Self::Fd => "FD",
            Self::Tr => "TR",
            Self::Csu => "CSU",
            Self::Cfd => "CFD",
            Self::Gd4 => "GD4",
            Self::Hd17 => "HD17",
            Self::Prcptot => "PRCPTOT",
            Self::Rr1 => "RR1",
            Self::Sdii => "SDII",
            Self::Cdd => "CDD",
            Self::Cwd => "CWD",
            Self::R10mm => "R10mm",
            Self::R20mm => "R20mm",
            Self::Rx1day => "RX1day",
            Self::Rx5day => "RX5day",
        }
    }

    /// Returns the conventional input variable name.
    pub fn variable(self) -> &'static str {
        match self {
            Self::Tg | Self::Gd4 | Self::Hd17 => "tas",
            Self::Tx | Self::Txx | Self::Txn | Self::Su | Self::Id | Self::Csu => "tasmax",
            Self::Tn | Self::Tnx | Self::Tnn | Self::Fd | Self::Tr | Self::Cfd => "tasmin",
            _ => "pr",
        }
    }

    /// Returns the default threshold of threshold-capable indices (or the
    /// fixed wet-day bound of the precipitation totals).
    pub fn default_threshold(self) -> Option<f64> {
        match self {
            Self::Su | Self::Csu => Some(ZERO_CELSIUS + 25.0),
            Self::Id | Self::Fd | Self::Cfd => Some(ZERO_CELSIUS),
            Self::Tr => Some(ZERO_CELSIUS + 20.0),
            Self::Gd4 => Some(ZERO_CELSIUS + 4.0),
            Self::Hd17 => Some(ZERO_CELSIUS + 17.0),
            Self::Prcptot | Self::Rr1 | Self::Sdii | Self::Cdd | Self::Cwd => Some(WET_DAY),
            Self::R10mm => Some(10.0),
            Self::R20mm => Some(20.0),
            _ => None,
        }
    }

    /// Returns `true` if a caller threshold may replace the default.
    pub fn accepts_threshold(self) -> bool {
        !matches!(self, Self::Prcptot | Self::Sdii) && self.default_threshold().is_some()
    }

    /// Returns the date-of-event shape, if supported.
    pub fn event_shape(self) -> Option<EventShape> {
        match self {
            Self::Txx | Self::Txn | Self::Tnx | Self::Tnn | Self::Rx1day => Some(EventShape::Extreme),
            Self::Su
            | Self::Id
            | Self::Fd
            | Self::Tr
            | Self::Csu
            | Self::Cfd
            | Self::Rr1
            | Self::Cdd
            | Self::Cwd
            | Self::R10mm
            | Self::R20mm
            | Self::Rx5day => Some(EventShape::Span),
            _ => None,
        }
    }

    /// Returns the output units given the input units.
    pub fn units(self, input_units: &str) -> String {
        match self {
            Self::Tg | Self::Tx | Self::Tn | Self::Txx | Self::Txn | Self::Tnx | Self::Tnn => {
                input_units.to_string()
            }
            Self::Gd4 | Self::Hd17 => "K days".to_string(),
            Self::Prcptot | Self::Rx1day | Self::Rx5day => "mm".to_string(),
            Self::Sdii => "mm/day".to_string(),
            _ => "days".to_string(),
        }
    }

    fn cell(self, v: &[f64], fill: f64, thr: f64) -> Option<(f64, CellEvent)> {
        let span = |s: Option<(usize, usize)>| s.map_or(CellEvent::None, |(a, b)| CellEvent::Span(a, b));
        let count = |pred: &dyn Fn(f64) -> bool| {
            kernels::count(v, fill, |_, x| pred(x)).map(|c| (c.n as f64, span(c.span)))
        };
        let run = |pred: &dyn Fn(f64) -> bool| {
            kernels::longest_run(v, fill, |_, x| pred(x)).map(|(n, s)| (n as f64, span(s)))
        };
        let extreme = |which: Extreme| {
            kernels::extreme(v, fill, which, |_, _| true)
                .flatten()
                .map(|(x, t)| (x, CellEvent::At(t)))
        };
        let mean = || {
            kernels::mean(v, fill, |_, _| true)
                .flatten()
                .map(|m| (m, CellEvent::None))
        };

        match self {
            Self::Tg | Self::Tx | Self::Tn => mean(),
            Self::Txx | Self::Tnx | Self::Rx1day => extreme(Extreme::Max),
            Self::Txn | Self::Tnn => extreme(Extreme::Min),
            Self::Su | Self::Tr => count(&|x| x > thr),
            Self::Id | Self::Fd => count(&|x| x < thr),
            Self::Rr1 | Self::R10mm | Self::R20mm => count(&|x| x >= thr),
            Self::Csu => run(&|x| x > thr),
            Self::Cfd | Self::Cdd => run(&|x| x < thr),
            Self::Cwd => run(&|x| x >= thr),
            Self::Gd4 => kernels::sum(v, fill, |_, x| (x > thr).then(|| x - thr)).map(|s| (s, CellEvent::None)),
            Self::Hd17 => kernels::sum(v, fill, |_, x| (x < thr).then(|| thr - x)).map(|s| (s, CellEvent::None)),
            Self::Prcptot => kernels::sum(v, fill, |_, x| (x >= thr).then_some(x)).map(|s| (s, CellEvent::None)),
            Self::Sdii => kernels::mean(v, fill, |_, x| x >= thr).map(|m| (m.unwrap_or(0.0), CellEvent::None)),
            Self::Rx5day => kernels::running(v, fill, 5, RunStat::Sum, Extreme::Max)
                .flatten()
                .map(|(x, s, e)| (x, CellEvent::Span(s, e))),
        }
    }

    /// Evaluates the index over one slice.
    pub(crate) fn evaluate(
        self,
        input: &CellSeries<'_>,
        threshold: Option<f64>,
        events: Option<(EventShape, &[boreas_calendar::Date], boreas_calendar::Calendar)>,
    ) -> IndexSlice {
        let thr = threshold.or(self.default_threshold()).unwrap_or(f64::NAN);
        let (_, rows, cols) = input.dim();
        let fill = input.fill();
        let mut buf = Vec::new();
        collect_cells(rows, cols, fill, events, |r, c| {
            input.load(r, c, &mut buf);
            self.cell(&buf, fill, thr)
        })
    }
}

/// Built-in indices over daily maximum and minimum temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiIndex {
    /// Mean diurnal temperature range.
    Dtr,
    /// Intra-period extreme temperature range.
    Etr,
    /// Mean absolute day-to-day change of the diurnal range.
    VDtr,
}

impl MultiIndex {
    /// All variants in catalog order.
    pub const ALL: [MultiIndex; 3] = [Self::Dtr, Self::Etr, Self::VDtr];

    /// Returns the catalog name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dtr => "DTR",
            Self::Etr => "ETR",
            Self::VDtr => "vDTR",
        }
    }

    /// Returns the input variable names, in binding order.
    pub fn variables(self) -> [&'static str; 2] {
        ["tasmax", "tasmin"]
    }

    fn cell(self, tx: &[f64], fx: f64, tn: &[f64], fn_: f64) -> Option<f64> {
        let valid = |a: f64, fa: f64| !boreas_series::is_fill(a, fa);
        match self {
            Self::Dtr => {
                let (mut sum, mut n) = (0.0, 0usize);
                for (&a, &b) in tx.iter().zip(tn) {
                    if valid(a, fx) && valid(b, fn_) {
                        sum += a - b;
                        n += 1;
                    }
                }
                (n > 0).then(|| sum / n as f64)
            }
            Self::Etr => {
                let hi = kernels::extreme(tx, fx, Extreme::Max, |_, _| true).flatten()?;
                let lo = kernels::extreme(tn, fn_, Extreme::Min, |_, _| true).flatten()?;
                Some(hi.0 - lo.0)
            }
            Self::VDtr => {
                let dtr: Vec<Option<f64>> = tx
                    .iter()
                    .zip(tn)
                    .map(|(&a, &b)| (valid(a, fx) && valid(b, fn_)).then(|| a - b))
                    .collect();
                let (mut sum, mut n) = (0.0, 0usize);
                for pair in dtr.windows(2) {
                    if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                        sum += (b - a).abs();
                        n += 1;
                    }
                }
                if n > 0 {
                    Some(sum / n as f64)
                } else {
                    dtr.iter().any(Option::is_some).then_some(0.0)
                }
            }
        }
    }

    /// Evaluates the index over one slice.
    pub(crate) fn evaluate(self, tasmax: &CellSeries<'_>, tasmin: &CellSeries<'_>) -> IndexSlice {
        let (_, rows, cols) = tasmax.dim();
        let (fx, fn_) = (tasmax.fill(), tasmin.fill());
        let (mut a, mut b) = (Vec::new(), Vec::new());
        collect_cells(rows, cols, fx, None, |r, c| {
            tasmax.load(r, c, &mut a);
            tasmin.load(r, c, &mut b);
            self.cell(&a, fx, &b, fn_).map(|v| (v, CellEvent::None))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: f64 = 1e20;

    fn k(c: f64) -> f64 {
        ZERO_CELSIUS + c
    }

    #[test]
    fn summer_days_count() {
        let v = [k(20.0), k(26.0), k(30.0), F, k(25.0)];
        let (n, ev) = SimpleIndex::Su.cell(&v, F, k(25.0)).unwrap();
        assert_eq!(n, 2.0);
        assert_eq!(ev, CellEvent::Span(1, 2));
    }

    #[test]
    fn all_fill_cell_is_none() {
        for idx in SimpleIndex::ALL {
            let thr = idx.default_threshold().unwrap_or(f64::NAN);
            assert!(idx.cell(&[F, F, F], F, thr).is_none(), "{}", idx.name());
        }
    }

    #[test]
    fn degree_days() {
        let v = [k(3.0), k(6.0), k(10.0)];
        let (gd, _) = SimpleIndex::Gd4.cell(&v, F, k(4.0)).unwrap();
        approx::assert_relative_eq!(gd, 8.0, epsilon = 1e-9);
        let (hd, _) = SimpleIndex::Hd17.cell(&v, F, k(17.0)).unwrap();
        approx::assert_relative_eq!(hd, 14.0 + 11.0 + 7.0, epsilon = 1e-9);
    }

    #[test]
    fn precipitation_family() {
        let v = [0.0, 2.0, 12.0, 0.5, 25.0, 3.0, 0.0];
        assert_eq!(SimpleIndex::Prcptot.cell(&v, F, 1.0).unwrap().0, 42.0);
        assert_eq!(SimpleIndex::Rr1.cell(&v, F, 1.0).unwrap().0, 4.0);
        assert_eq!(SimpleIndex::Sdii.cell(&v, F, 1.0).unwrap().0, 10.5);
        assert_eq!(SimpleIndex::R10mm.cell(&v, F, 10.0).unwrap().0, 2.0);
        assert_eq!(SimpleIndex::R20mm.cell(&v, F, 20.0).unwrap().0, 1.0);
        assert_eq!(SimpleIndex::Cwd.cell(&v, F, 1.0).unwrap().0, 2.0);
        assert_eq!(SimpleIndex::Cdd.cell(&v, F, 1.0).unwrap().0, 1.0);
        assert_eq!(
            SimpleIndex::Rx1day.cell(&v, F, f64::NAN).unwrap(),
            (25.0, CellEvent::At(4))
        );
        assert_eq!(
            SimpleIndex::Rx5day.cell(&v, F, f64::NAN).unwrap(),
            (42.5, CellEvent::Span(1, 5))
        );
    }

    #[test]
    fn sdii_without_wet_days_is_zero() {
        assert_eq!(SimpleIndex::Sdii.cell(&[0.0, 0.2], F, 1.0).unwrap().0, 0.0);
    }

    #[test]
    fn threshold_capability() {
        let capable: Vec<&str> = SimpleIndex::ALL
            .iter()
            .filter(|i| i.accepts_threshold())
            .map(|i| i.name())
            .collect();
        assert_eq!(
            capable,
            vec![
                "SU", "ID", "FD", "TR", "CSU", "CFD", "GD4", "HD17", "RR1", "CDD", "CWD", "R10mm",
                "R20mm"
            ]
        );
    }

    #[test]
    fn multivariable_ranges() {
        let tx = [k(10.0), k(12.0), F, k(15.0)];
        let tn = [k(2.0), k(8.0), k(1.0), k(5.0)];
        approx::assert_relative_eq!(
            MultiIndex::Dtr.cell(&tx, F, &tn, F).unwrap(),
            (8.0 + 4.0 + 10.0) / 3.0,
            epsilon = 1e-9
        );
        approx::assert_relative_eq!(
            MultiIndex::Etr.cell(&tx, F, &tn, F).unwrap(),
            14.0,
            epsilon = 1e-9
        );
        // Only the first pair of days is consecutive and complete.
        approx::assert_relative_eq!(
            MultiIndex::VDtr.cell(&tx, F, &tn, F).unwrap(),
            4.0,
            epsilon = 1e-9
        );
    }
}
