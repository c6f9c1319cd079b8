//! Declarative user-defined indices.

use boreas_calendar::{Calendar, Date};
use serde::{Deserialize, Serialize};

use crate::compare::{Comparison, Extreme};
use crate::error::IndexError;
use crate::inputs::{CellSeries, EvalOptions, PercentileNeed};
use crate::kernels::{self, CellEvent, RunStat};
use crate::result::{EventShape, IndexSlice, OutputUnit, collect_cells};

/// Physical role of the single input variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    /// Temperature: percentile thresholds are day-of-year and bootstrapped.
    Temperature,
    /// Precipitation: percentile thresholds are wet-day thresholds.
    Precipitation,
}

/// Reduction a user index applies to each slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UserOperation {
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Mean value.
    Mean,
    /// Sum of values.
    Sum,
    /// Number of days satisfying the comparison.
    EventCount,
    /// Longest run of days satisfying the comparison.
    MaxConsecutiveEvents,
    /// Extreme running mean over `window` days.
    RunMean {
        /// Window width in days.
        window: usize,
        /// Extreme to report.
        extreme: Extreme,
    },
    /// Extreme running sum over `window` days.
    RunSum {
        /// Window width in days.
        window: usize,
        /// Extreme to report.
        extreme: Extreme,
    },
}

impl UserOperation {
    fn is_event(self) -> bool {
        matches!(self, Self::EventCount | Self::MaxConsecutiveEvents)
    }

    fn is_running(self) -> bool {
        matches!(self, Self::RunMean { .. } | Self::RunSum { .. })
    }
}

/// Threshold of a user index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserThreshold {
    /// Fixed value in input units.
    Fixed(f64),
    /// Percentile of the base period.
    Percentile(f64),
}

/// A user-defined index.
///
/// # Example
///
/// ```
/// use boreas_indices::{Comparison, UserIndex, UserOperation, UserThreshold, VariableRole};
///
/// let index = UserIndex::new(VariableRole::Temperature, UserOperation::EventCount)
///     .with_comparison(Comparison::Gt)
///     .with_threshold(UserThreshold::Percentile(90.0));
/// assert!(index.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserIndex {
    role: VariableRole,
    operation: UserOperation,
    comparison: Option<Comparison>,
    threshold: Option<UserThreshold>,
    date_of_event: bool,
}

impl UserIndex {
    /// Creates a user index without comparison or threshold.
    pub fn new(role: VariableRole, operation: UserOperation) -> Self {
        Self {
            role,
            operation,
            comparison: None,
            threshold: None,
            date_of_event: false,
        }
    }

    /// Sets the comparison operator.
    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Sets the threshold.
    pub fn with_threshold(mut self, threshold: UserThreshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Requests date-of-event arrays.
    pub fn with_date_of_event(mut self, date_of_event: bool) -> Self {
        self.date_of_event = date_of_event;
        self
    }

    /// Returns the variable role.
    pub fn role(&self) -> VariableRole {
        self.role
    }

    /// Returns the operation.
    pub fn operation(&self) -> UserOperation {
        self.operation
    }

    /// Returns the comparison operator.
    pub fn comparison(&self) -> Option<Comparison> {
        self.comparison
    }

    /// Returns the threshold.
    pub fn threshold(&self) -> Option<UserThreshold> {
        self.threshold
    }

    /// Returns `true` if date-of-event arrays are requested.
    pub fn date_of_event(&self) -> bool {
        self.date_of_event
    }

    /// Validates the combination of operation, comparison and threshold.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidUserIndex`] if:
    /// - an event operation lacks its comparison or threshold
    /// - a percentile threshold is used outside event operations
    /// - a percentile is outside (0, 100) or a fixed threshold is not finite
    /// - a running window is zero
    /// - a comparison is given without a threshold or vice versa
    pub fn validate(&self) -> Result<(), IndexError> {
        let fail = |reason: String| Err(IndexError::InvalidUserIndex { reason });
        let op = self.operation;

        if op.is_event() && (self.comparison.is_none() || self.threshold.is_none()) {
            return fail(format!("{op:?} needs a comparison and a threshold"));
        }
        if self.comparison.is_some() != self.threshold.is_some() {
            return fail("comparison and threshold must be given together".to_string());
        }
        if op.is_running() && self.threshold.is_some() {
            return fail("running statistics take no threshold".to_string());
        }
        match self.threshold {
            Some(UserThreshold::Percentile(p)) => {
                if !op.is_event() {
                    return fail(format!("percentile thresholds need an event operation, got {op:?}"));
                }
                if !(p > 0.0 && p < 100.0) {
                    return fail(format!("percentile must be in (0, 100), got {p}"));
                }
            }
            Some(UserThreshold::Fixed(t)) if !t.is_finite() => {
                return fail(format!("threshold must be finite, got {t}"));
            }
            _ => {}
        }
        if let UserOperation::RunMean { window, .. } | UserOperation::RunSum { window, .. } = op
            && window == 0
        {
            return fail("running window must be at least 1 day".to_string());
        }
        Ok(())
    }

    /// Returns the conventional input variable name of the role.
    pub fn variable(&self) -> &'static str {
        match self.role {
            VariableRole::Temperature => "tas",
            VariableRole::Precipitation => "pr",
        }
    }

    /// Returns the percentile threshold the index needs, if any.
    pub fn need(&self) -> Option<PercentileNeed> {
        match (self.threshold, self.role) {
            (Some(UserThreshold::Percentile(p)), VariableRole::Temperature) => Some(PercentileNeed::doy(p)),
            (Some(UserThreshold::Percentile(p)), VariableRole::Precipitation) => {
                Some(PercentileNeed::wet(p))
            }
            _ => None,
        }
    }

    /// Returns `true` if a caller threshold may replace the fixed one.
    pub fn accepts_threshold(&self) -> bool {
        matches!(self.threshold, Some(UserThreshold::Fixed(_)))
    }

    /// Returns the date-of-event shape of the operation.
    pub fn event_shape(&self) -> Option<EventShape> {
        match self.operation {
            UserOperation::Min | UserOperation::Max => Some(EventShape::Extreme),
            UserOperation::Mean | UserOperation::Sum => None,
            _ => Some(EventShape::Span),
        }
    }

    /// Returns the output units given the input units.
    pub fn units(&self, input_units: &str, unit: OutputUnit) -> String {
        match self.operation {
            UserOperation::EventCount if unit == OutputUnit::Percent => "%".to_string(),
            UserOperation::EventCount | UserOperation::MaxConsecutiveEvents => "days".to_string(),
            _ => input_units.to_string(),
        }
    }

    fn cell(&self, v: &[f64], fill: f64, thr: &[f64], unit: OutputUnit) -> Option<(f64, CellEvent)> {
        let span = |s: Option<(usize, usize)>| s.map_or(CellEvent::None, |(a, b)| CellEvent::Span(a, b));
        let keep = |t: usize, x: f64| match self.comparison {
            Some(cmp) => cmp.holds(x, thr[t]),
            None => true,
        };
        match self.operation {
            UserOperation::Min | UserOperation::Max => {
                let which = if self.operation == UserOperation::Min {
                    Extreme::Min
                } else {
                    Extreme::Max
                };
                kernels::extreme(v, fill, which, keep)?.map(|(x, t)| (x, CellEvent::At(t)))
            }
            UserOperation::Mean => kernels::mean(v, fill, keep)?.map(|m| (m, CellEvent::None)),
            UserOperation::Sum => {
                kernels::sum(v, fill, |t, x| keep(t, x).then_some(x)).map(|s| (s, CellEvent::None))
            }
            UserOperation::EventCount => {
                let c = kernels::count(v, fill, keep)?;
                let value = match unit {
                    OutputUnit::Days => c.n as f64,
                    OutputUnit::Percent => 100.0 * c.n as f64 / c.valid as f64,
                };
                Some((value, span(c.span)))
            }
            UserOperation::MaxConsecutiveEvents => {
                kernels::longest_run(v, fill, keep).map(|(n, s)| (n as f64, span(s)))
            }
            UserOperation::RunMean { window, extreme } => kernels::running(v, fill, window, RunStat::Mean, extreme)?
                .map(|(x, s, e)| (x, CellEvent::Span(s, e))),
            UserOperation::RunSum { window, extreme } => kernels::running(v, fill, window, RunStat::Sum, extreme)?
                .map(|(x, s, e)| (x, CellEvent::Span(s, e))),
        }
    }

    /// Evaluates the index over one slice.
    pub(crate) fn evaluate(
        &self,
        input: &CellSeries<'_>,
        options: &EvalOptions,
        events: Option<(EventShape, &[Date], Calendar)>,
    ) -> IndexSlice {
        let fixed = options.fixed_threshold.or(match self.threshold {
            Some(UserThreshold::Fixed(t)) => Some(t),
            _ => None,
        });
        let (time, rows, cols) = input.dim();
        let fill = input.fill();
        let (mut buf, mut thr) = (Vec::new(), Vec::new());
        collect_cells(rows, cols, fill, events, |r, c| {
            input.load(r, c, &mut buf);
            match fixed {
                Some(t) => {
                    thr.clear();
                    thr.resize(time, t);
                }
                None => input.load_threshold(r, c, &mut thr),
            }
            self.cell(&buf, fill, &thr, options.output_unit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: f64 = -9999.0;

    fn event_count() -> UserIndex {
        UserIndex::new(VariableRole::Precipitation, UserOperation::EventCount)
            .with_comparison(Comparison::Ge)
            .with_threshold(UserThreshold::Fixed(5.0))
    }

    #[test]
    fn validate_event_needs_threshold() {
        let idx = UserIndex::new(VariableRole::Temperature, UserOperation::EventCount);
        assert!(idx.validate().is_err());
        assert!(event_count().validate().is_ok());
    }

    #[test]
    fn validate_percentile_only_for_events() {
        let idx = UserIndex::new(VariableRole::Temperature, UserOperation::Max)
            .with_comparison(Comparison::Gt)
            .with_threshold(UserThreshold::Percentile(90.0));
        assert!(idx.validate().is_err());
        let idx = UserIndex::new(VariableRole::Temperature, UserOperation::MaxConsecutiveEvents)
            .with_comparison(Comparison::Gt)
            .with_threshold(UserThreshold::Percentile(100.0));
        assert!(idx.validate().is_err());
    }

    #[test]
    fn validate_running_window() {
        let op = UserOperation::RunSum {
            window: 0,
            extreme: Extreme::Max,
        };
        assert!(UserIndex::new(VariableRole::Precipitation, op).validate().is_err());
    }

    #[test]
    fn needs_by_role() {
        let t = UserIndex::new(VariableRole::Temperature, UserOperation::EventCount)
            .with_comparison(Comparison::Lt)
            .with_threshold(UserThreshold::Percentile(10.0));
        assert!(t.need().is_some_and(|n| n.is_bootstrapped()));
        let p = UserIndex::new(VariableRole::Precipitation, UserOperation::EventCount)
            .with_comparison(Comparison::Gt)
            .with_threshold(UserThreshold::Percentile(95.0));
        assert!(p.need().is_some_and(|n| !n.is_bootstrapped()));
        assert!(event_count().need().is_none());
    }

    #[test]
    fn cell_operations() {
        let v = [1.0, 6.0, F, 7.0, 2.0];
        let thr = [5.0; 5];
        let idx = event_count();
        assert_eq!(idx.cell(&v, F, &thr, OutputUnit::Days), Some((2.0, CellEvent::Span(1, 3))));
        assert_eq!(idx.cell(&v, F, &thr, OutputUnit::Percent).unwrap().0, 50.0);

        let run = UserIndex::new(VariableRole::Precipitation, UserOperation::MaxConsecutiveEvents)
            .with_comparison(Comparison::Ge)
            .with_threshold(UserThreshold::Fixed(5.0));
        assert_eq!(run.cell(&v, F, &thr, OutputUnit::Days), Some((1.0, CellEvent::Span(1, 1))));

        let min = UserIndex::new(VariableRole::Temperature, UserOperation::Min);
        assert_eq!(min.cell(&v, F, &thr, OutputUnit::Days), Some((1.0, CellEvent::At(0))));

        let sum = UserIndex::new(VariableRole::Precipitation, UserOperation::Sum)
            .with_comparison(Comparison::Gt)
            .with_threshold(UserThreshold::Fixed(5.0));
        assert_eq!(sum.cell(&v, F, &thr, OutputUnit::Days).unwrap().0, 13.0);

        let mean = UserIndex::new(VariableRole::Temperature, UserOperation::RunMean {
            window: 2,
            extreme: Extreme::Min,
        });
        assert_eq!(mean.cell(&v, F, &thr, OutputUnit::Days), Some((3.5, CellEvent::Span(0, 1))));
    }

    #[test]
    fn event_shapes() {
        let max = UserIndex::new(VariableRole::Temperature, UserOperation::Max);
        assert_eq!(max.event_shape(), Some(EventShape::Extreme));
        assert_eq!(event_count().event_shape(), Some(EventShape::Span));
        let mean = UserIndex::new(VariableRole::Temperature, UserOperation::Mean);
        assert_eq!(mean.event_shape(), None);
    }

    #[test]
    fn serde_round_trip_record() {
        let idx = event_count().with_date_of_event(true);
        let json = serde_json::to_string(&idx).unwrap();
        let back: UserIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, idx);
    }
}
