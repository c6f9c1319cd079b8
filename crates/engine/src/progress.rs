//! Progress reporting and per-run state.

use tracing::info;

use crate::error::EngineError;

/// Receives the completed percentage of a run.
pub trait ProgressReporter {
    /// Called after each unit of work with a percentage in
    /// `start..=start + total` of the run's [`ProgressSpan`].
    fn report(&mut self, percent: f64);
}

impl<F: FnMut(f64)> ProgressReporter for F {
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}

/// Logs progress at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&mut self, percent: f64) {
        info!(percent = format!("{percent:.1}"), "progress");
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _percent: f64) {}
}

/// Percentage interval a run reports into.
///
/// A caller chaining several runs gives each its own share, e.g.
/// `ProgressSpan::new(50.0, 50.0)` for the second half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSpan {
    start: f64,
    total: f64,
}

impl Default for ProgressSpan {
    fn default() -> Self {
        Self {
            start: 0.0,
            total: 100.0,
        }
    }
}

impl ProgressSpan {
    /// Creates a span starting at `start` and covering `total` percent.
    pub fn new(start: f64, total: f64) -> Self {
        Self { start, total }
    }

    /// Returns the first percentage.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Returns the width of the span.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Validates the span.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] unless
    /// `0 <= start`, `0 < total` and `start + total <= 100`.
    pub fn validate(&self) -> Result<(), EngineError> {
        let ok = self.start.is_finite()
            && self.total.is_finite()
            && self.start >= 0.0
            && self.total > 0.0
            && self.start + self.total <= 100.0;
        if ok {
            Ok(())
        } else {
            Err(EngineError::InvalidRequest {
                reason: format!(
                    "progress span start {} total {} must lie within 0..=100",
                    self.start, self.total
                ),
            })
        }
    }
}

/// Counters threaded through one run.
pub(crate) struct RunContext<'a> {
    span: ProgressSpan,
    reporter: &'a mut dyn ProgressReporter,
    done: usize,
    total: usize,
    warned_single_year_base: bool,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(span: ProgressSpan, reporter: &'a mut dyn ProgressReporter) -> Self {
        Self {
            span,
            reporter,
            done: 0,
            total: 0,
            warned_single_year_base: false,
        }
    }

    /// Sets the number of work units once the slice count is known.
    pub(crate) fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Marks one unit done and reports.
    pub(crate) fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total.max(1));
        let fraction = self.done as f64 / self.total.max(1) as f64;
        self.reporter.report(self.span.start + self.span.total * fraction);
    }

    /// Returns `true` the first time it is called.
    pub(crate) fn first_single_year_warning(&mut self) -> bool {
        !std::mem::replace(&mut self.warned_single_year_base, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_validation() {
        assert!(ProgressSpan::default().validate().is_ok());
        assert!(ProgressSpan::new(50.0, 50.0).validate().is_ok());
        assert!(ProgressSpan::new(60.0, 50.0).validate().is_err());
        assert!(ProgressSpan::new(0.0, 0.0).validate().is_err());
    }

    #[test]
    fn advance_is_monotonic_within_span() {
        let mut seen = Vec::new();
        {
            let mut record = |p: f64| seen.push(p);
            let mut ctx = RunContext::new(ProgressSpan::new(20.0, 40.0), &mut record);
            ctx.set_total(4);
            for _ in 0..4 {
                ctx.advance();
            }
        }
        assert_eq!(seen, vec![30.0, 40.0, 50.0, 60.0]);
    }

    #[test]
    fn single_year_warning_once() {
        let mut sink = NoProgress;
        let mut ctx = RunContext::new(ProgressSpan::default(), &mut sink);
        assert!(ctx.first_single_year_warning());
        assert!(!ctx.first_single_year_warning());
    }
}
