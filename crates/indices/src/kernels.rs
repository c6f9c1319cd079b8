//! Per-cell reductions over one slice.
//!
//! Every kernel takes one cell's values in time order. Missing values
//! never contribute; a cell without any valid value yields `None`. Event
//! predicates receive the time index so day-of-year thresholds can vary
//! along the slice. A missing day is never an event and breaks runs.

use boreas_series::is_fill;

use crate::compare::Extreme;

/// Location of the event behind a cell value, as slice row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellEvent {
    /// No event information.
    None,
    /// A single row (the extreme).
    At(usize),
    /// First and last row of a run or window.
    Span(usize, usize),
}

/// Counts valid values.
pub(crate) fn valid_count(values: &[f64], fill: f64) -> usize {
    values.iter().filter(|&&v| !is_fill(v, fill)).count()
}

/// Mean of valid values satisfying `keep`; `Some(None)` when no value
/// qualifies.
pub(crate) fn mean(values: &[f64], fill: f64, keep: impl Fn(usize, f64) -> bool) -> Option<Option<f64>> {
    let (mut sum, mut n, mut any) = (0.0, 0usize, false);
    for (t, &v) in values.iter().enumerate() {
        if is_fill(v, fill) {
            continue;
        }
        any = true;
        if keep(t, v) {
            sum += v;
            n += 1;
        }
    }
    any.then_some((n > 0).then(|| sum / n as f64))
}

/// Sum of `map(t, v)` over valid values; `map` returning `None` skips.
pub(crate) fn sum(values: &[f64], fill: f64, map: impl Fn(usize, f64) -> Option<f64>) -> Option<f64> {
    let (mut total, mut any) = (0.0, false);
    for (t, &v) in values.iter().enumerate() {
        if is_fill(v, fill) {
            continue;
        }
        any = true;
        if let Some(x) = map(t, v) {
            total += x;
        }
    }
    any.then_some(total)
}

/// Extreme valid value satisfying `keep`, with its first row.
pub(crate) fn extreme(
    values: &[f64],
    fill: f64,
    which: Extreme,
    keep: impl Fn(usize, f64) -> bool,
) -> Option<Option<(f64, usize)>> {
    let mut best: Option<(f64, usize)> = None;
    let mut any = false;
    for (t, &v) in values.iter().enumerate() {
        if is_fill(v, fill) {
            continue;
        }
        any = true;
        if !keep(t, v) {
            continue;
        }
        match best {
            Some((b, _)) if !which.beats(v, b) => {}
            _ => best = Some((v, t)),
        }
    }
    any.then_some(best)
}

/// Event count with first and last event row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Count {
    pub n: usize,
    pub valid: usize,
    pub span: Option<(usize, usize)>,
}

/// Counts valid values satisfying `event`.
pub(crate) fn count(values: &[f64], fill: f64, event: impl Fn(usize, f64) -> bool) -> Option<Count> {
    let mut out = Count {
        n: 0,
        valid: 0,
        span: None,
    };
    for (t, &v) in values.iter().enumerate() {
        if is_fill(v, fill) {
            continue;
        }
        out.valid += 1;
        if event(t, v) {
            out.n += 1;
            out.span = Some(out.span.map_or((t, t), |(s, _)| (s, t)));
        }
    }
    (out.valid > 0).then_some(out)
}

/// Longest run of consecutive events, with its first and last row.
///
/// Ties keep the earliest run.
pub(crate) fn longest_run(
    values: &[f64],
    fill: f64,
    event: impl Fn(usize, f64) -> bool,
) -> Option<(usize, Option<(usize, usize)>)> {
    let mut best: Option<(usize, usize)> = None;
    let mut start: Option<usize> = None;
    let mut any = false;
    let close = |s: usize, end: usize, best: &mut Option<(usize, usize)>| {
        let len = end - s + 1;
        if best.is_none_or(|(bs, be)| len > be - bs + 1) {
            *best = Some((s, end));
        }
    };
    for (t, &v) in values.iter().enumerate() {
        let valid = !is_fill(v, fill);
        any |= valid;
        let hit = valid && event(t, v);
        match (hit, start) {
            (true, None) => start = Some(t),
            (false, Some(s)) => {
                close(s, t - 1, &mut best);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        close(s, values.len() - 1, &mut best);
    }
    any.then(|| (best.map_or(0, |(s, e)| e - s + 1), best))
}

/// Days belonging to runs of at least `min_len` consecutive events.
pub(crate) fn spell_days(
    values: &[f64],
    fill: f64,
    min_len: usize,
    event: impl Fn(usize, f64) -> bool,
) -> Option<(usize, Option<(usize, usize)>)> {
    let mut total = 0usize;
    let mut span: Option<(usize, usize)> = None;
    let mut run = 0usize;
    let mut any = false;
    let flush = |run: usize, end: usize, total: &mut usize, span: &mut Option<(usize, usize)>| {
        if run >= min_len {
            *total += run;
            let s = end + 1 - run;
            *span = Some(span.map_or((s, end), |(first, _)| (first, end)));
        }
    };
    for (t, &v) in values.iter().enumerate() {
        let valid = !is_fill(v, fill);
        any |= valid;
        if valid && event(t, v) {
            run += 1;
        } else {
            if run > 0 {
                flush(run, t - 1, &mut total, &mut span);
            }
            run = 0;
        }
    }
    if run > 0 {
        flush(run, values.len() - 1, &mut total, &mut span);
    }
    any.then_some((total, span))
}

/// Statistic of a running window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStat {
    Mean,
    Sum,
}

/// Extreme running mean or sum over windows of `width` rows.
///
/// Windows containing a missing value are skipped. `Some(None)` when the
/// cell has valid values but no complete window.
pub(crate) fn running(
    values: &[f64],
    fill: f64,
    width: usize,
    stat: RunStat,
    which: Extreme,
) -> Option<Option<(f64, usize, usize)>> {
    if valid_count(values, fill) == 0 {
        return None;
    }
    if width == 0 || width > values.len() {
        return Some(None);
    }
    let mut best: Option<(f64, usize, usize)> = None;
    for (s, window) in values.windows(width).enumerate() {
        if window.iter().any(|&v| is_fill(v, fill)) {
            continue;
        }
        let total: f64 = window.iter().sum();
        let x = match stat {
            RunStat::Sum => total,
            RunStat::Mean => total / width as f64,
        };
        match best {
            Some((b, _, _)) if !which.beats(x, b) => {}
            _ => best = Some((x, s, s + width - 1)),
        }
    }
    Some(best)
}
