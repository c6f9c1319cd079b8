//! Per-slice index results.

use boreas_calendar::{Calendar, Date};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::kernels::CellEvent;

/// Unit of count indices measured against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputUnit {
    /// Number of days.
    #[default]
    Days,
    /// Percentage of the valid (or wet) days of the slice.
    Percent,
}

/// Shape of the date-of-event arrays an index produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventShape {
    /// One array: the date of the extreme.
    Extreme,
    /// Two arrays: first and last date of the run or window.
    Span,
}

/// Date-of-event arrays of one slice.
///
/// Values are day numbers (days since 0001-01-01 in the series calendar,
/// see [`Calendar::day_number`]) or the fill value where undefined.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDates {
    /// Date of the extreme.
    Extreme(Array2<f64>),
    /// First and last date of the event span.
    Span {
        /// First date.
        start: Array2<f64>,
        /// Last date.
        end: Array2<f64>,
    },
}

impl EventDates {
    /// Returns the arrays in output order (`[extreme]` or `[start, end]`).
    pub fn arrays(&self) -> Vec<&Array2<f64>> {
        match self {
            Self::Extreme(a) => vec![a],
            Self::Span { start, end } => vec![start, end],
        }
    }
}

/// Result of one index over one slice and tile.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSlice {
    /// Index values, `(rows, cols)`.
    pub values: Array2<f64>,
    /// Date-of-event arrays, when requested and supported.
    pub events: Option<EventDates>,
}

impl IndexSlice {
    /// Returns `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }
}

/// Builds an [`IndexSlice`] cell by cell.
///
/// `cell` returns the value and event rows of one cell, or `None` for a
/// cell that has to be filled.
pub(crate) fn collect_cells(
    rows: usize,
    cols: usize,
    fill: f64,
    events: Option<(EventShape, &[Date], Calendar)>,
    mut cell: impl FnMut(usize, usize) -> Option<(f64, CellEvent)>,
) -> IndexSlice {
    let mut values = Array2::from_elem((rows, cols), fill);
    let mut first = events.map(|_| Array2::from_elem((rows, cols), fill));
    let mut second = match events {
        Some((EventShape::Span, _, _)) => Some(Array2::from_elem((rows, cols), fill)),
        _ => None,
    };
    let day = |dates: &[Date], calendar: Calendar, t: usize| calendar.day_number(dates[t]) as f64;

    for r in 0..rows {
        for c in 0..cols {
            let Some((value, event)) = cell(r, c) else {
                continue;
            };
            values[[r, c]] = value;
            let Some((_, dates, calendar)) = events else {
                continue;
            };
            match event {
                CellEvent::None => {}
                CellEvent::At(t) => {
                    if let Some(a) = first.as_mut() {
                        a[[r, c]] = day(dates, calendar, t);
                    }
                }
                CellEvent::Span(s, e) => {
                    if let Some(a) = first.as_mut() {
                        a[[r, c]] = day(dates, calendar, s);
                    }
                    if let Some(b) = second.as_mut() {
                        b[[r, c]] = day(dates, calendar, e);
                    }
                }
            }
        }
    }

    let events = match (events, first, second) {
        (Some((EventShape::Extreme, _, _)), Some(a), _) => Some(EventDates::Extreme(a)),
        (Some((EventShape::Span, _, _)), Some(start), Some(end)) => Some(EventDates::Span { start, end }),
        _ => None,
    };
    IndexSlice { values, events }
}

#[cfg(test)]
mod tests {
    use boreas_calendar::daily_sequence;

    use super::*;

    #[test]
    fn events_become_day_numbers() {
        let cal = Calendar::NoLeap;
        let start = Date::new(2001, 1, 1, cal).unwrap();
        let dates = daily_sequence(start, 10, cal);
        let out = collect_cells(1, 2, -1.0, Some((EventShape::Span, &dates, cal)), |_, c| {
            (c == 0).then_some((3.0, CellEvent::Span(2, 4)))
        });
        assert_eq!(out.values[[0, 0]], 3.0);
        assert_eq!(out.values[[0, 1]], -1.0);
        let Some(EventDates::Span { start: s, end: e }) = out.events else {
            panic!("expected span events");
        };
        assert_eq!(s[[0, 0]], (cal.day_number(start) + 2) as f64);
        assert_eq!(e[[0, 0]], (cal.day_number(start) + 4) as f64);
        assert_eq!(s[[0, 1]], -1.0);
    }

    #[test]
    fn no_events_requested() {
        let out = collect_cells(2, 2, 0.0, None, |_, _| Some((1.0, CellEvent::At(0))));
        assert!(out.events.is_none());
        assert!(out.values.iter().all(|&v| v == 1.0));
    }
}
