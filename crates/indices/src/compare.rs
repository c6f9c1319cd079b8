//! Comparison operators and run extremes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Binary comparison of a value against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `value > threshold`
    Gt,
    /// `value < threshold`
    Lt,
    /// `value >= threshold`
    Ge,
    /// `value <= threshold`
    Le,
    /// `value == threshold`
    Eq,
}

impl Comparison {
    /// Applies the comparison.
    #[inline]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Ge => value >= threshold,
            Self::Le => value <= threshold,
            Self::Eq => value == threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Eq => "eq",
        };
        f.write_str(s)
    }
}

impl FromStr for Comparison {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gt" | ">" => Ok(Self::Gt),
            "lt" | "<" => Ok(Self::Lt),
            "ge" | ">=" => Ok(Self::Ge),
            "le" | "<=" => Ok(Self::Le),
            "eq" | "=" | "==" => Ok(Self::Eq),
            other => Err(IndexError::InvalidUserIndex {
                reason: format!("unknown comparison '{other}'"),
            }),
        }
    }
}

/// Which extreme a running statistic looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    /// Smallest value.
    Min,
    /// Largest value.
    #[default]
    Max,
}

impl Extreme {
    /// Returns `true` if `candidate` strictly beats `current`.
    #[inline]
    pub(crate) fn beats(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::Min => candidate < current,
            Self::Max => candidate > current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds() {
        assert!(Comparison::Gt.holds(2.0, 1.0));
        assert!(!Comparison::Gt.holds(1.0, 1.0));
        assert!(Comparison::Ge.holds(1.0, 1.0));
        assert!(Comparison::Lt.holds(0.0, 1.0));
        assert!(Comparison::Le.holds(1.0, 1.0));
        assert!(Comparison::Eq.holds(1.0, 1.0));
    }

    #[test]
    fn parse_symbols_and_names() {
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::Ge);
        assert_eq!("lt".parse::<Comparison>().unwrap(), Comparison::Lt);
        assert!("~".parse::<Comparison>().is_err());
    }
}
