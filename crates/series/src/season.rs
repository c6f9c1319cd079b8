//! Seasons as contiguous month spans.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

const MONTH_INITIALS: [char; 12] = ['J', 'F', 'M', 'A', 'M', 'J', 'J', 'A', 'S', 'O', 'N', 'D'];

/// A season: 1 to 12 consecutive months, possibly wrapping past December.
///
/// A season is labelled by the calendar year of its last month, so the
/// DJF season of 1991 spans December 1990 to February 1991.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SeasonRepr", into = "SeasonRepr")]
pub struct Season {
    name: String,
    months: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SeasonRepr {
    Name(String),
    Months(Vec<u8>),
}

impl TryFrom<SeasonRepr> for Season {
    type Error = SeriesError;

    fn try_from(repr: SeasonRepr) -> Result<Self, Self::Error> {
        match repr {
            SeasonRepr::Name(name) => name.parse(),
            SeasonRepr::Months(months) => Season::custom(&months),
        }
    }
}

impl From<Season> for SeasonRepr {
    fn from(season: Season) -> Self {
        SeasonRepr::Months(season.months)
    }
}

impl Season {
    /// December, January, February.
    pub fn djf() -> Self {
        Self::predefined("DJF", &[12, 1, 2])
    }

    /// March, April, May.
    pub fn mam() -> Self {
        Self::predefined("MAM", &[3, 4, 5])
    }

    /// June, July, August.
    pub fn jja() -> Self {
        Self::predefined("JJA", &[6, 7, 8])
    }

    /// September, October, November.
    pub fn son() -> Self {
        Self::predefined("SON", &[9, 10, 11])
    }

    /// October through March (winter half-year).
    pub fn ondjfm() -> Self {
        Self::predefined("ONDJFM", &[10, 11, 12, 1, 2, 3])
    }

    /// April through September (summer half-year).
    pub fn amjjas() -> Self {
        Self::predefined("AMJJAS", &[4, 5, 6, 7, 8, 9])
    }

    fn predefined(name: &str, months: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            months: months.to_vec(),
        }
    }

    /// Creates a custom season from consecutive months.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::InvalidSeason`] if `months` is empty, longer
    /// than 12, contains a value outside 1..=12, repeats a month, or is not
    /// a consecutive run (wrapping from 12 to 1 is allowed).
    pub fn custom(months: &[u8]) -> Result<Self, SeriesError> {
        if months.is_empty() || months.len() > 12 {
            return Err(SeriesError::InvalidSeason {
                reason: format!("a season needs 1 to 12 months, got {}", months.len()),
            });
        }
        if let Some(&m) = months.iter().find(|&&m| !(1..=12).contains(&m)) {
            return Err(SeriesError::InvalidSeason {
                reason: format!("month {m} is outside 1..=12"),
            });
        }
        for pair in months.windows(2) {
            if pair[1] != pair[0] % 12 + 1 {
                return Err(SeriesError::InvalidSeason {
                    reason: format!("months {} and {} are not consecutive", pair[0], pair[1]),
                });
            }
        }
        let name: String = months
            .iter()
            .map(|&m| MONTH_INITIALS[(m - 1) as usize])
            .collect();
        Ok(Self {
            name,
            months: months.to_vec(),
        })
    }

    /// Returns the season name (e.g. `"DJF"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the months in order.
    pub fn months(&self) -> &[u8] {
        &self.months
    }

    /// Returns `true` if `month` belongs to the season.
    pub fn contains(&self, month: u8) -> bool {
        self.months.contains(&month)
    }

    /// Returns the label year of a date in `month` of `year`, or `None`
    /// if the month is outside the season.
    pub fn label_year(&self, year: i32, month: u8) -> Option<i32> {
        if !self.contains(month) {
            return None;
        }
        let last = *self.months.last()?;
        // Months after the last one belong to the part before the year end.
        Some(if month > last { year + 1 } else { year })
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Season {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DJF" | "WINTER" => Ok(Self::djf()),
            "MAM" | "SPRING" => Ok(Self::mam()),
            "JJA" | "SUMMER" => Ok(Self::jja()),
            "SON" | "AUTUMN" => Ok(Self::son()),
            "ONDJFM" => Ok(Self::ondjfm()),
            "AMJJAS" => Ok(Self::amjjas()),
            other => Err(SeriesError::InvalidSeason {
                reason: format!("unknown season name '{other}'"),
            }),
        }
    }
}
