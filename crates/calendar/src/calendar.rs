//! CF calendar systems and day-number arithmetic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::date::Date;
use crate::doy::{LEAP_MONTH_START_DOY, NOLEAP_MONTH_START_DOY};
use crate::error::CalendarError;

/// Days per month in a common (non-leap) Gregorian year, index 0 unused.
pub(crate) const DAYS_PER_MONTH: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Days from 1970-01-01 back to 0001-01-01 in the proleptic Gregorian calendar.
const GREGORIAN_EPOCH_OFFSET: i64 = 719_162;

/// Calendar system of a time axis, following the CF conventions.
///
/// `Standard` applies Gregorian leap rules to all years (the Julian
/// segment before 1582 is not modelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Calendar {
    /// `standard` / `gregorian`.
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// `proleptic_gregorian`.
    #[serde(rename = "proleptic_gregorian")]
    ProlepticGregorian,
    /// `noleap` / `365_day`: February always has 28 days.
    #[serde(rename = "noleap")]
    NoLeap,
    /// `all_leap` / `366_day`: February always has 29 days.
    #[serde(rename = "all_leap")]
    AllLeap,
    /// `360_day`: twelve months of 30 days.
    #[serde(rename = "360_day")]
    Day360,
}

impl Calendar {
    /// Parses a CF calendar attribute value (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] for unsupported names
    /// (including `julian`).
    pub fn from_cf_name(name: &str) -> Result<Self, CalendarError> {
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Self::Standard),
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            "noleap" | "no_leap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            _ => Err(CalendarError::UnknownCalendar {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the canonical CF name of this calendar.
    pub fn cf_name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }

    /// Returns `true` if `year` contains a February 29.
    ///
    /// The 360-day calendar has a February 29 every year but never
    /// counts as a leap calendar.
    pub fn is_leap_year(self, year: i32) -> bool {
        match self {
            Self::Standard | Self::ProlepticGregorian => {
                (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
            }
            Self::NoLeap | Self::Day360 => false,
            Self::AllLeap => true,
        }
    }

    /// Returns `true` if dates in this calendar can fall on February 29.
    pub fn has_feb29(self) -> bool {
        !matches!(self, Self::NoLeap)
    }

    /// Number of days in `month` of `year`. `month` must be 1..=12.
    pub(crate) fn days_in_month(self, year: i32, month: u8) -> u8 {
        match self {
            Self::Day360 => 30,
            _ if month == 2 && self.is_leap_year(year) => 29,
            _ => DAYS_PER_MONTH[month as usize],
        }
    }

    /// Number of days in `year`.
    pub fn days_in_year(self, year: i32) -> u16 {
        match self {
            Self::Day360 => 360,
            _ if self.is_leap_year(year) => 366,
            _ => 365,
        }
    }

    /// Length of the longest year in this calendar, which is also the
    /// number of reference day-of-year positions.
    pub fn max_doy(self) -> u16 {
        match self {
            Self::Standard | Self::ProlepticGregorian | Self::AllLeap => 366,
            Self::NoLeap => 365,
            Self::Day360 => 360,
        }
    }

    /// Validates a `(year, month, day)` triple.
    pub(crate) fn validate(self, year: i32, month: u8, day: u8) -> Result<(), CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth { month });
        }
        let max_day = self.days_in_month(year, month);
        if !(1..=max_day).contains(&day) {
            return Err(CalendarError::InvalidDay {
                day,
                month,
                max_day,
            });
        }
        Ok(())
    }

    /// Position of `(month, day)` in the longest year of this calendar.
    ///
    /// In the standard calendars February 29 is always position 60 and
    /// March 1 is always position 61, whatever the year.
    pub(crate) fn reference_doy(self, month: u8, day: u8) -> u16 {
        match self {
            Self::Day360 => (month as u16 - 1) * 30 + day as u16,
            Self::NoLeap => NOLEAP_MONTH_START_DOY[month as usize] + day as u16 - 1,
            _ => LEAP_MONTH_START_DOY[month as usize] + day as u16 - 1,
        }
    }

    /// Inverse of [`Calendar::reference_doy`].
    pub(crate) fn reference_month_day(self, doy: u16) -> (u8, u8) {
        match self {
            Self::Day360 => (((doy - 1) / 30 + 1) as u8, ((doy - 1) % 30 + 1) as u8),
            Self::NoLeap => month_day_from_table(&NOLEAP_MONTH_START_DOY, doy),
            _ => month_day_from_table(&LEAP_MONTH_START_DOY, doy),
        }
    }

    /// Days elapsed since 0001-01-01 in this calendar.
    pub fn day_number(self, date: Date) -> i64 {
        let (y, m, d) = (date.year() as i64, date.month(), date.day() as i64);
        match self {
            Self::Standard | Self::ProlepticGregorian => {
                days_from_civil(y, m as i64, d) + GREGORIAN_EPOCH_OFFSET
            }
            Self::NoLeap => (y - 1) * 365 + NOLEAP_MONTH_START_DOY[m as usize] as i64 + d - 2,
            Self::AllLeap => (y - 1) * 366 + LEAP_MONTH_START_DOY[m as usize] as i64 + d - 2,
            Self::Day360 => (y - 1) * 360 + (m as i64 - 1) * 30 + d - 1,
        }
    }

    /// Inverse of [`Calendar::day_number`].
    pub fn date_from_day_number(self, n: i64) -> Date {
        match self {
            Self::Standard | Self::ProlepticGregorian => {
                let (y, m, d) = civil_from_days(n - GREGORIAN_EPOCH_OFFSET);
                Date::from_parts(y as i32, m as u8, d as u8)
            }
            Self::NoLeap => {
                let year = n.div_euclid(365) as i32 + 1;
                let doy = n.rem_euclid(365) as u16 + 1;
                let (m, d) = month_day_from_table(&NOLEAP_MONTH_START_DOY, doy);
                Date::from_parts(year, m, d)
            }
            Self::AllLeap => {
                let year = n.div_euclid(366) as i32 + 1;
                let doy = n.rem_euclid(366) as u16 + 1;
                let (m, d) = month_day_from_table(&LEAP_MONTH_START_DOY, doy);
                Date::from_parts(year, m, d)
            }
            Self::Day360 => {
                let year = n.div_euclid(360) as i32 + 1;
                let rem = n.rem_euclid(360);
                Date::from_parts(year, (rem / 30 + 1) as u8, (rem % 30 + 1) as u8)
            }
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cf_name())
    }
}

impl FromStr for Calendar {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cf_name(s)
    }
}

fn month_day_from_table(table: &[u16; 13], doy: u16) -> (u8, u8) {
    let month = (1..=12usize)
        .rev()
        .find(|&m| table[m] <= doy)
        .unwrap_or(1);
    (month as u8, (doy - table[month] + 1) as u8)
}

/// Days since 1970-01-01 for a proleptic Gregorian date (H. Hinnant).
fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}
