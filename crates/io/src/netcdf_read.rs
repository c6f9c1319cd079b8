//! Low-level NetCDF extraction helpers.

use std::path::Path;

use boreas_calendar::{Calendar, Date};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use netcdf::AttributeValue;

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Look up `name` in `file`.
pub(crate) fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    file.variable(name).ok_or_else(|| IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a string attribute, ignoring attributes of other types.
pub(crate) fn string_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Read a scalar numeric attribute as `f64`.
pub(crate) fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Uint(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().copied().map(f64::from),
        _ => None,
    }
}

/// The declared fill value: `_FillValue`, else `missing_value`.
pub(crate) fn fill_value(var: &netcdf::Variable<'_>) -> Option<f64> {
    numeric_attribute(var, "_FillValue").or_else(|| numeric_attribute(var, "missing_value"))
}

/// CF packing attributes `(scale_factor, add_offset)`.
pub(crate) fn packing(var: &netcdf::Variable<'_>) -> (f64, f64) {
    (
        numeric_attribute(var, "scale_factor").unwrap_or(1.0),
        numeric_attribute(var, "add_offset").unwrap_or(0.0),
    )
}

/// Parsed CF time `units` string such as `"days since 1950-01-01 12:00"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TimeUnits {
    /// Days per unit step.
    pub(crate) days_per_unit: f64,
    /// Reference date, as `(year, month, day)`.
    pub(crate) reference: (i32, u8, u8),
    /// Time of day of the reference, as a fraction of a day.
    pub(crate) day_fraction: f64,
}

impl TimeUnits {
    /// Parses a CF `<unit> since <date>[ <time>]` string.
    pub(crate) fn parse(units: &str) -> Result<Self, IoError> {
        let invalid = |reason: String| IoError::InvalidTime { reason };
        let mut parts = units.split_whitespace();
        let (Some(unit), Some("since"), Some(date_part)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid(format!("unexpected time units format: '{units}'")));
        };
        let days_per_unit = match unit.to_lowercase().as_str() {
            "days" | "day" | "d" => 1.0,
            "hours" | "hour" | "h" => 1.0 / 24.0,
            "minutes" | "minute" | "min" => 1.0 / 1_440.0,
            "seconds" | "second" | "s" | "sec" => 1.0 / 86_400.0,
            other => return Err(invalid(format!("unsupported time unit '{other}'"))),
        };

        // ISO forms put the time after a 'T'.
        let (date_str, inline_time) = match date_part.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (date_part, None),
        };
        let reference = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(d) => (d.year(), d.month() as u8, d.day() as u8),
            // Dates such as 02-30 exist only in non-Gregorian calendars.
            Err(_) => {
                let d: Date = date_str
                    .parse()
                    .map_err(|_| invalid(format!("failed to parse reference date '{date_str}'")))?;
                (d.year(), d.month(), d.day())
            }
        };

        let day_fraction = match inline_time.or_else(|| parts.next()) {
            None => 0.0,
            Some(t) => {
                let t = t.trim_end_matches('Z');
                let time = NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                    .map_err(|e| invalid(format!("failed to parse reference time '{t}': {e}")))?;
                f64::from(time.num_seconds_from_midnight()) / 86_400.0
            }
        };

        Ok(Self {
            days_per_unit,
            reference,
            day_fraction,
        })
    }

    /// Converts offsets to dates, flooring each to a whole day.
    pub(crate) fn dates(&self, offsets: &[f64], calendar: Calendar) -> Result<Vec<Date>, IoError> {
        let (y, m, d) = self.reference;
        let origin = calendar.day_number(Date::new(y, m, d, calendar)?);
        offsets
            .iter()
            .map(|&offset| {
                if !offset.is_finite() {
                    return Err(IoError::InvalidTime {
                        reason: format!("time offset {offset} is not finite"),
                    });
                }
                let days = (offset * self.days_per_unit + self.day_fraction).floor() as i64;
                Ok(calendar.date_from_day_number(origin + days))
            })
            .collect()
    }
}

/// Read the time axis of `file`: its dates and calendar.
///
/// A missing `calendar` attribute means `standard`, as in CF.
pub(crate) fn read_time_axis(
    file: &netcdf::File,
    time_var: &str,
    path: &Path,
) -> Result<(Vec<Date>, Calendar), IoError> {
    let var = variable(file, time_var, path)?;
    let units = string_attribute(&var, "units").ok_or_else(|| IoError::InvalidTime {
        reason: format!("time variable '{time_var}' has no 'units' attribute"),
    })?;
    let calendar = match string_attribute(&var, "calendar") {
        Some(name) => Calendar::from_cf_name(&name)?,
        None => Calendar::Standard,
    };
    let offsets = var.get_values::<f64, _>(..)?;
    let dates = TimeUnits::parse(&units)?.dates(&offsets, calendar)?;
    if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
        return Err(IoError::InvalidTime {
            reason: format!(
                "time axis of {} not strictly increasing at {}",
                path.display(),
                dates[i + 1]
            ),
        });
    }
    Ok((dates, calendar))
}

/// Find the index of `level` along the coordinate variable `dim_name`.
pub(crate) fn level_index(
    file: &netcdf::File,
    variable_name: &str,
    dim_name: &str,
    level: f64,
    path: &Path,
) -> Result<usize, IoError> {
    let coords = variable(file, dim_name, path)?.get_values::<f64, _>(..)?;
    let tolerance = 1e-6 * level.abs().max(1.0);
    coords
        .iter()
        .position(|&v| (v - level).abs() <= tolerance)
        .ok_or_else(|| IoError::Level {
            variable: variable_name.to_string(),
            reason: format!("level {level} not found in '{dim_name}' {coords:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_since_date() {
        let u = TimeUnits::parse("days since 2000-01-01").unwrap();
        assert_eq!(u.days_per_unit, 1.0);
        assert_eq!(u.reference, (2000, 1, 1));
        assert_eq!(u.day_fraction, 0.0);
    }

    #[test]
    fn hours_since_datetime() {
        let u = TimeUnits::parse("hours since 1850-01-01 12:00:00").unwrap();
        assert_eq!(u.days_per_unit, 1.0 / 24.0);
        assert_eq!(u.day_fraction, 0.5);
        let u = TimeUnits::parse("seconds since 1970-01-01T06:00:00Z").unwrap();
        assert_eq!(u.day_fraction, 0.25);
    }

    #[test]
    fn rejects_bad_units() {
        assert!(TimeUnits::parse("days after 2000-01-01").is_err());
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("days since yesterday").is_err());
    }

    #[test]
    fn mid_day_offsets_floor_to_their_day() {
        let u = TimeUnits::parse("days since 2001-01-01").unwrap();
        let dates = u.dates(&[0.5, 1.5, 58.5], Calendar::NoLeap).unwrap();
        assert_eq!(dates[0], Date::new(2001, 1, 1, Calendar::NoLeap).unwrap());
        assert_eq!(dates[1], Date::new(2001, 1, 2, Calendar::NoLeap).unwrap());
        assert_eq!(dates[2], Date::new(2001, 2, 28, Calendar::NoLeap).unwrap());
    }

    #[test]
    fn calendar_arithmetic_is_used() {
        let u = TimeUnits::parse("days since 2000-02-28").unwrap();
        let noleap = u.dates(&[1.0], Calendar::NoLeap).unwrap();
        assert_eq!(noleap[0], Date::new(2000, 3, 1, Calendar::NoLeap).unwrap());
        let standard = u.dates(&[1.0], Calendar::Standard).unwrap();
        assert_eq!(standard[0], Date::new(2000, 2, 29, Calendar::Standard).unwrap());
    }

    #[test]
    fn day360_reference_date() {
        let u = TimeUnits::parse("days since 2000-02-30").unwrap();
        let dates = u.dates(&[1.0], Calendar::Day360).unwrap();
        assert_eq!(dates[0], Date::new(2000, 3, 1, Calendar::Day360).unwrap());
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let u = TimeUnits::parse("days since 2000-01-01").unwrap();
        assert!(u.dates(&[f64::NAN], Calendar::Standard).is_err());
    }
}
