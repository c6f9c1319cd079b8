//! Pure conversion functions: TOML run file structs -> crate API types.

use anyhow::{Context, Result, bail};

use crate::config::*;

use boreas_calendar::{Date, TimeRange};
use boreas_engine::{CacheOptions, ComputeRequest, IndexSpec, Transform};
use boreas_indices::{
    Comparison, Extreme, OutputUnit, UserIndex, UserOperation, UserThreshold, VariableRole,
};
use boreas_percentile::{CacheMode, Interpolation};
use boreas_series::{LeapDayPolicy, Season, SliceMode};
use boreas_tile::MemoryBudget;

/// Parses a slice mode: `year`, `month`, a season name or `custom`.
pub fn parse_slice_mode(slice: &str, season_months: Option<&[u8]>) -> Result<SliceMode> {
    match (slice.to_lowercase().as_str(), season_months) {
        ("year", None) => Ok(SliceMode::Year),
        ("month", None) => Ok(SliceMode::Month),
        ("custom", Some(months)) => Ok(SliceMode::Season(Season::custom(months)?)),
        ("custom", None) => bail!("slice = \"custom\" needs season_months"),
        (_, Some(_)) => bail!("season_months is only valid with slice = \"custom\""),
        (name, None) => Ok(SliceMode::Season(name.parse::<Season>()?)),
    }
}

/// Parses a leap-day policy name.
pub fn parse_leap_days(s: &str) -> Result<LeapDayPolicy> {
    match s.to_lowercase().as_str() {
        "keep" => Ok(LeapDayPolicy::Keep),
        "exclude" => Ok(LeapDayPolicy::Exclude),
        other => bail!("unknown leap-day policy: {other:?}"),
    }
}

/// Parses a percentile interpolation name.
pub fn parse_interpolation(s: &str) -> Result<Interpolation> {
    match s.to_lowercase().as_str() {
        "hyndman_fan" | "type8" => Ok(Interpolation::HyndmanFan),
        "linear" | "type7" => Ok(Interpolation::Linear),
        other => bail!("unknown interpolation: {other:?}"),
    }
}

/// Parses an output unit name.
pub fn parse_output_unit(s: &str) -> Result<OutputUnit> {
    match s.to_lowercase().as_str() {
        "days" => Ok(OutputUnit::Days),
        "percent" | "%" => Ok(OutputUnit::Percent),
        other => bail!("unknown output unit: {other:?}"),
    }
}

/// Parses a percentile cache mode name.
pub fn parse_cache_mode(s: &str) -> Result<CacheMode> {
    match s.to_lowercase().as_str() {
        "out_of_base" => Ok(CacheMode::OutOfBase),
        "all" => Ok(CacheMode::All),
        other => bail!("unknown cache mode: {other:?}"),
    }
}

/// Parses a `YYYY-MM-DD` range.
pub fn parse_range(range: &RangeToml) -> Result<TimeRange> {
    let start: Date = range
        .start
        .parse()
        .with_context(|| format!("invalid start date {:?}", range.start))?;
    let end: Date = range
        .end
        .parse()
        .with_context(|| format!("invalid end date {:?}", range.end))?;
    Ok(TimeRange::new(start, end)?)
}

/// Builds a [`MemoryBudget`] from the TOML memory settings.
pub fn build_memory(memory: &MemoryToml) -> Result<MemoryBudget> {
    match (memory.bytes, memory.transfer_limit_mb) {
        (None, None) => Ok(MemoryBudget::Unlimited),
        (Some(b), None) => Ok(MemoryBudget::Bytes(b)),
        (None, Some(mb)) => Ok(MemoryBudget::TransferLimitMb(mb)),
        (Some(_), Some(_)) => bail!("[memory] accepts bytes or transfer_limit_mb, not both"),
    }
}

/// Builds a user [`IndexSpec`] from its TOML record.
pub fn build_user_index(user: &UserIndexToml) -> Result<IndexSpec> {
    let role = match user.role.to_lowercase().as_str() {
        "temperature" => VariableRole::Temperature,
        "precipitation" => VariableRole::Precipitation,
        other => bail!("unknown variable role: {other:?}"),
    };
    let extreme = match user.extreme.to_lowercase().as_str() {
        "min" => Extreme::Min,
        "max" => Extreme::Max,
        other => bail!("unknown extreme: {other:?}"),
    };
    let window = || {
        user.window
            .with_context(|| format!("operation {:?} needs a window", user.operation))
    };
    let operation = match user.operation.to_lowercase().as_str() {
        "min" => UserOperation::Min,
        "max" => UserOperation::Max,
        "mean" => UserOperation::Mean,
        "sum" => UserOperation::Sum,
        "event_count" => UserOperation::EventCount,
        "max_consecutive_events" => UserOperation::MaxConsecutiveEvents,
        "run_mean" => UserOperation::RunMean {
            window: window()?,
            extreme,
        },
        "run_sum" => UserOperation::RunSum {
            window: window()?,
            extreme,
        },
        other => bail!("unknown user operation: {other:?}"),
    };

    let mut index = UserIndex::new(role, operation).with_date_of_event(user.date_of_event);
    if let Some(ref c) = user.comparison {
        index = index.with_comparison(c.parse::<Comparison>()?);
    }
    match (user.threshold, user.percentile) {
        (Some(_), Some(_)) => bail!("user index accepts threshold or percentile, not both"),
        (Some(t), None) => index = index.with_threshold(UserThreshold::Fixed(t)),
        (None, Some(p)) => index = index.with_threshold(UserThreshold::Percentile(p)),
        (None, None) => {}
    }
    index.validate()?;
    Ok(IndexSpec::User {
        name: user.name.clone(),
        index,
    })
}

/// Picks the built-in or the user index of the run file.
pub fn build_index_spec(config: &BoreasConfig) -> Result<IndexSpec> {
    match (&config.index, &config.user_index) {
        (Some(name), None) => Ok(IndexSpec::Builtin(name.clone())),
        (None, Some(user)) => build_user_index(user),
        (Some(_), Some(_)) => bail!("set either index or [user_index], not both"),
        (None, None) => bail!("no index: set index or [user_index] in config"),
    }
}

/// Builds a [`ComputeRequest`] from the whole run file.
pub fn build_request(config: &BoreasConfig) -> Result<ComputeRequest> {
    let index = build_index_spec(config)?;
    let period = &config.period;
    let percentile = &config.percentile;
    let time_range = period.time_range.as_ref().map(parse_range).transpose()?;
    let base_period = percentile
        .base_period
        .as_ref()
        .map(parse_range)
        .transpose()?;
    let cache = CacheOptions {
        load: config.cache.load.clone(),
        save: config.cache.save.clone(),
        mode: parse_cache_mode(&config.cache.mode)?,
    };

    let mut request = ComputeRequest::new(index)
        .with_variables(config.variables.iter().map(|v| v.name.clone()).collect())
        .with_sources(config.variables.iter().map(|v| v.sources.clone()).collect())
        .with_slice_mode(parse_slice_mode(&period.slice, period.season_months.as_deref())?)
        .with_time_range(time_range)
        .with_base_period(base_period)
        .with_window(percentile.window)
        .with_leap_days(parse_leap_days(&period.leap_days)?)
        .with_interpolation(parse_interpolation(&percentile.interpolation)?)
        .with_leap_years_only(percentile.leap_years_only)
        .with_thresholds(config.thresholds.clone())
        .with_memory(build_memory(&config.memory)?)
        .with_output_unit(parse_output_unit(&config.output.unit)?)
        .with_date_of_event(config.output.date_of_event)
        .with_cache(cache);
    for var in &config.variables {
        if let Some(level) = var.level {
            request = request.with_level(&var.name, level);
        }
        if let Some(ref t) = var.transform {
            let mut transform = Transform::new(t.scale, t.offset);
            if let Some(ref units) = t.units {
                transform = transform.with_units(units);
            }
            request = request.with_transform(&var.name, transform);
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX90P: &str = r#"
        index = "TX90p"
        thresholds = []

        [[variables]]
        name = "tasmax"
        sources = ["tasmax_1981.nc", "tasmax_1991.nc"]
        transform = { offset = -273.15, units = "degC" }

        [period]
        slice = "DJF"
        time_range = { start = "1981-01-01", end = "2000-12-31" }

        [percentile]
        base_period = { start = "1981-01-01", end = "1990-12-31" }
        interpolation = "linear"

        [output]
        path = "tx90p.json"
        unit = "percent"

        [memory]
        transfer_limit_mb = 64.0
    "#;

    fn parse(s: &str) -> BoreasConfig {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn full_run_file_converts() {
        let config = parse(TX90P);
        let request = build_request(&config).unwrap();
        assert_eq!(request.index(), &IndexSpec::Builtin("TX90p".to_string()));
        assert_eq!(request.sources()[0].len(), 2);
        assert_eq!(request.slice_mode(), &SliceMode::Season(Season::djf()));
        assert_eq!(request.interpolation(), Interpolation::Linear);
        assert_eq!(request.output_unit(), OutputUnit::Percent);
        assert_eq!(request.memory(), MemoryBudget::TransferLimitMb(64.0));
        assert_eq!(request.base_period().unwrap().years(), 1981..=1990);
        let t = request.transform("tasmax").unwrap();
        assert_eq!((t.scale, t.offset), (1.0, -273.15));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn defaults_apply() {
        let config = parse(
            r#"
            index = "SU"
            [[variables]]
            name = "tasmax"
            sources = ["a.nc"]
            "#,
        );
        let request = build_request(&config).unwrap();
        assert_eq!(request.slice_mode(), &SliceMode::Year);
        assert_eq!(request.window(), 5);
        assert_eq!(request.memory(), MemoryBudget::Unlimited);
        assert!(request.cache().is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<BoreasConfig, _> = toml::from_str("index = \"SU\"\nwindows = 3");
        assert!(result.is_err());
    }

    #[test]
    fn custom_season_needs_months() {
        let months = [11, 12, 1];
        let mode = parse_slice_mode("custom", Some(&months)).unwrap();
        assert_eq!(mode, SliceMode::Season(Season::custom(&months).unwrap()));
        assert!(parse_slice_mode("custom", None).is_err());
        assert!(parse_slice_mode("year", Some(&months)).is_err());
        assert!(parse_slice_mode("monsoon", None).is_err());
    }

    #[test]
    fn user_index_record() {
        let config = parse(
            r#"
            [user_index]
            name = "hot_days"
            role = "temperature"
            operation = "event_count"
            comparison = ">"
            percentile = 95.0
            "#,
        );
        let IndexSpec::User { name, index } = build_index_spec(&config).unwrap() else {
            panic!("expected a user index");
        };
        assert_eq!(name, "hot_days");
        assert_eq!(index.threshold(), Some(UserThreshold::Percentile(95.0)));
    }

    #[test]
    fn running_user_index_needs_window() {
        let mut user = UserIndexToml {
            name: "wettest_week".to_string(),
            role: "precipitation".to_string(),
            operation: "run_sum".to_string(),
            window: None,
            extreme: "max".to_string(),
            comparison: None,
            threshold: None,
            percentile: None,
            date_of_event: false,
        };
        assert!(build_user_index(&user).is_err());
        user.window = Some(7);
        assert!(build_user_index(&user).is_ok());
    }

    #[test]
    fn index_must_be_given_once() {
        assert!(build_index_spec(&parse("")).is_err());
        let both = parse(
            r#"
            index = "SU"
            [user_index]
            name = "x"
            role = "temperature"
            operation = "max"
            "#,
        );
        assert!(build_index_spec(&both).is_err());
    }

    #[test]
    fn memory_forms() {
        let both = MemoryToml {
            bytes: Some(1),
            transfer_limit_mb: Some(1.0),
        };
        assert!(build_memory(&both).is_err());
        let bytes = MemoryToml {
            bytes: Some(4096),
            transfer_limit_mb: None,
        };
        assert_eq!(build_memory(&bytes).unwrap(), MemoryBudget::Bytes(4096));
    }

    #[test]
    fn invalid_dates_are_reported() {
        let range = RangeToml {
            start: "1990-13-01".to_string(),
            end: "2000-12-31".to_string(),
        };
        let err = parse_range(&range).unwrap_err();
        assert!(format!("{err:#}").contains("1990-13-01"));
    }
}
