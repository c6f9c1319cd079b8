//! Catalog evaluation through the registry.

use approx::assert_relative_eq;
use boreas_calendar::{Calendar, Date, daily_sequence};
use boreas_indices::{
    EvalOptions, EventDates, IndexError, IndexRegistry, OutputUnit, VariableThreshold,
};
use boreas_percentile::{DoyThreshold, PercentileConfig, WetDayThreshold, doy_threshold};
use boreas_series::{SliceMode, TemporalSlicer, TimeSeries};
use ndarray::{Array2, Array3};

const FILL: f64 = 1e20;

fn series(values: Array3<f64>, start_year: i32) -> TimeSeries {
    let cal = Calendar::NoLeap;
    let n = values.dim().0;
    let dates = daily_sequence(Date::new(start_year, 1, 1, cal).unwrap(), n, cal);
    TimeSeries::new(dates, values, FILL, cal, "K").unwrap()
}

/// One year of `tasmax` rising linearly from 270 K to 306.4 K.
fn warming_year() -> TimeSeries {
    let values = Array3::from_shape_fn((365, 2, 2), |(t, _, _)| 270.0 + 0.1 * t as f64);
    series(values, 2001)
}

#[test]
fn summer_days_with_default_and_fixed_threshold() {
    let s = warming_year();
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&s);
    let view = slices[0].view(&s);
    let su = IndexRegistry::builtin().get("SU").unwrap().clone();

    // 270 + 0.1 t > 298.15 from t = 282 on.
    let out = su.evaluate(&[view.clone()], &[], &EvalOptions::default()).unwrap();
    assert!(out.values.iter().all(|&v| v == 83.0));

    let options = EvalOptions {
        fixed_threshold: Some(300.05),
        ..EvalOptions::default()
    };
    let out = su.evaluate(&[view], &[], &options).unwrap();
    assert!(out.values.iter().all(|&v| v == 64.0));
}

#[test]
fn all_fill_cells_stay_fill() {
    let mut values = Array3::from_elem((365, 2, 2), 280.0);
    for t in 0..365 {
        values[[t, 1, 1]] = FILL;
    }
    let s = series(values, 2001);
    let slices = TemporalSlicer::new(SliceMode::Month).slice(&s);
    let registry = IndexRegistry::builtin();
    for name in ["TX", "TXx", "SU", "CSU", "GD4"] {
        let def = registry.get(name).unwrap();
        for slice in &slices {
            let out = def.evaluate(&[slice.view(&s)], &[], &EvalOptions::default()).unwrap();
            assert_eq!(out.values[[1, 1]], FILL, "{name}");
            assert_ne!(out.values[[0, 0]], FILL, "{name}");
        }
    }
}

#[test]
fn extreme_date_of_event() {
    let s = warming_year();
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&s);
    let txx = IndexRegistry::builtin().get("TXx").unwrap().clone();
    let options = EvalOptions {
        date_of_event: true,
        ..EvalOptions::default()
    };
    let out = txx.evaluate(&[slices[0].view(&s)], &[], &options).unwrap();
    assert_relative_eq!(out.values[[0, 0]], 270.0 + 36.4, epsilon = 1e-9);
    let Some(EventDates::Extreme(at)) = out.events else {
        panic!("expected an extreme date");
    };
    let last = Date::new(2001, 12, 31, Calendar::NoLeap).unwrap();
    assert_eq!(at[[1, 0]], Calendar::NoLeap.day_number(last) as f64);
}

#[test]
fn exceedance_against_doy_threshold() {
    let s = warming_year();
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&s);
    let tx90p = IndexRegistry::builtin().get("TX90p").unwrap().clone();

    let below = DoyThreshold::from_parts(
        Array3::from_elem((365, 2, 2), 280.05),
        Calendar::NoLeap,
        FILL,
    )
    .unwrap();
    let view = slices[0].view(&s);
    let days = tx90p
        .evaluate(&[view.clone()], &[VariableThreshold::DayOfYear(&below)], &EvalOptions::default())
        .unwrap();
    // 270 + 0.1 t > 280.05 from t = 101 on.
    assert!(days.values.iter().all(|&v| v == 264.0));

    let percent = EvalOptions {
        output_unit: OutputUnit::Percent,
        ..EvalOptions::default()
    };
    let share = tx90p
        .evaluate(&[view], &[VariableThreshold::DayOfYear(&below)], &percent)
        .unwrap();
    assert_relative_eq!(share.values[[0, 1]], 100.0 * 264.0 / 365.0, epsilon = 1e-9);
}

#[test]
fn constant_series_never_exceeds_its_own_percentile() {
    let base = series(Array3::from_elem((365 * 3, 1, 2), 285.0), 1981);
    let threshold = doy_threshold(&base, &PercentileConfig::new(90.0));
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&base);
    let tx90p = IndexRegistry::builtin().get("TX90p").unwrap().clone();
    for slice in &slices {
        let out = tx90p
            .evaluate(
                &[slice.view(&base)],
                &[VariableThreshold::DayOfYear(&threshold)],
                &EvalOptions::default(),
            )
            .unwrap();
        assert!(out.values.iter().all(|&v| v == 0.0));
    }
}

#[test]
fn wet_day_threshold_family() {
    let values = Array3::from_shape_fn((365, 1, 1), |(t, _, _)| (t % 10) as f64);
    let s = series(values, 2001);
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&s);
    let threshold = WetDayThreshold::from_parts(Array2::from_elem((1, 1), 7.0), FILL);
    let registry = IndexRegistry::builtin();

    let r95 = registry.get("R95p").unwrap();
    let out = r95
        .evaluate(&[slices[0].view(&s)], &[VariableThreshold::WetDay(&threshold)], &EvalOptions::default())
        .unwrap();
    // Values 8 and 9 of each of the 36 full ten-day blocks.
    assert_eq!(out.values[[0, 0]], 72.0);

    let wrong = DoyThreshold::filled(1, 1, Calendar::NoLeap, FILL);
    let err = r95
        .evaluate(&[slices[0].view(&s)], &[VariableThreshold::DayOfYear(&wrong)], &EvalOptions::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::MissingThreshold { position: 0, .. }));
}

#[test]
fn configuration_errors() {
    let s = warming_year();
    let slices = TemporalSlicer::new(SliceMode::Year).slice(&s);
    let view = slices[0].view(&s);
    let registry = IndexRegistry::builtin();

    let err = registry
        .get("DTR")
        .unwrap()
        .evaluate(&[view.clone()], &[], &EvalOptions::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::WrongVariableCount { expected: 2, got: 1, .. }));

    let fixed = EvalOptions {
        fixed_threshold: Some(1.0),
        ..EvalOptions::default()
    };
    let err = registry.get("TG").unwrap().evaluate(&[view.clone()], &[], &fixed).unwrap_err();
    assert!(matches!(err, IndexError::ThresholdNotSupported { .. }));

    let err = registry
        .get("TX10p")
        .unwrap()
        .evaluate(&[view], &[], &EvalOptions::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::MissingThreshold { .. }));
}

#[test]
fn diurnal_range_over_two_variables() {
    let tasmax = series(Array3::from_elem((365, 2, 3), 290.0), 2001);
    let tasmin = series(Array3::from_elem((365, 2, 3), 280.0), 2001);
    let slicer = TemporalSlicer::new(SliceMode::Month);
    let a = slicer.slice(&tasmax);
    let b = slicer.slice(&tasmin);
    assert_eq!(a.len(), 12);
    let dtr = IndexRegistry::builtin().get("DTR").unwrap().clone();
    let out = dtr
        .evaluate(&[a[0].view(&tasmax), b[0].view(&tasmin)], &[], &EvalOptions::default())
        .unwrap();
    assert_eq!(out.dim(), (2, 3));
    assert!(out.values.iter().all(|&v| v == 10.0));
}
