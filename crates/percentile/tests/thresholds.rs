use approx::assert_relative_eq;
use boreas_calendar::{Calendar, Date, Doy, TimeRange, daily_sequence};
use boreas_percentile::{
    CacheMode, CacheParameters, CachedThreshold, DoyPools, Interpolation, PercentileCache,
    PercentileConfig, doy_threshold, doy_threshold_with, percentile_of_sorted,
};
use boreas_series::TimeSeries;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FILL: f64 = 1e20;

fn random_base(calendar: Calendar, years: usize, seed: u64) -> TimeSeries {
    let start = Date::new(1981, 1, 1, calendar).unwrap();
    let n: usize = (0..years)
        .map(|y| calendar.days_in_year(1981 + y as i32) as usize)
        .sum();
    let dates = daily_sequence(start, n, calendar);
    let mut rng = StdRng::seed_from_u64(seed);
    let values = Array3::from_shape_simple_fn((n, 2, 3), || rng.random_range(250.0..310.0));
    TimeSeries::new(dates, values, FILL, calendar, "K").unwrap()
}

#[test]
fn constant_series_gives_constant_threshold() {
    for cal in [Calendar::Standard, Calendar::NoLeap, Calendar::Day360] {
        let start = Date::new(1981, 1, 1, cal).unwrap();
        let dates = daily_sequence(start, 4 * 365, cal);
        let n = dates.len();
        let base = TimeSeries::new(dates, Array3::from_elem((n, 3, 2), 12.5), FILL, cal, "").unwrap();
        for method in [Interpolation::Linear, Interpolation::HyndmanFan] {
            let config = PercentileConfig::new(50.0)
                .with_window(1)
                .with_interpolation(method);
            let t = doy_threshold(&base, &config);
            assert!(
                t.values().iter().all(|&v| v == 12.5),
                "{cal} {method:?} not constant"
            );
        }
    }
}

#[test]
fn threshold_matches_brute_force_pool() {
    let cal = Calendar::Standard;
    let base = random_base(cal, 5, 11);
    let config = PercentileConfig::new(90.0).with_window(5);
    let t = doy_threshold(&base, &config);

    let doy = Doy::from_month_day(7, 15, cal).unwrap();
    let mut pool = Vec::new();
    for (row, date) in base.dates().iter().enumerate() {
        let anchor = Date::new(date.year(), 7, 15, cal).unwrap();
        let dist = (cal.day_number(*date) - cal.day_number(anchor)).abs();
        if dist <= 2 {
            pool.push(base.values()[[row, 1, 2]]);
        }
    }
    assert_eq!(pool.len(), 25);
    pool.sort_by(f64::total_cmp);
    let expected = percentile_of_sorted(&pool, 90.0, Interpolation::HyndmanFan).unwrap();
    assert_relative_eq!(t.at_doy(doy)[[1, 2]], expected);
}

#[test]
fn fill_values_leave_the_pool() {
    let cal = Calendar::NoLeap;
    let dates = daily_sequence(Date::new(2001, 1, 1, cal).unwrap(), 730, cal);
    let mut values = Array3::from_elem((730, 1, 1), 5.0);
    values[[9, 0, 0]] = FILL;
    values[[374, 0, 0]] = f64::NAN;
    let base = TimeSeries::new(dates, values, FILL, cal, "").unwrap();
    let t = doy_threshold(&base, &PercentileConfig::new(50.0).with_window(1));
    // Day 10 is missing in both years.
    assert_eq!(t.at_doy(Doy::new(10, cal).unwrap())[[0, 0]], FILL);
    assert_eq!(t.at_doy(Doy::new(11, cal).unwrap())[[0, 0]], 5.0);
}

#[test]
fn wet_day_floor_filters_pool() {
    let cal = Calendar::NoLeap;
    let dates = daily_sequence(Date::new(2001, 1, 1, cal).unwrap(), 365, cal);
    let values = Array3::from_shape_fn((365, 1, 1), |(t, _, _)| if t % 2 == 0 { 0.0 } else { 10.0 });
    let base = TimeSeries::new(dates, values, FILL, cal, "mm/day").unwrap();
    let config = PercentileConfig::new(25.0)
        .with_window(5)
        .with_wet_day_floor(Some(1.0));
    let t = doy_threshold(&base, &config);
    assert!(t.values().iter().all(|&v| v == 10.0));
}

#[test]
fn shared_pools_reproduce_direct_estimate() {
    let cal = Calendar::Standard;
    let base = random_base(cal, 4, 3);
    let config = PercentileConfig::new(10.0)
        .with_window(7)
        .with_interpolation(Interpolation::Linear);
    let pools = DoyPools::new(base.dates(), cal, &config);
    let substituted = base.with_year_substituted(1982, 1984).unwrap();
    let direct = doy_threshold(&substituted, &config);
    let shared = doy_threshold_with(&substituted, &pools, &config).unwrap();
    assert_eq!(direct, shared);
}

#[test]
fn cache_survives_disk() {
    let cal = Calendar::NoLeap;
    let base = random_base(cal, 2, 5);
    let config = PercentileConfig::new(90.0);
    let params = CacheParameters {
        base_period: TimeRange::new(base.dates()[0], base.dates()[base.n_steps() - 1]).unwrap(),
        window: config.window(),
        interpolation: config.interpolation(),
        leap_years_only: false,
        exclude_leap_days: false,
        calendar: cal,
        grid: base.grid_shape(),
    };
    let mut cache = PercentileCache::new(params.clone(), CacheMode::OutOfBase);
    let threshold = doy_threshold(&base, &config);
    cache.variable_mut("tasmax", 90.0).out_of_base = Some(CachedThreshold::DayOfYear(threshold.clone()));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pct.json");
    cache.save(&path).unwrap();
    let loaded = PercentileCache::load(&path).unwrap();
    loaded.check(&params).unwrap();
    let entry = loaded.variable("tasmax", 90.0).unwrap().unwrap();
    match &entry.out_of_base {
        Some(CachedThreshold::DayOfYear(t)) => {
            for (a, b) in t.values().iter().zip(threshold.values().iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-15);
            }
        }
        other => panic!("unexpected cache entry {other:?}"),
    }
}
