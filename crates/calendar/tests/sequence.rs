use boreas_calendar::{Calendar, Date, TimeRange, daily_sequence, dates_in_range};

#[test]
fn three_years_standard() {
    let cal = Calendar::Standard;
    let range = TimeRange::new(
        Date::new(1999, 1, 1, cal).unwrap(),
        Date::new(2001, 12, 31, cal).unwrap(),
    )
    .unwrap();
    let dates = dates_in_range(range, cal);
    assert_eq!(dates.len(), 365 + 366 + 365);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(dates.iter().filter(|d| d.is_feb29()).count(), 1);
}

#[test]
fn sequence_matches_range() {
    for cal in [Calendar::NoLeap, Calendar::AllLeap, Calendar::Day360] {
        let start = Date::new(1990, 1, 1, cal).unwrap();
        let dates = daily_sequence(start, 1000, cal);
        let range = TimeRange::new(start, dates[999]).unwrap();
        assert_eq!(dates_in_range(range, cal), dates, "{cal}");
    }
}

#[test]
fn day360_has_thirty_day_months() {
    let cal = Calendar::Day360;
    let start = Date::new(2000, 1, 1, cal).unwrap();
    let dates = daily_sequence(start, 360, cal);
    for month in 1..=12u8 {
        assert_eq!(dates.iter().filter(|d| d.month() == month).count(), 30);
    }
    assert_eq!(dates[359], Date::new(2000, 12, 30, cal).unwrap());
}
