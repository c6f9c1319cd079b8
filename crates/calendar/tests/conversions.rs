use boreas_calendar::{Calendar, CalendarError, Date, Doy};

const ALL: [Calendar; 5] = [
    Calendar::Standard,
    Calendar::ProlepticGregorian,
    Calendar::NoLeap,
    Calendar::AllLeap,
    Calendar::Day360,
];

#[test]
fn doy_roundtrip_every_position() {
    for cal in ALL {
        for doy in Doy::all(cal) {
            let (m, d) = doy.month_day(cal);
            let back = Doy::from_month_day(m, d, cal).unwrap();
            assert_eq!(back, doy, "roundtrip failed for {cal} doy {}", doy.get());
        }
    }
}

#[test]
fn leap_and_common_years_share_positions_after_february() {
    let cal = Calendar::Standard;
    for year in [1999, 2000, 2001, 2004] {
        let mar1 = Date::new(year, 3, 1, cal).unwrap();
        assert_eq!(mar1.reference_doy(cal).get(), 61, "year {year}");
        let dec31 = Date::new(year, 12, 31, cal).unwrap();
        assert_eq!(dec31.reference_doy(cal).get(), 366, "year {year}");
    }
}

#[test]
fn noleap_positions_are_ordinal_days() {
    let cal = Calendar::NoLeap;
    let cases: &[(u8, u8, u16)] = &[(1, 1, 1), (2, 28, 59), (3, 1, 60), (7, 4, 185), (12, 31, 365)];
    for &(month, day, expected) in cases {
        let date = Date::new(2001, month, day, cal).unwrap();
        assert_eq!(
            date.reference_doy(cal).get(),
            expected,
            "noleap {month}-{day}"
        );
    }
}

#[test]
fn feb_29_rejected_without_leap_days() {
    assert_eq!(
        Date::new(2000, 2, 29, Calendar::NoLeap).unwrap_err(),
        CalendarError::InvalidDay {
            day: 29,
            month: 2,
            max_day: 28,
        }
    );
    assert!(Date::new(2001, 2, 29, Calendar::AllLeap).is_ok());
}

#[test]
fn day_numbers_count_calendar_days() {
    for cal in ALL {
        let start = Date::new(2000, 1, 1, cal).unwrap();
        let end = Date::new(2001, 1, 1, cal).unwrap();
        assert_eq!(
            cal.day_number(end) - cal.day_number(start),
            i64::from(cal.days_in_year(2000)),
            "{cal}"
        );
    }
}

#[test]
fn cf_names_parse_case_insensitively() {
    assert_eq!("GREGORIAN".parse::<Calendar>().unwrap(), Calendar::Standard);
    assert_eq!(
        Calendar::from_cf_name("365_day").unwrap(),
        Calendar::NoLeap
    );
    assert!(matches!(
        Calendar::from_cf_name("julian"),
        Err(CalendarError::UnknownCalendar { .. })
    ));
}
