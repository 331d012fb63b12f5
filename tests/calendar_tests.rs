use chrono::{NaiveDate, Weekday};
use project_lines::calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.is_available(d(2025, 1, 6)));
}

#[test]
fn default_calendar_has_no_holidays() {
    let cal = WorkCalendar::default();
    assert!(cal.is_available(d(2025, 1, 1)));
    assert!(cal.to_config().holidays().is_empty());
}

#[test]
fn holidays_are_skipped() {
    let mut cal = WorkCalendar::default();
    cal.add_holiday(d(2025, 1, 7));
    cal.add_holidays(&[d(2025, 1, 8), d(2025, 1, 7)]);
    assert!(!cal.is_available(d(2025, 1, 7)));

    let days = cal.available_days_in_range(d(2025, 1, 6), d(2025, 1, 10));
    assert_eq!(days, vec![d(2025, 1, 6), d(2025, 1, 9), d(2025, 1, 10)]);
}

#[test]
fn available_days_in_range_and_count_match() {
    let cal = WorkCalendar::default();
    let start = d(2025, 1, 3); // Fri
    let end = d(2025, 1, 13); // Mon
    let days = cal.available_days_in_range(start, end);
    assert_eq!(days.len(), cal.count_available_days(start, end));
    assert_eq!(days.len(), 7);
    assert_eq!(days.first().copied(), Some(start));
    assert_eq!(days.last().copied(), Some(end));
}

#[test]
fn reversed_range_is_empty() {
    let cal = WorkCalendar::default();
    assert!(cal.available_days_in_range(d(2025, 1, 10), d(2025, 1, 6)).is_empty());
}

#[test]
fn custom_calendar_includes_saturday() {
    let cal = WorkCalendar::custom(
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ],
        [d(2025, 1, 6)],
    )
    .unwrap();
    assert!(cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(!cal.is_available(d(2025, 1, 6)));
}

#[test]
fn calendar_needs_a_working_day() {
    assert_eq!(
        WorkCalendar::custom([], []).unwrap_err(),
        CalendarError::NoWorkingDays
    );
    let config: WorkCalendarConfig = serde_json::from_str(r#"{"working_days": []}"#).unwrap();
    assert_eq!(
        WorkCalendar::from_config(&config).unwrap_err(),
        CalendarError::NoWorkingDays
    );
}

#[test]
fn config_round_trip_normalises_order() {
    let config = WorkCalendarConfig::new(
        [Weekday::Wed, Weekday::Mon, Weekday::Wed],
        [d(2025, 5, 2), d(2025, 5, 1), d(2025, 5, 2)],
    )
    .unwrap();
    assert_eq!(config.working_days(), &[Weekday::Mon, Weekday::Wed]);
    assert_eq!(config.holidays(), &[d(2025, 5, 1), d(2025, 5, 2)]);

    let cal = WorkCalendar::from_config(&config).unwrap();
    assert_eq!(cal.to_config(), config);
    assert_eq!(WorkCalendarConfig::default().working_days().len(), 5);
}
