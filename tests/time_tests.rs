use chrono::{TimeZone, Utc};
use ghcontrib::util::time::{since_date, window_start};

#[test]
fn test_seven_day_window() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
    assert_eq!(since_date(now, 7), "2024-03-08");
}

#[test]
fn test_zero_days_is_today() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
    assert_eq!(since_date(now, 0), "2024-03-15");
}

#[test]
fn test_window_crosses_month_boundary() {
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
    assert_eq!(since_date(now, 3), "2024-02-28");
}

#[test]
fn test_window_crosses_leap_day() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    assert_eq!(since_date(now, 1), "2024-02-29");
}

#[test]
fn test_window_crosses_year_boundary() {
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 59).unwrap();
    assert_eq!(since_date(now, 30), "2023-12-06");
}

#[test]
fn test_window_start_keeps_time_of_day() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
    let start = window_start(now, 2);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 13, 12, 30, 0).unwrap());
}
