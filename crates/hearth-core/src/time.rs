//! Naive calendar helpers built on chrono.
//!
//! Reminders carry no time zone, so everything here works on `NaiveDate`.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::constants::{DATE_FORMAT, TIME_FORMAT, TIME_FORMAT_SECONDS};

/// Parse a `YYYY-MM-DD` date. A trailing time component (`T...`) is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split_once('T').map_or(s, |(d, _)| d);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Parse `HH:MM` or `HH:MM:SS`. Empty input means "no time".
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, TIME_FORMAT_SECONDS))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `HH:MM`, or `HH:MM:SS` when the seconds are set.
pub fn format_time(time: NaiveTime) -> String {
    let format = if time.second() == 0 { TIME_FORMAT } else { TIME_FORMAT_SECONDS };
    time.format(format).to_string()
}

/// Whether two dates fall in the same calendar month of the same year.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map_or(31, |n| (n - first).num_days() as u32)
}

/// Every day of the month containing `date`, in order.
pub fn month_days(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = first_of_month(date);
    (0..days_in_month(date)).map(move |offset| first + Duration::days(offset as i64))
}

/// First and last day of the 7-day calendar week containing `date`.
pub fn week_bounds(date: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let start = date - Duration::days(back as i64);
    (start, start + Duration::days(6))
}

/// Parse an English weekday name or three-letter abbreviation.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_plain_and_timestamp() {
        assert_eq!(parse_date("2024-06-10"), Some(d(2024, 6, 10)));
        assert_eq!(parse_date("2024-06-10T08:30:00Z"), Some(d(2024, 6, 10)));
        assert_eq!(parse_date("10/06/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_time_variants() {
        assert_eq!(parse_time("09:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("21:30:00"), NaiveTime::from_hms_opt(21, 30, 0));
        assert_eq!(parse_time("  "), None);
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_format_time_keeps_seconds() {
        let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert_eq!(format_time(t(8, 30, 0)), "08:30");
        assert_eq!(format_time(t(8, 30, 15)), "08:30:15");
        assert_eq!(parse_time(&format_time(t(8, 30, 15))), Some(t(8, 30, 15)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(d(2024, 2, 10)), 29);
        assert_eq!(days_in_month(d(2023, 2, 1)), 28);
        assert_eq!(days_in_month(d(2024, 4, 30)), 30);
        assert_eq!(days_in_month(d(2024, 12, 31)), 31);
    }

    #[test]
    fn test_month_days_cover_month() {
        let days: Vec<_> = month_days(d(2024, 2, 17)).collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days[0], d(2024, 2, 1));
        assert_eq!(days[28], d(2024, 2, 29));
    }

    #[test]
    fn test_week_bounds_sunday_start() {
        // 2024-06-10 is a Monday
        let (start, end) = week_bounds(d(2024, 6, 10), Weekday::Sun);
        assert_eq!(start, d(2024, 6, 9));
        assert_eq!(end, d(2024, 6, 15));
    }

    #[test]
    fn test_week_bounds_monday_start() {
        let (start, end) = week_bounds(d(2024, 6, 9), Weekday::Mon);
        assert_eq!(start, d(2024, 6, 3));
        assert_eq!(end, d(2024, 6, 9));
    }

    #[test]
    fn test_same_month() {
        assert!(same_month(d(2024, 6, 1), d(2024, 6, 30)));
        assert!(!same_month(d(2024, 6, 1), d(2023, 6, 1)));
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("Mon"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("someday"), None);
    }
}
