//! Date-range derivation for the range report queriers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::time::Clock;

/// Resolved bounds of a range request. `start`/`end` are inclusive ISO
/// dates ready for `date BETWEEN ? AND ?` predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub label: String,
    pub start: String,
    pub end: String,
    pub requested_days: i32,
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// `YYYY-MM` to the month's calendar span. The end bound is the literal
/// `-31`; SQLite compares dates as text, so overflow days simply match
/// nothing.
#[must_use]
pub fn month_span(year_month: &str) -> Option<DateSpan> {
    let (year, month) = year_month.split_once('-')?;
    if year.len() != 4 || month.len() != 2 || !is_digits(year) || !is_digits(month) {
        return None;
    }
    let month_number: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month_number) {
        return None;
    }
    Some(DateSpan {
        label: year_month.to_string(),
        start: format!("{year_month}-01"),
        end: format!("{year_month}-31"),
        requested_days: 0,
    })
}

/// `YYYY-Www` to the ISO week's Monday..Sunday span.
#[must_use]
pub fn iso_week_span(iso_week: &str) -> Option<DateSpan> {
    let (year, week) = iso_week.split_once("-W")?;
    if year.len() != 4 || !is_digits(year) || !is_digits(week) {
        return None;
    }
    let year_number: i32 = year.parse().ok()?;
    let week_number: u32 = week.parse().ok()?;
    let monday = NaiveDate::from_isoywd_opt(year_number, week_number, Weekday::Mon)?;
    let sunday = monday + Duration::days(6);
    Some(DateSpan {
        label: iso_week.to_string(),
        start: monday.format("%Y-%m-%d").to_string(),
        end: sunday.format("%Y-%m-%d").to_string(),
        requested_days: 7,
    })
}

/// `YYYY` to the year's calendar span.
#[must_use]
pub fn year_span(year: &str) -> Option<DateSpan> {
    if year.len() != 4 || !is_digits(year) {
        return None;
    }
    Some(DateSpan {
        label: year.to_string(),
        start: format!("{year}-01-01"),
        end: format!("{year}-12-31"),
        requested_days: 0,
    })
}

/// Last `days` calendar days ending today.
#[must_use]
pub fn period_span(days: i32, clock: &Clock) -> Option<DateSpan> {
    if days <= 0 {
        return None;
    }
    let end = clock.today();
    let start = end - Duration::days(i64::from(days) - 1);
    Some(DateSpan {
        label: format!("{days} days"),
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
        requested_days: days,
    })
}

/// Validated arbitrary range; `start` must not follow `end`.
#[must_use]
pub fn date_range_span(start: &str, end: &str) -> Option<DateSpan> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
    let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?;
    if start_date > end_date {
        return None;
    }
    let requested_days = (end_date - start_date).num_days() + 1;
    Some(DateSpan {
        label: format!("{start} to {end}"),
        start: start.to_string(),
        end: end.to_string(),
        requested_days: requested_days as i32,
    })
}

/// Grouping label for batch exports: the ISO week a date belongs to.
#[must_use]
pub fn iso_week_label(date: &NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn month_span_keeps_the_literal_end_bound() {
        let span = month_span("2025-02").unwrap();
        assert_eq!(span.start, "2025-02-01");
        assert_eq!(span.end, "2025-02-31");
        assert_eq!(span.label, "2025-02");
    }

    #[rstest]
    #[case("2025-13")]
    #[case("2025-00")]
    #[case("202-01")]
    #[case("2025/01")]
    #[case("2025-1")]
    fn month_span_rejects_bad_input(#[case] input: &str) {
        assert_eq!(month_span(input), None);
    }

    #[test]
    fn iso_week_one_contains_the_first_thursday() {
        let span = iso_week_span("2019-W01").unwrap();
        assert_eq!(span.start, "2018-12-31");
        assert_eq!(span.end, "2019-01-06");
        assert_eq!(span.requested_days, 7);
    }

    #[rstest]
    #[case("2019-W54")]
    #[case("2019-01")]
    #[case("19-W01")]
    fn iso_week_rejects_bad_input(#[case] input: &str) {
        assert_eq!(iso_week_span(input), None);
    }

    #[test]
    fn year_span_covers_the_calendar_year() {
        let span = year_span("2024").unwrap();
        assert_eq!(span.start, "2024-01-01");
        assert_eq!(span.end, "2024-12-31");
    }

    #[test]
    fn period_span_counts_back_from_today() {
        let clock = Clock::with_today(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap());
        let span = period_span(7, &clock).unwrap();
        assert_eq!(span.start, "2025-07-04");
        assert_eq!(span.end, "2025-07-10");
        assert_eq!(span.label, "7 days");
    }

    #[test]
    fn period_span_rejects_non_positive_days() {
        let clock = Clock::with_today(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap());
        assert_eq!(period_span(0, &clock), None);
        assert_eq!(period_span(-3, &clock), None);
    }

    #[test]
    fn date_range_requires_start_before_end() {
        let span = date_range_span("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(span.requested_days, 31);
        assert_eq!(span.label, "2025-01-01 to 2025-01-31");

        assert_eq!(date_range_span("2025-02-01", "2025-01-01"), None);
        assert_eq!(date_range_span("2025-02-30", "2025-03-01"), None);
    }

    #[test]
    fn week_label_rolls_into_the_iso_year() {
        let date = NaiveDate::from_ymd_opt(2018, 12, 31).unwrap();
        assert_eq!(iso_week_label(&date), "2019-W01");
    }
}
