//! Range-scope queries: monthly, weekly, yearly, period-N and arbitrary
//! date ranges, plus the two-pass batch fetchers for the export paths.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::domain::dates::{
    date_range_span, iso_week_label, iso_week_span, month_span, period_span, year_span, DateSpan,
};
use crate::domain::reports::{RangeReportData, ReportKind};
use crate::domain::time::Clock;
use crate::storage::schema::{day, time_records};
use crate::storage::ProjectNameCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeRequest {
    Month(String),
    Week(String),
    Year(String),
    Period(i32),
    Dates { start: String, end: String },
}

impl RangeRequest {
    #[must_use]
    pub fn kind(&self) -> ReportKind {
        match self {
            RangeRequest::Month(_) => ReportKind::Monthly,
            RangeRequest::Week(_) => ReportKind::Weekly,
            RangeRequest::Year(_) => ReportKind::Yearly,
            RangeRequest::Period(_) => ReportKind::Period,
            RangeRequest::Dates { .. } => ReportKind::Range,
        }
    }

    fn span(&self, clock: &Clock) -> Option<DateSpan> {
        match self {
            RangeRequest::Month(year_month) => month_span(year_month),
            RangeRequest::Week(iso_week) => iso_week_span(iso_week),
            RangeRequest::Year(year) => year_span(year),
            RangeRequest::Period(days) => period_span(*days, clock),
            RangeRequest::Dates { start, end } => date_range_span(start, end),
        }
    }

    /// Invalid requests still produce a report value; the date-range kind
    /// echoes its bounds in the label so the message names what failed.
    fn mark_invalid(&self, data: &mut RangeReportData) {
        data.is_valid = false;
        if let RangeRequest::Dates { start, end } = self {
            data.range_label = format!("{start} to {end}");
            data.start_date = start.clone();
            data.end_date = end.clone();
        }
    }
}

/// Fetches one range report. Out-of-range inputs yield `is_valid = false`
/// without touching the database; the request itself still succeeds.
pub fn fetch_range_report(
    conn: &Connection,
    request: &RangeRequest,
    cache: &mut ProjectNameCache,
    clock: &Clock,
) -> rusqlite::Result<RangeReportData> {
    let mut data = RangeReportData::default();

    let Some(span) = request.span(clock) else {
        request.mark_invalid(&mut data);
        return Ok(data);
    };

    data.range_label = span.label;
    data.start_date = span.start;
    data.end_date = span.end;
    data.requested_days = span.requested_days;

    fetch_aggregates(conn, &mut data)?;

    if data.total_duration > 0 {
        cache.ensure_loaded(conn)?;
        super::ensure_range_tree(&mut data, cache);
    }
    Ok(data)
}

fn fetch_aggregates(conn: &Connection, data: &mut RangeReportData) -> rusqlite::Result<()> {
    let stats_sql = format!(
        "SELECT {project_id}, SUM({duration}) FROM {table} \
         WHERE {date} >= ?1 AND {date} <= ?2 \
         GROUP BY {project_id} ORDER BY {project_id}",
        project_id = time_records::PROJECT_ID,
        duration = time_records::DURATION,
        table = time_records::TABLE,
        date = time_records::DATE,
    );
    let mut statement = conn.prepare(&stats_sql)?;
    let mut rows = statement.query(params![data.start_date, data.end_date])?;
    while let Some(row) = rows.next()? {
        let project_id: i64 = row.get(0)?;
        let total: i64 = row.get(1)?;
        data.project_stats.push((project_id, total));
        data.total_duration += total;
    }

    let actual_days_sql = format!(
        "SELECT COUNT(DISTINCT {date}) FROM {table} WHERE {date} >= ?1 AND {date} <= ?2",
        date = time_records::DATE,
        table = time_records::TABLE,
    );
    data.actual_days = conn.query_row(
        &actual_days_sql,
        params![data.start_date, data.end_date],
        |row| row.get(0),
    )?;

    let flags_sql = format!(
        "SELECT \
           SUM(CASE WHEN {status} = 1 THEN 1 ELSE 0 END), \
           SUM(CASE WHEN {sleep} = 1 THEN 1 ELSE 0 END), \
           SUM(CASE WHEN {exercise} = 1 THEN 1 ELSE 0 END), \
           SUM(CASE WHEN {cardio} > 0 THEN 1 ELSE 0 END), \
           SUM(CASE WHEN {anaerobic} > 0 THEN 1 ELSE 0 END) \
         FROM {table} WHERE {date} >= ?1 AND {date} <= ?2",
        status = day::STATUS,
        sleep = day::SLEEP,
        exercise = day::EXERCISE,
        cardio = day::CARDIO_TIME,
        anaerobic = day::ANAEROBIC_TIME,
        table = day::TABLE,
        date = day::DATE,
    );
    let flags = conn.query_row(&flags_sql, params![data.start_date, data.end_date], |row| {
        Ok((
            row.get::<_, Option<i64>>(0)?.unwrap_or(0),
            row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        ))
    })?;
    data.status_true_days = flags.0 as i32;
    data.sleep_true_days = flags.1 as i32;
    data.exercise_true_days = flags.2 as i32;
    data.cardio_true_days = flags.3 as i32;
    data.anaerobic_true_days = flags.4 as i32;
    Ok(())
}

/// Grouping key for batch exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchRangeKind {
    Month,
    Week,
    Year,
}

impl BatchRangeKind {
    fn label_of(self, date: &str) -> Option<String> {
        match self {
            BatchRangeKind::Month => (date.len() >= 7).then(|| date[..7].to_string()),
            BatchRangeKind::Year => (date.len() >= 4).then(|| date[..4].to_string()),
            BatchRangeKind::Week => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|parsed| iso_week_label(&parsed)),
        }
    }

    fn span_of(self, label: &str) -> Option<DateSpan> {
        match self {
            BatchRangeKind::Month => month_span(label),
            BatchRangeKind::Year => year_span(label),
            BatchRangeKind::Week => iso_week_span(label),
        }
    }
}

/// All range reports of one grouping, in exactly two SQL passes: one over
/// the day table for flag counts, one over the time records for durations
/// and per-project aggregation.
pub fn fetch_all_ranges(
    conn: &Connection,
    kind: BatchRangeKind,
    cache: &mut ProjectNameCache,
) -> rusqlite::Result<BTreeMap<String, RangeReportData>> {
    cache.ensure_loaded(conn)?;
    let mut groups: BTreeMap<String, RangeReportData> = BTreeMap::new();

    let flags_sql = format!(
        "SELECT {date}, {status}, {sleep}, {exercise}, {cardio}, {anaerobic} \
         FROM {table} ORDER BY {date} ASC",
        date = day::DATE,
        status = day::STATUS,
        sleep = day::SLEEP,
        exercise = day::EXERCISE,
        cardio = day::CARDIO_TIME,
        anaerobic = day::ANAEROBIC_TIME,
        table = day::TABLE,
    );
    let mut statement = conn.prepare(&flags_sql)?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let Some(date) = row.get::<_, Option<String>>(0)? else {
            continue;
        };
        let Some(label) = kind.label_of(&date) else {
            continue;
        };
        let entry = groups.entry(label).or_default();
        entry.status_true_days += i32::from(row.get::<_, Option<i64>>(1)?.unwrap_or(0) == 1);
        entry.sleep_true_days += i32::from(row.get::<_, Option<i64>>(2)?.unwrap_or(0) == 1);
        entry.exercise_true_days += i32::from(row.get::<_, Option<i64>>(3)?.unwrap_or(0) == 1);
        entry.cardio_true_days += i32::from(row.get::<_, Option<i64>>(4)?.unwrap_or(0) > 0);
        entry.anaerobic_true_days += i32::from(row.get::<_, Option<i64>>(5)?.unwrap_or(0) > 0);
    }

    let records_sql = format!(
        "SELECT {date}, {project_id}, SUM({duration}) FROM {table} \
         GROUP BY {date}, {project_id} ORDER BY {date} ASC, {project_id} ASC",
        date = time_records::DATE,
        project_id = time_records::PROJECT_ID,
        duration = time_records::DURATION,
        table = time_records::TABLE,
    );
    let mut statement = conn.prepare(&records_sql)?;
    let mut rows = statement.query([])?;
    let mut aggregation: BTreeMap<String, BTreeMap<i64, i64>> = BTreeMap::new();
    let mut last_date_per_label: BTreeMap<String, String> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let Some(date) = row.get::<_, Option<String>>(0)? else {
            continue;
        };
        let Some(label) = kind.label_of(&date) else {
            continue;
        };
        let project_id: i64 = row.get(1)?;
        let total: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);

        let entry = groups.entry(label.clone()).or_default();
        entry.total_duration += total;
        if last_date_per_label.get(&label) != Some(&date) {
            entry.actual_days += 1;
            last_date_per_label.insert(label.clone(), date);
        }
        *aggregation.entry(label).or_default().entry(project_id).or_insert(0) += total;
    }

    for (label, data) in &mut groups {
        if let Some(span) = kind.span_of(label) {
            data.range_label = span.label;
            data.start_date = span.start;
            data.end_date = span.end;
            data.requested_days = span.requested_days;
        } else {
            data.range_label = label.clone();
        }
        if let Some(per_project) = aggregation.remove(label) {
            data.project_stats = per_project.into_iter().collect();
        }
        super::ensure_range_tree(data, cache);
    }
    Ok(groups)
}

/// All period reports for a list of window lengths, sharing two SQL
/// passes: per-day flag rows and per-day per-project durations.
pub fn fetch_all_periods(
    conn: &Connection,
    days_list: &[i32],
    cache: &mut ProjectNameCache,
    clock: &Clock,
) -> rusqlite::Result<BTreeMap<i32, RangeReportData>> {
    let mut reports = BTreeMap::new();
    if days_list.is_empty() {
        return Ok(reports);
    }
    cache.ensure_loaded(conn)?;

    let flags_sql = format!(
        "SELECT {date}, {status}, {sleep}, {exercise}, {cardio}, {anaerobic} \
         FROM {table} ORDER BY {date} ASC",
        date = day::DATE,
        status = day::STATUS,
        sleep = day::SLEEP,
        exercise = day::EXERCISE,
        cardio = day::CARDIO_TIME,
        anaerobic = day::ANAEROBIC_TIME,
        table = day::TABLE,
    );
    let mut statement = conn.prepare(&flags_sql)?;
    let day_flags: Vec<(String, i64, i64, i64, i64, i64)> = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            ))
        })?
        .collect::<Result<_, _>>()?;

    let records_sql = format!(
        "SELECT {date}, {project_id}, SUM({duration}) FROM {table} \
         GROUP BY {date}, {project_id} ORDER BY {date} ASC, {project_id} ASC",
        date = time_records::DATE,
        project_id = time_records::PROJECT_ID,
        duration = time_records::DURATION,
        table = time_records::TABLE,
    );
    let mut statement = conn.prepare(&records_sql)?;
    let day_records: Vec<(String, i64, i64)> = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                row.get(1)?,
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            ))
        })?
        .collect::<Result<_, _>>()?;

    for &days in days_list {
        let mut data = RangeReportData::default();
        let Some(span) = period_span(days, clock) else {
            data.is_valid = false;
            reports.insert(days, data);
            continue;
        };
        data.range_label = span.label;
        data.start_date = span.start;
        data.end_date = span.end;
        data.requested_days = span.requested_days;

        for (date, status, sleep, exercise, cardio, anaerobic) in &day_flags {
            if date.as_str() < data.start_date.as_str() || date.as_str() > data.end_date.as_str() {
                continue;
            }
            data.status_true_days += i32::from(*status == 1);
            data.sleep_true_days += i32::from(*sleep == 1);
            data.exercise_true_days += i32::from(*exercise == 1);
            data.cardio_true_days += i32::from(*cardio > 0);
            data.anaerobic_true_days += i32::from(*anaerobic > 0);
        }

        let mut per_project: BTreeMap<i64, i64> = BTreeMap::new();
        let mut last_date: Option<&str> = None;
        for (date, project_id, total) in &day_records {
            if date.as_str() < data.start_date.as_str() || date.as_str() > data.end_date.as_str() {
                continue;
            }
            data.total_duration += total;
            if last_date != Some(date.as_str()) {
                data.actual_days += 1;
                last_date = Some(date.as_str());
            }
            *per_project.entry(*project_id).or_insert(0) += total;
        }
        data.project_stats = per_project.into_iter().collect();
        super::ensure_range_tree(&mut data, cache);
        reports.insert(days, data);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::LogParser;
    use crate::storage::store::{create_schema, import_parsed};
    use std::collections::HashMap;

    fn seeded_connection() -> Connection {
        let mut parser = LogParser::new(&HashMap::new());
        parser.parse_content(
            "Date: 2025-06-30\n\
             Status: True\n\
             08:00~10:00study_math\n\
             Date: 2025-07-01\n\
             Status: True\n\
             Sleep: True\n\
             09:00~10:00study_math\n\
             10:00~10:30exercise_cardio_run\n\
             Date: 2025-07-15\n\
             Sleep: True\n\
             20:00~21:00recreation_bilibili\n",
        );
        parser.commit_all();

        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        import_parsed(&mut conn, &parser.days, &parser.records, &parser.parent_child_pairs)
            .unwrap();
        conn
    }

    fn clock() -> Clock {
        Clock::with_today(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap())
    }

    #[test]
    fn monthly_report_counts_flags_and_actual_days() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_range_report(
            &conn,
            &RangeRequest::Month("2025-07".to_string()),
            &mut cache,
            &clock(),
        )
        .unwrap();

        assert!(data.is_valid);
        assert_eq!(data.range_label, "2025-07");
        assert_eq!(data.start_date, "2025-07-01");
        assert_eq!(data.end_date, "2025-07-31");
        assert_eq!(data.actual_days, 2);
        assert_eq!(data.total_duration, 3600 + 1800 + 3600);
        assert_eq!(data.status_true_days, 1);
        assert_eq!(data.sleep_true_days, 2);
        assert_eq!(data.cardio_true_days, 1);
        assert_eq!(data.anaerobic_true_days, 0);
        assert_eq!(data.project_tree["study"].duration, 3600);
    }

    #[test]
    fn invalid_month_sets_the_validity_flag_only() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_range_report(
            &conn,
            &RangeRequest::Month("2025-13".to_string()),
            &mut cache,
            &clock(),
        )
        .unwrap();
        assert!(!data.is_valid);
        assert_eq!(data.total_duration, 0);
    }

    #[test]
    fn empty_week_reports_zero_actual_days() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_range_report(
            &conn,
            &RangeRequest::Week("2019-W01".to_string()),
            &mut cache,
            &clock(),
        )
        .unwrap();
        assert!(data.is_valid);
        assert_eq!(data.actual_days, 0);
        assert_eq!(data.total_duration, 0);
        assert!(data.project_tree.is_empty());
    }

    #[test]
    fn period_window_is_inclusive_of_today() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_range_report(&conn, &RangeRequest::Period(15), &mut cache, &clock())
            .unwrap();
        // 15 days back from 2025-07-15 covers both July dates
        assert_eq!(data.actual_days, 2);
        assert_eq!(data.range_label, "15 days");
    }

    #[test]
    fn date_range_keeps_bounds_when_invalid() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_range_report(
            &conn,
            &RangeRequest::Dates {
                start: "2025-07-31".to_string(),
                end: "2025-07-01".to_string(),
            },
            &mut cache,
            &clock(),
        )
        .unwrap();
        assert!(!data.is_valid);
        assert_eq!(data.range_label, "2025-07-31 to 2025-07-01");
    }

    #[test]
    fn batch_months_match_single_month_queries() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let batch = fetch_all_ranges(&conn, BatchRangeKind::Month, &mut cache).unwrap();

        assert_eq!(batch.len(), 2);
        let single = fetch_range_report(
            &conn,
            &RangeRequest::Month("2025-07".to_string()),
            &mut cache,
            &clock(),
        )
        .unwrap();
        let batched = &batch["2025-07"];
        assert_eq!(batched.total_duration, single.total_duration);
        assert_eq!(batched.actual_days, single.actual_days);
        assert_eq!(batched.sleep_true_days, single.sleep_true_days);
        assert_eq!(batched.project_stats, single.project_stats);
    }

    #[test]
    fn batch_weeks_group_by_iso_week() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let batch = fetch_all_ranges(&conn, BatchRangeKind::Week, &mut cache).unwrap();

        // 2025-06-30 and 2025-07-01 share ISO week 2025-W27
        assert!(batch.contains_key("2025-W27"));
        assert_eq!(batch["2025-W27"].actual_days, 2);
        assert!(batch.contains_key("2025-W29"));
    }

    #[test]
    fn batch_periods_share_the_two_passes() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let batch = fetch_all_periods(&conn, &[7, 30, 0], &mut cache, &clock()).unwrap();

        assert_eq!(batch[&7].actual_days, 1);
        assert_eq!(batch[&30].actual_days, 3);
        assert!(!batch[&0].is_valid);
    }
}
