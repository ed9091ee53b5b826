//! Day-scope queries: one report per date, plus the two-pass batch
//! fetcher used by the all-daily export.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::reports::{DailyReportData, DayMetadata, TimeRecord};
use crate::storage::schema::{day, project_paths_cte, time_records};
use crate::storage::ProjectNameCache;

/// Fetches everything a daily report needs for `date`.
pub fn fetch_daily_report(
    conn: &Connection,
    date: &str,
    cache: &mut ProjectNameCache,
) -> rusqlite::Result<DailyReportData> {
    let mut data = DailyReportData {
        date: date.to_string(),
        ..DailyReportData::default()
    };

    fetch_project_stats(conn, date, &mut data)?;
    fetch_metadata(conn, date, &mut data)?;

    if data.total_duration > 0 {
        fetch_detailed_records(conn, date, &mut data)?;
        fetch_generated_stats(conn, date, &mut data)?;
        cache.ensure_loaded(conn)?;
        super::ensure_daily_tree(&mut data, cache);
    }
    Ok(data)
}

/// Flat per-project aggregation; the database does the grouping so no
/// per-record work happens host-side.
fn fetch_project_stats(
    conn: &Connection,
    date: &str,
    data: &mut DailyReportData,
) -> rusqlite::Result<()> {
    let sql = format!(
        "SELECT {project_id}, SUM({duration}) FROM {table} \
         WHERE {date_col} = ?1 GROUP BY {project_id} ORDER BY {project_id}",
        project_id = time_records::PROJECT_ID,
        duration = time_records::DURATION,
        table = time_records::TABLE,
        date_col = time_records::DATE,
    );
    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query(params![date])?;
    while let Some(row) = rows.next()? {
        let project_id: i64 = row.get(0)?;
        let total: i64 = row.get(1)?;
        data.project_stats.push((project_id, total));
        data.total_duration += total;
    }
    Ok(())
}

fn fetch_metadata(conn: &Connection, date: &str, data: &mut DailyReportData) -> rusqlite::Result<()> {
    let sql = format!(
        "SELECT {}, {}, {}, {}, {} FROM {} WHERE {} = ?1",
        day::STATUS,
        day::SLEEP,
        day::REMARK,
        day::GETUP_TIME,
        day::EXERCISE,
        day::TABLE,
        day::DATE,
    );
    let metadata = conn
        .query_row(&sql, params![date], |row| {
            Ok(DayMetadata {
                status: row.get::<_, i64>(0)?.to_string(),
                sleep: row.get::<_, i64>(1)?.to_string(),
                remark: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                getup_time: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                exercise: row.get::<_, i64>(4)?.to_string(),
            })
        })
        .optional()?;
    if let Some(metadata) = metadata {
        data.metadata = metadata;
    }
    Ok(())
}

/// Row-level records with their full project paths, in parser insertion
/// order.
fn fetch_detailed_records(
    conn: &Connection,
    date: &str,
    data: &mut DailyReportData,
) -> rusqlite::Result<()> {
    let sql = format!(
        "{cte} \
         SELECT tr.{start}, tr.{end}, pp.{path}, tr.{duration}, tr.{remark} \
         FROM {table} tr \
         JOIN {paths} pp ON tr.{project_id} = pp.id \
         WHERE tr.{date_col} = ?1 \
         ORDER BY tr.{logical_id} ASC",
        cte = project_paths_cte(),
        start = time_records::START,
        end = time_records::END,
        path = crate::storage::schema::projects::cte::PATH,
        duration = time_records::DURATION,
        remark = time_records::ACTIVITY_REMARK,
        table = time_records::TABLE,
        paths = crate::storage::schema::projects::cte::PROJECT_PATHS,
        project_id = time_records::PROJECT_ID,
        date_col = time_records::DATE,
        logical_id = time_records::LOGICAL_ID,
    );
    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query(params![date])?;
    while let Some(row) = rows.next()? {
        data.detailed_records.push(TimeRecord {
            start_time: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            end_time: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            project_path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            duration_seconds: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            activity_remark: row.get::<_, Option<String>>(4)?,
        });
    }
    Ok(())
}

fn fetch_generated_stats(
    conn: &Connection,
    date: &str,
    data: &mut DailyReportData,
) -> rusqlite::Result<()> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        day::STAT_COLUMNS.join(", "),
        day::TABLE,
        day::DATE,
    );
    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query(params![date])?;
    if let Some(row) = rows.next()? {
        for (index, column) in day::STAT_COLUMNS.iter().enumerate() {
            let value: i64 = row.get::<_, Option<i64>>(index)?.unwrap_or(0);
            data.stats.insert((*column).to_string(), value);
        }
    }
    Ok(())
}

/// Everything the all-daily export needs, fetched in exactly two SQL
/// passes.
#[derive(Debug, Default)]
pub struct BatchDailyData {
    /// `(date, year, month)` in ascending date order.
    pub date_order: Vec<(String, i64, i64)>,
    pub data_map: BTreeMap<String, DailyReportData>,
}

pub fn fetch_all_daily(
    conn: &Connection,
    cache: &mut ProjectNameCache,
) -> rusqlite::Result<BatchDailyData> {
    cache.ensure_loaded(conn)?;

    let mut batch = BatchDailyData::default();
    fetch_days_metadata(conn, &mut batch)?;
    fetch_time_records(conn, cache, &mut batch)?;
    Ok(batch)
}

fn fetch_days_metadata(conn: &Connection, batch: &mut BatchDailyData) -> rusqlite::Result<()> {
    let sql = format!(
        "SELECT {date}, {year}, {month}, {status}, {sleep}, {remark}, {getup}, {exercise}, {stats} \
         FROM {table} ORDER BY {date} ASC",
        date = day::DATE,
        year = day::YEAR,
        month = day::MONTH,
        status = day::STATUS,
        sleep = day::SLEEP,
        remark = day::REMARK,
        getup = day::GETUP_TIME,
        exercise = day::EXERCISE,
        stats = day::STAT_COLUMNS.join(", "),
        table = day::TABLE,
    );
    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let Some(date) = row.get::<_, Option<String>>(0)? else {
            continue;
        };
        let year: i64 = row.get::<_, Option<i64>>(1)?.unwrap_or(0);
        let month: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);
        batch.date_order.push((date.clone(), year, month));

        let mut data = DailyReportData {
            date: date.clone(),
            metadata: DayMetadata {
                status: row.get::<_, i64>(3)?.to_string(),
                sleep: row.get::<_, i64>(4)?.to_string(),
                remark: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                getup_time: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                exercise: row.get::<_, i64>(7)?.to_string(),
            },
            ..DailyReportData::default()
        };
        for (index, column) in day::STAT_COLUMNS.iter().enumerate() {
            let value: i64 = row.get::<_, Option<i64>>(8 + index)?.unwrap_or(0);
            data.stats.insert((*column).to_string(), value);
        }
        batch.data_map.insert(date, data);
    }
    Ok(())
}

fn fetch_time_records(
    conn: &Connection,
    cache: &ProjectNameCache,
    batch: &mut BatchDailyData,
) -> rusqlite::Result<()> {
    let sql = format!(
        "SELECT {date}, {start}, {end}, {project_id}, {duration}, {remark} \
         FROM {table} ORDER BY {date} ASC, {logical_id} ASC",
        date = time_records::DATE,
        start = time_records::START,
        end = time_records::END,
        project_id = time_records::PROJECT_ID,
        duration = time_records::DURATION,
        remark = time_records::ACTIVITY_REMARK,
        table = time_records::TABLE,
        logical_id = time_records::LOGICAL_ID,
    );
    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query([])?;

    let mut aggregation: BTreeMap<String, BTreeMap<i64, i64>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let Some(date) = row.get::<_, Option<String>>(0)? else {
            continue;
        };
        let Some(data) = batch.data_map.get_mut(&date) else {
            continue;
        };

        let project_id: i64 = row.get(3)?;
        let duration: i64 = row.get::<_, Option<i64>>(4)?.unwrap_or(0);
        data.detailed_records.push(TimeRecord {
            start_time: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            end_time: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            project_path: cache.joined_path(project_id),
            duration_seconds: duration,
            activity_remark: row.get::<_, Option<String>>(5)?,
        });
        data.total_duration += duration;
        *aggregation.entry(date).or_default().entry(project_id).or_insert(0) += duration;
    }

    for (date, per_project) in aggregation {
        if let Some(data) = batch.data_map.get_mut(&date) {
            data.project_stats = per_project.into_iter().collect();
        }
    }
    Ok(())
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
            "Date: 2025-01-01\n\
             Status: True\n\
             Getup: 06:00\n\
             23:30~00:15sleep_night\n\
             Date: 2025-01-02\n\
             08:00~09:00study_math\n\
             09:00~09:30study_english\n",
        );
        parser.commit_all();

        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        import_parsed(&mut conn, &parser.days, &parser.records, &parser.parent_child_pairs)
            .unwrap();
        conn
    }

    #[test]
    fn daily_report_with_midnight_wrap() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_daily_report(&conn, "2025-01-01", &mut cache).unwrap();

        assert_eq!(data.total_duration, 2700);
        assert_eq!(data.metadata.status, "1");
        assert_eq!(data.metadata.getup_time, "06:00");
        assert_eq!(data.detailed_records.len(), 1);
        assert_eq!(data.detailed_records[0].project_path, "sleep_night");

        let sleep = &data.project_tree["sleep"];
        assert_eq!(sleep.duration, 2700);
        assert_eq!(sleep.children["night"].duration, 2700);
        assert_eq!(data.stats["sleep_total_time"], 2700);
    }

    #[test]
    fn empty_day_skips_detail_queries() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let data = fetch_daily_report(&conn, "2025-03-03", &mut cache).unwrap();

        assert_eq!(data.total_duration, 0);
        assert!(data.detailed_records.is_empty());
        assert!(data.project_tree.is_empty());
    }

    #[test]
    fn batch_fetch_matches_single_day_fetch() {
        let conn = seeded_connection();
        let mut cache = ProjectNameCache::new();
        let batch = fetch_all_daily(&conn, &mut cache).unwrap();

        assert_eq!(batch.date_order.len(), 2);
        assert_eq!(batch.date_order[0].0, "2025-01-01");

        let single = fetch_daily_report(&conn, "2025-01-02", &mut cache).unwrap();
        let batched = &batch.data_map["2025-01-02"];
        assert_eq!(batched.total_duration, single.total_duration);
        assert_eq!(batched.detailed_records.len(), single.detailed_records.len());
        assert_eq!(batched.project_stats, single.project_stats);
        assert_eq!(
            batched.detailed_records[0].project_path,
            single.detailed_records[0].project_path
        );
    }
}
