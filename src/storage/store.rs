//! Connection opening, schema creation and the transactional ingest
//! writer.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::parsing::{DayRecord, IntervalRecord, ParentChildSet};
use crate::storage::schema::{day, projects, time_records};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub days: usize,
    pub records: usize,
    pub projects: usize,
}

pub fn open_database(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS days ( \
            date TEXT PRIMARY KEY, \
            year INTEGER, \
            month INTEGER, \
            status INTEGER, \
            sleep INTEGER, \
            remark TEXT, \
            getup_time TEXT, \
            exercise INTEGER, \
            sleep_total_time INTEGER, \
            total_exercise_time INTEGER, \
            anaerobic_time INTEGER, \
            cardio_time INTEGER, \
            grooming_time INTEGER, \
            study_time INTEGER, \
            recreation_time INTEGER, \
            recreation_zhihu_time INTEGER, \
            recreation_bilibili_time INTEGER, \
            recreation_douyin_time INTEGER \
        ); \
        CREATE TABLE IF NOT EXISTS projects ( \
            id INTEGER PRIMARY KEY, \
            name TEXT, \
            parent_id INTEGER, \
            UNIQUE(name, parent_id) \
        ); \
        CREATE TABLE IF NOT EXISTS time_records ( \
            logical_id INTEGER PRIMARY KEY, \
            date TEXT, \
            start TEXT, \
            end TEXT, \
            project_id INTEGER, \
            duration INTEGER, \
            activity_remark TEXT \
        ); \
        CREATE INDEX IF NOT EXISTS idx_time_records_date ON time_records(date); \
        CREATE INDEX IF NOT EXISTS idx_time_records_project ON time_records(project_id);",
    )
}

fn flag_to_int(value: &str) -> i64 {
    matches!(value.trim(), "1" | "true" | "True") as i64
}

fn year_month_of(date: &str) -> (i64, i64) {
    let mut parts = date.split('-');
    let year = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let month = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (year, month)
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(&format!("{prefix}_"))
}

/// Resolves a project path to its row id, inserting missing ancestors
/// first. The explicit parent map (from the parser's pair set) wins over
/// splitting on the last underscore, which is how configured top-level
/// roots enter the hierarchy.
fn ensure_project(
    tx: &Transaction<'_>,
    path: &str,
    parent_of: &HashMap<String, String>,
    path_ids: &mut HashMap<String, i64>,
) -> rusqlite::Result<i64> {
    if let Some(&id) = path_ids.get(path) {
        return Ok(id);
    }

    let parent_path = parent_of
        .get(path)
        .cloned()
        .or_else(|| path.rsplit_once('_').map(|(parent, _)| parent.to_string()));

    let parent_id = match &parent_path {
        Some(parent) => Some(ensure_project(tx, parent, parent_of, path_ids)?),
        None => None,
    };

    let name = match &parent_path {
        Some(parent) => path
            .strip_prefix(&format!("{parent}_"))
            .unwrap_or(path)
            .to_string(),
        None => path.to_string(),
    };

    // UNIQUE(name, parent_id) does not block NULL-parent duplicates, so
    // look the row up first.
    let select = format!(
        "SELECT {} FROM {} WHERE {} = ?1 AND {} IS ?2",
        projects::ID,
        projects::TABLE,
        projects::NAME,
        projects::PARENT_ID
    );
    let existing: Option<i64> = tx
        .query_row(&select, params![name, parent_id], |row| row.get(0))
        .optional()?;
    let id = match existing {
        Some(id) => id,
        None => {
            let insert = format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
                projects::TABLE,
                projects::NAME,
                projects::PARENT_ID
            );
            tx.execute(&insert, params![name, parent_id])?;
            tx.last_insert_rowid()
        }
    };
    path_ids.insert(path.to_string(), id);
    Ok(id)
}

/// Commits one parse run inside a single transaction. Days are replaced
/// wholesale (metadata, derived stat columns and time records), so
/// re-ingesting a corrected log is idempotent.
pub fn import_parsed(
    conn: &mut Connection,
    days: &[DayRecord],
    records: &[IntervalRecord],
    pairs: &ParentChildSet,
) -> rusqlite::Result<ImportSummary> {
    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();

    let parent_of: HashMap<String, String> = pairs
        .iter()
        .map(|(child, parent)| (child.clone(), parent.clone()))
        .collect();

    let mut path_ids = HashMap::new();
    for (child, parent) in pairs {
        ensure_project(&tx, parent, &parent_of, &mut path_ids)?;
        ensure_project(&tx, child, &parent_of, &mut path_ids)?;
    }

    let mut records_by_date: HashMap<&str, Vec<&IntervalRecord>> = HashMap::new();
    for record in records {
        records_by_date
            .entry(record.date.as_str())
            .or_default()
            .push(record);
    }

    let insert_day = format!(
        "INSERT OR REPLACE INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, {})",
        day::TABLE,
        day::DATE,
        day::YEAR,
        day::MONTH,
        day::STATUS,
        day::SLEEP,
        day::REMARK,
        day::GETUP_TIME,
        day::EXERCISE,
        day::STAT_COLUMNS.join(", "),
        (9..9 + day::STAT_COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let delete_day_records = format!(
        "DELETE FROM {} WHERE {} = ?1",
        time_records::TABLE,
        time_records::DATE
    );
    let insert_record = format!(
        "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
        time_records::TABLE,
        time_records::DATE,
        time_records::START,
        time_records::END,
        time_records::PROJECT_ID,
        time_records::DURATION
    );

    for day_record in days {
        let day_intervals = records_by_date
            .get(day_record.date.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let (year, month) = year_month_of(&day_record.date);
        let mut values: Vec<Value> = vec![
            Value::Text(day_record.date.clone()),
            Value::Integer(year),
            Value::Integer(month),
            Value::Integer(flag_to_int(&day_record.status)),
            Value::Integer(flag_to_int(&day_record.sleep)),
            Value::Text(day_record.remark.clone()),
            Value::Text(day_record.getup_time.clone()),
            Value::Integer(flag_to_int(&day_record.exercise)),
        ];
        for (_, prefix) in day::STAT_COLUMN_PREFIXES {
            let total: i64 = day_intervals
                .iter()
                .filter(|record| matches_prefix(&record.project_path, prefix))
                .map(|record| record.duration_seconds)
                .sum();
            values.push(Value::Integer(total));
        }
        tx.execute(&insert_day, rusqlite::params_from_iter(values))?;
        summary.days += 1;

        tx.execute(&delete_day_records, params![day_record.date])?;
        for record in day_intervals {
            let project_id = ensure_project(&tx, &record.project_path, &parent_of, &mut path_ids)?;
            tx.execute(
                &insert_record,
                params![
                    record.date,
                    record.start_time,
                    record.end_time,
                    project_id,
                    record.duration_seconds
                ],
            )?;
            summary.records += 1;
        }
    }

    summary.projects = path_ids.len();
    tx.commit()?;
    Ok(summary)
}

/// Runs a query returning its first column as strings. NULL cells become
/// empty strings.
pub fn query_string_column(
    conn: &Connection,
    sql: &str,
    parameters: &[Value],
) -> rusqlite::Result<Vec<String>> {
    use rusqlite::types::ValueRef;

    let mut statement = conn.prepare(sql)?;
    let mut rows = statement.query(rusqlite::params_from_iter(parameters.iter()))?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let value = match row.get_ref(0)? {
            ValueRef::Null => String::new(),
            ValueRef::Integer(value) => value.to_string(),
            ValueRef::Real(value) => value.to_string(),
            ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
            ValueRef::Blob(_) => String::new(),
        };
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::LogParser;
    use std::collections::HashMap as StdHashMap;

    fn import_log(content: &str) -> Connection {
        import_log_with_mapping(content, &StdHashMap::new())
    }

    fn import_log_with_mapping(
        content: &str,
        mapping: &StdHashMap<String, String>,
    ) -> Connection {
        let mut parser = LogParser::new(mapping);
        parser.parse_content(content);
        parser.commit_all();

        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        import_parsed(&mut conn, &parser.days, &parser.records, &parser.parent_child_pairs)
            .unwrap();
        conn
    }

    #[test]
    fn imports_days_records_and_projects() {
        let conn = import_log(
            "Date: 2024-10-31\n\
             Status: True\n\
             Getup: 07:30\n\
             09:00~10:00study_math\n\
             10:00~10:15rest\n",
        );

        let day_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM days", [], |row| row.get(0))
            .unwrap();
        assert_eq!(day_count, 1);

        let (year, month, status): (i64, i64, i64) = conn
            .query_row(
                "SELECT year, month, status FROM days WHERE date = '2024-10-31'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((year, month, status), (2024, 10, 1));

        let total: i64 = conn
            .query_row("SELECT SUM(duration) FROM time_records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 4500);

        // study, math (child of study), rest
        let project_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .unwrap();
        assert_eq!(project_count, 3);
    }

    #[test]
    fn cte_reconstructs_underscore_paths() {
        let conn = import_log("Date: 2024-10-31\n09:00~10:00study_english_words\n");

        let sql = format!(
            "{} SELECT pp.path FROM time_records tr \
             JOIN project_paths pp ON tr.project_id = pp.id",
            crate::storage::schema::project_paths_cte()
        );
        let path: String = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
        assert_eq!(path, "study_english_words");
    }

    #[test]
    fn derived_stat_columns_sum_by_prefix() {
        let conn = import_log(
            "Date: 2024-10-31\n\
             08:00~09:00study_math\n\
             09:00~09:30exercise_cardio_run\n\
             09:30~09:45exercise_anaerobic\n\
             22:00~23:00sleep_night\n",
        );

        let (study, cardio, anaerobic, exercise, sleep): (i64, i64, i64, i64, i64) = conn
            .query_row(
                "SELECT study_time, cardio_time, anaerobic_time, total_exercise_time, \
                 sleep_total_time FROM days WHERE date = '2024-10-31'",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!(study, 3600);
        assert_eq!(cardio, 1800);
        assert_eq!(anaerobic, 900);
        assert_eq!(exercise, 2700);
        assert_eq!(sleep, 3600);
    }

    #[test]
    fn reingest_replaces_the_day() {
        let log = "Date: 2024-10-31\n09:00~10:00study\n";
        let mut parser = LogParser::new(&StdHashMap::new());
        parser.parse_content(log);
        parser.commit_all();

        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        import_parsed(&mut conn, &parser.days, &parser.records, &parser.parent_child_pairs)
            .unwrap();
        import_parsed(&mut conn, &parser.days, &parser.records, &parser.parent_child_pairs)
            .unwrap();

        let record_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM time_records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(record_count, 1);
    }

    #[test]
    fn configured_roots_become_parents() {
        let mapping = StdHashMap::from([("study".to_string(), "STUDY".to_string())]);
        let conn = import_log_with_mapping("Date: 2024-10-31\n09:00~10:00study_math\n", &mapping);

        let parent_name: String = conn
            .query_row(
                "SELECT parent.name FROM projects child \
                 JOIN projects parent ON child.parent_id = parent.id \
                 WHERE child.name = 'study'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(parent_name, "STUDY");
    }

    #[test]
    fn logical_id_preserves_insertion_order() {
        let conn = import_log(
            "Date: 2024-10-31\n\
             10:00~11:00beta\n\
             08:00~09:00alpha\n",
        );

        let mut statement = conn
            .prepare("SELECT start FROM time_records ORDER BY logical_id ASC")
            .unwrap();
        let starts: Vec<String> = statement
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(starts, vec!["10:00", "08:00"]);
    }
}
