//! Filter-driven queries behind the data-query CLI surface.
//!
//! Clauses are emitted in a fixed order and parameters are pushed in the
//! same order, so clause order always mirrors bind order.

use rusqlite::types::Value;
use rusqlite::Connection;

use crate::storage::schema::{day, project_paths_cte, projects, sql_alias, time_records};
use crate::storage::store::query_string_column;

#[derive(Debug, Default, Clone)]
pub struct QueryFilters {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub day_remark: Option<String>,
    pub project: Option<String>,
    pub remark: Option<String>,
    pub exercise: Option<i64>,
    pub status: Option<i64>,
    pub overnight: bool,
    pub limit: Option<i64>,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDurationRow {
    pub date: String,
    pub total_seconds: i64,
}

/// `LIKE` pattern matching `text` anywhere, with the wildcards escaped so
/// user input stays literal. Pairs with `ESCAPE '\'`.
fn build_like_contains(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for character in text.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped.push('%');
    escaped
}

fn build_where_clauses(filters: &QueryFilters, params: &mut Vec<Value>) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(year) = filters.year {
        clauses.push(format!("d.{} = ?", day::YEAR));
        params.push(Value::Integer(year));
    }
    if let Some(month) = filters.month {
        clauses.push(format!("d.{} = ?", day::MONTH));
        params.push(Value::Integer(month));
    }
    if let Some(from_date) = &filters.from_date {
        clauses.push(format!("d.{} >= ?", day::DATE));
        params.push(Value::Text(from_date.clone()));
    }
    if let Some(to_date) = &filters.to_date {
        clauses.push(format!("d.{} <= ?", day::DATE));
        params.push(Value::Text(to_date.clone()));
    }
    if let Some(day_remark) = &filters.day_remark {
        clauses.push(format!("d.{} LIKE ?", day::REMARK));
        params.push(Value::Text(format!("%{day_remark}%")));
    }
    if let Some(project) = &filters.project {
        clauses.push(format!(
            "pp.{} LIKE ? ESCAPE '\\'",
            projects::cte::PATH
        ));
        params.push(Value::Text(build_like_contains(project)));
    }
    if let Some(remark) = &filters.remark {
        clauses.push(format!("tr.{} LIKE ?", time_records::ACTIVITY_REMARK));
        params.push(Value::Text(format!("%{remark}%")));
    }
    if let Some(exercise) = filters.exercise {
        clauses.push(format!("d.{} = ?", day::EXERCISE));
        params.push(Value::Integer(exercise));
    }
    if let Some(status) = filters.status {
        clauses.push(format!("d.{} = ?", day::STATUS));
        params.push(Value::Integer(status));
    }
    if filters.overnight {
        clauses.push(format!(
            "(d.{getup} IS NULL OR d.{getup} = '' OR d.{getup} = '00:00')",
            getup = day::GETUP_TIME
        ));
    }
    clauses
}

fn append_where(sql: &mut String, clauses: &[String]) {
    if let Some((first, rest)) = clauses.split_first() {
        sql.push_str(" WHERE ");
        sql.push_str(first);
        for clause in rest {
            sql.push_str(" AND ");
            sql.push_str(clause);
        }
    }
}

/// Day-table join including the project-path CTE only when a project
/// filter needs it.
fn build_dates_base(with_project: bool) -> String {
    if with_project {
        format!(
            "{cte} SELECT DISTINCT d.{date} FROM {days} d \
             JOIN {records} tr ON tr.{record_date} = d.{date} \
             JOIN {paths} pp ON tr.{project_id} = pp.{id}",
            cte = project_paths_cte(),
            date = day::DATE,
            days = day::TABLE,
            records = time_records::TABLE,
            record_date = time_records::DATE,
            paths = projects::cte::PROJECT_PATHS,
            project_id = time_records::PROJECT_ID,
            id = projects::ID,
        )
    } else {
        format!(
            "SELECT DISTINCT d.{date} FROM {days} d \
             JOIN {records} tr ON tr.{record_date} = d.{date}",
            date = day::DATE,
            days = day::TABLE,
            records = time_records::TABLE,
            record_date = time_records::DATE,
        )
    }
}

pub fn query_years(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {year} FROM {table} ORDER BY {year}",
        year = day::YEAR,
        table = day::TABLE
    );
    query_string_column(conn, &sql, &[])
}

pub fn query_months(conn: &Connection, year: Option<i64>) -> rusqlite::Result<Vec<String>> {
    let mut sql = format!(
        "SELECT DISTINCT {year}, {month} FROM {table}",
        year = day::YEAR,
        month = day::MONTH,
        table = day::TABLE
    );
    let mut params = Vec::new();
    if let Some(year) = year {
        sql.push_str(&format!(" WHERE {} = ?", day::YEAR));
        params.push(Value::Integer(year));
    }
    sql.push_str(&format!(" ORDER BY {}, {}", day::YEAR, day::MONTH));

    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query(rusqlite::params_from_iter(params.iter()))?;
    let mut formatted = Vec::new();
    while let Some(row) = rows.next()? {
        let year: i64 = row.get(0)?;
        let month: i64 = row.get(1)?;
        formatted.push(format!("{year:04}-{month:02}"));
    }
    Ok(formatted)
}

pub fn query_days(
    conn: &Connection,
    year: Option<i64>,
    month: Option<i64>,
    from_date: Option<&str>,
    to_date: Option<&str>,
    reverse: bool,
    limit: Option<i64>,
) -> rusqlite::Result<Vec<String>> {
    let mut sql = format!("SELECT {} FROM {}", day::DATE, day::TABLE);
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(year) = year {
        clauses.push(format!("{} = ?", day::YEAR));
        params.push(Value::Integer(year));
    }
    if let Some(month) = month {
        clauses.push(format!("{} = ?", day::MONTH));
        params.push(Value::Integer(month));
    }
    if let Some(from_date) = from_date {
        clauses.push(format!("{} >= ?", day::DATE));
        params.push(Value::Text(from_date.to_string()));
    }
    if let Some(to_date) = to_date {
        clauses.push(format!("{} <= ?", day::DATE));
        params.push(Value::Text(to_date.to_string()));
    }
    if let Some((first, rest)) = clauses.split_first() {
        sql.push_str(" WHERE ");
        sql.push_str(first);
        for clause in rest {
            sql.push_str(" AND ");
            sql.push_str(clause);
        }
    }
    sql.push_str(&format!(
        " ORDER BY {} {}",
        day::DATE,
        if reverse { "DESC" } else { "ASC" }
    ));
    if let Some(limit) = limit.filter(|&limit| limit > 0) {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit));
    }
    query_string_column(conn, &sql, &params)
}

/// Dates matching the full filter set, for the `search` action.
pub fn query_dates_by_filters(
    conn: &Connection,
    filters: &QueryFilters,
) -> rusqlite::Result<Vec<String>> {
    let needs_records_join = filters.project.is_some() || filters.remark.is_some();
    let mut sql = if needs_records_join {
        build_dates_base(filters.project.is_some())
    } else {
        format!("SELECT DISTINCT d.{} FROM {} d", day::DATE, day::TABLE)
    };

    let mut params = Vec::new();
    let clauses = build_where_clauses(filters, &mut params);
    append_where(&mut sql, &clauses);

    sql.push_str(&format!(
        " ORDER BY d.{} {}",
        day::DATE,
        if filters.reverse { "DESC" } else { "ASC" }
    ));
    if let Some(limit) = filters.limit.filter(|&limit| limit > 0) {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit));
    }
    query_string_column(conn, &sql, &params)
}

/// `(date, SUM(duration))` rows ordered by total duration.
pub fn query_day_durations(
    conn: &Connection,
    filters: &QueryFilters,
) -> rusqlite::Result<Vec<DayDurationRow>> {
    let select = format!(
        "SELECT d.{date}, SUM(tr.{duration}) AS {alias} \
         FROM {days} d JOIN {records} tr ON tr.{record_date} = d.{date}",
        date = day::DATE,
        duration = time_records::DURATION,
        alias = sql_alias::TOTAL_DURATION,
        days = day::TABLE,
        records = time_records::TABLE,
        record_date = time_records::DATE,
    );
    let mut sql = if filters.project.is_some() {
        format!(
            "{cte} {select} JOIN {paths} pp ON tr.{project_id} = pp.{id}",
            cte = project_paths_cte(),
            select = select,
            paths = projects::cte::PROJECT_PATHS,
            project_id = time_records::PROJECT_ID,
            id = projects::ID,
        )
    } else {
        select
    };

    let mut params = Vec::new();
    let clauses = build_where_clauses(filters, &mut params);
    append_where(&mut sql, &clauses);

    sql.push_str(&format!(
        " GROUP BY d.{} ORDER BY {} {}",
        day::DATE,
        sql_alias::TOTAL_DURATION,
        if filters.reverse { "DESC" } else { "ASC" }
    ));
    if let Some(limit) = filters.limit.filter(|&limit| limit > 0) {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit));
    }

    let mut statement = conn.prepare(&sql)?;
    let mut rows = statement.query(rusqlite::params_from_iter(params.iter()))?;
    let mut durations = Vec::new();
    while let Some(row) = rows.next()? {
        durations.push(DayDurationRow {
            date: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            total_seconds: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
        });
    }
    Ok(durations)
}
