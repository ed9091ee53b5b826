//! The data-query actions: list rendering and statistics output.

use rusqlite::Connection;

use super::QueryAction;
use crate::domain::time::format_duration;
use crate::query::filters::{
    query_dates_by_filters, query_day_durations, query_days, query_months, query_years,
    DayDurationRow,
};
use crate::query::stats::{compute_day_duration_stats, DayDurationStats};

pub fn execute(conn: &Connection, action: &QueryAction) -> anyhow::Result<()> {
    match action {
        QueryAction::Years => print!("{}", render_list(&query_years(conn)?)),
        QueryAction::Months { year } => print!("{}", render_list(&query_months(conn, *year)?)),
        QueryAction::Days {
            year,
            month,
            from,
            to,
            reverse,
            limit,
        } => {
            let days = query_days(
                conn,
                *year,
                *month,
                from.as_deref(),
                to.as_deref(),
                *reverse,
                *limit,
            )?;
            print!("{}", render_list(&days));
        }
        QueryAction::DaysDuration(filters) => {
            let rows = query_day_durations(conn, &filters.to_filters())?;
            print!("{}", render_day_durations(&rows));
        }
        QueryAction::DaysStats { top, filters } => {
            // stats always run over the full ascending vector
            let mut stats_filters = filters.to_filters();
            stats_filters.limit = None;
            stats_filters.reverse = false;
            let rows = query_day_durations(conn, &stats_filters)?;
            print!("{}", render_day_duration_stats(&compute_day_duration_stats(&rows)));
            if let Some(top) = top {
                print!("{}", render_top_day_durations(&rows, *top));
            }
        }
        QueryAction::Search(filters) => {
            let dates = query_dates_by_filters(conn, &filters.to_filters())?;
            print!("{}", render_list(&dates));
        }
    }
    Ok(())
}

#[must_use]
pub fn render_list(items: &[String]) -> String {
    let mut output = String::new();
    for item in items {
        output.push_str(item);
        output.push('\n');
    }
    output.push_str(&format!("Total: {}\n", items.len()));
    output
}

#[must_use]
pub fn render_day_durations(rows: &[DayDurationRow]) -> String {
    let mut output = String::new();
    for row in rows {
        output.push_str(&format!("{} {}\n", row.date, format_duration(row.total_seconds)));
    }
    output.push_str(&format!("Total: {}\n", rows.len()));
    output
}

fn format_duration_seconds(seconds: f64) -> String {
    if seconds <= 0.0 {
        return format_duration(0);
    }
    format_duration(seconds.round() as i64)
}

#[must_use]
pub fn render_day_duration_stats(stats: &DayDurationStats) -> String {
    const SECONDS_PER_HOUR: f64 = 3600.0;
    let mut output = String::new();
    output.push_str(&format!("Days: {}\n", stats.count));
    output.push_str(&format!("Average: {}\n", format_duration_seconds(stats.mean_seconds)));
    output.push_str(&format!("Median: {}\n", format_duration_seconds(stats.median_seconds)));
    output.push_str(&format!("P25: {}\n", format_duration_seconds(stats.p25_seconds)));
    output.push_str(&format!("P75: {}\n", format_duration_seconds(stats.p75_seconds)));
    output.push_str(&format!("P90: {}\n", format_duration_seconds(stats.p90_seconds)));
    output.push_str(&format!("P95: {}\n", format_duration_seconds(stats.p95_seconds)));
    output.push_str(&format!("Min: {}\n", format_duration_seconds(stats.min_seconds)));
    output.push_str(&format!("Max: {}\n", format_duration_seconds(stats.max_seconds)));
    output.push_str(&format!("IQR: {}\n", format_duration_seconds(stats.iqr_seconds)));
    output.push_str(&format!("MAD: {}\n", format_duration_seconds(stats.mad_seconds)));

    let variance_hours = stats.variance_seconds / (SECONDS_PER_HOUR * SECONDS_PER_HOUR);
    let stddev_hours = stats.stddev_seconds / SECONDS_PER_HOUR;
    output.push_str(&format!("Variance (h^2): {variance_hours:.2}\n"));
    output.push_str(&format!(
        "Std Dev: {stddev_hours:.2}h ({})\n",
        format_duration_seconds(stats.stddev_seconds)
    ));

    output.push_str("\nNotes:\n");
    output.push_str("- Median: middle value after sorting daily durations.\n");
    output.push_str("- P25/P75/P90/P95: nearest-rank percentiles.\n");
    output.push_str("- IQR: P75 - P25, robust spread measure.\n");
    output.push_str("- MAD: median(|x - median|), robust dispersion.\n");
    output
}

/// One ascending-sorted vector serves both ends: the head is the shortest
/// days, the tail (reversed) the longest.
#[must_use]
pub fn render_top_day_durations(rows: &[DayDurationRow], top_n: usize) -> String {
    if top_n == 0 || rows.is_empty() {
        return String::new();
    }
    let count = top_n.min(rows.len());

    let mut output = String::new();
    output.push_str(&format!("\nTop {count} longest:\n"));
    for row in rows.iter().rev().take(count) {
        output.push_str(&format!("{} {}\n", row.date, format_duration(row.total_seconds)));
    }
    output.push_str(&format!("\nTop {count} shortest:\n"));
    for row in rows.iter().take(count) {
        output.push_str(&format!("{} {}\n", row.date, format_duration(row.total_seconds)));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(durations: &[(&str, i64)]) -> Vec<DayDurationRow> {
        durations
            .iter()
            .map(|(date, total_seconds)| DayDurationRow {
                date: (*date).to_string(),
                total_seconds: *total_seconds,
            })
            .collect()
    }

    #[test]
    fn list_output_ends_with_the_count() {
        let output = render_list(&["2024".to_string(), "2025".to_string()]);
        assert_eq!(output, "2024\n2025\nTotal: 2\n");
        assert_eq!(render_list(&[]), "Total: 0\n");
    }

    #[test]
    fn duration_rows_render_with_duration_text() {
        let output = render_day_durations(&rows(&[("2025-01-01", 3600), ("2025-01-02", 5400)]));
        assert_eq!(output, "2025-01-01 1h 0m\n2025-01-02 1h 30m\nTotal: 2\n");
    }

    #[test]
    fn empty_stats_render_all_zero() {
        let output = render_day_duration_stats(&DayDurationStats::default());
        assert!(output.starts_with("Days: 0\n"));
        assert!(output.contains("Average: 0h 0m\n"));
        assert!(output.contains("Variance (h^2): 0.00\n"));
        assert!(output.contains("Std Dev: 0.00h (0h 0m)\n"));
        assert!(output.contains("\nNotes:\n"));
    }

    #[test]
    fn top_lists_use_both_ends_of_the_sorted_vector() {
        let sorted = rows(&[
            ("2025-01-01", 3600),
            ("2025-01-02", 7200),
            ("2025-01-03", 7200),
            ("2025-01-04", 18_000),
            ("2025-01-05", 21_600),
            ("2025-01-06", 25_200),
        ]);
        let output = render_top_day_durations(&sorted, 3);

        let longest_section = output.split("Top 3 shortest:").next().unwrap();
        assert!(longest_section.contains("2025-01-06 7h 0m"));
        assert!(longest_section.contains("2025-01-05 6h 0m"));
        assert!(longest_section.contains("2025-01-04 5h 0m"));

        let shortest_section = output.split("Top 3 shortest:").nth(1).unwrap();
        assert!(shortest_section.contains("2025-01-01 1h 0m"));
        assert!(shortest_section.contains("2025-01-02 2h 0m"));
        assert!(shortest_section.contains("2025-01-03 2h 0m"));
    }

    #[test]
    fn top_zero_prints_nothing() {
        assert_eq!(render_top_day_durations(&rows(&[("2025-01-01", 60)]), 0), "");
    }
}
