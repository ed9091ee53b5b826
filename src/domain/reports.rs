//! Value types carried from the query layer to the formatters.

use std::collections::BTreeMap;

use super::tree::ProjectTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Daily,
    Monthly,
    Weekly,
    Yearly,
    Period,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Markdown,
    LaTeX,
    Typst,
}

impl ReportFormat {
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "latex" | "tex" => Some(ReportFormat::LaTeX),
            "typst" | "typ" => Some(ReportFormat::Typst),
            _ => None,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::LaTeX => "tex",
            ReportFormat::Typst => "typ",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayMetadata {
    pub status: String,
    pub sleep: String,
    pub remark: String,
    pub getup_time: String,
    pub exercise: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRecord {
    pub start_time: String,
    pub end_time: String,
    pub project_path: String,
    pub duration_seconds: i64,
    pub activity_remark: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DailyReportData {
    pub date: String,
    pub metadata: DayMetadata,
    pub total_duration: i64,
    /// Interval records in parser insertion order.
    pub detailed_records: Vec<TimeRecord>,
    /// Pre-aggregated per-day columns keyed by column name.
    pub stats: BTreeMap<String, i64>,
    /// Flat `(project_id, total_duration)` aggregation feeding the tree.
    pub project_stats: Vec<(i64, i64)>,
    pub project_tree: ProjectTree,
}

/// Aggregate-only report shared by monthly, weekly, yearly, period and
/// arbitrary-range requests. Range reports carry no detailed records.
#[derive(Debug, Clone)]
pub struct RangeReportData {
    pub range_label: String,
    pub start_date: String,
    pub end_date: String,
    pub requested_days: i32,
    pub total_duration: i64,
    /// Distinct dates with at least one interval record.
    pub actual_days: i32,
    pub status_true_days: i32,
    pub sleep_true_days: i32,
    pub exercise_true_days: i32,
    pub cardio_true_days: i32,
    pub anaerobic_true_days: i32,
    pub is_valid: bool,
    pub project_stats: Vec<(i64, i64)>,
    pub project_tree: ProjectTree,
}

impl Default for RangeReportData {
    fn default() -> Self {
        Self {
            range_label: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            requested_days: 0,
            total_duration: 0,
            actual_days: 0,
            status_true_days: 0,
            sleep_true_days: 0,
            exercise_true_days: 0,
            cardio_true_days: 0,
            anaerobic_true_days: 0,
            is_valid: true,
            project_stats: Vec::new(),
            project_tree: ProjectTree::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_and_extensions() {
        assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("Markdown"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("tex"), Some(ReportFormat::LaTeX));
        assert_eq!(ReportFormat::from_str("typst"), Some(ReportFormat::Typst));
        assert_eq!(ReportFormat::from_str("pdf"), None);

        assert_eq!(ReportFormat::Markdown.extension(), "md");
        assert_eq!(ReportFormat::LaTeX.extension(), "tex");
        assert_eq!(ReportFormat::Typst.extension(), "typ");
    }

    #[test]
    fn range_reports_start_out_valid() {
        assert!(RangeReportData::default().is_valid);
    }
}
