//! Markdown formatters: daily and range-like reports.

use crate::abi::{
    TtFormatterConfig, TtReportDataView, TT_FORMATTER_CONFIG_KIND_DAY_MD,
    TT_FORMATTER_CONFIG_KIND_MONTH_MD, TT_FORMATTER_CONFIG_KIND_RANGE_MD,
    TT_REPORT_DATA_KIND_DAILY, TT_REPORT_DATA_KIND_MONTHLY, TT_REPORT_DATA_KIND_PERIOD,
    TT_REPORT_DATA_KIND_RANGE, TT_REPORT_DATA_KIND_WEEKLY, TT_REPORT_DATA_KIND_YEARLY,
};
use crate::fmt::{
    bool_to_string, format_count_with_percentage, format_duration, format_duration_avg,
    format_multiline_for_list, format_title_template,
};
use crate::stats::{render_statistics, StatStrategy};
use crate::tree::{percent_text, render_project_tree, TreeStrategy};
use crate::view::{
    parse_daily_report, parse_day_md_config, parse_range_like_md_config, parse_range_report,
    DailyReportView, DayMdConfig, RangeLabels, RangeReportView,
};
use crate::{FormatterError, PluginFormatter};

/// Markdown hard line break: two trailing spaces.
const MD_LINE_BREAK: &str = "  ";
const REMARK_INDENT: usize = 2;

pub(crate) struct MarkdownTreeStrategy;

impl TreeStrategy for MarkdownTreeStrategy {
    fn category_header(&self, name: &str, duration_text: &str, percentage: f64) -> String {
        format!(
            "\n### {name}: {duration_text} ({}%) ###\n",
            percent_text(percentage)
        )
    }

    fn tree_node(&self, name: &str, duration_text: &str, indent_level: usize) -> String {
        format!("{}- {name}: {duration_text}\n", "  ".repeat(indent_level))
    }
}

struct MarkdownStatStrategy;

impl StatStrategy for MarkdownStatStrategy {
    fn header(&self, title: &str) -> String {
        format!("\n## {title}\n\n")
    }

    fn main_item(&self, label: &str, value: &str) -> String {
        format!("- **{label}**: {value}")
    }

    fn sub_item(&self, label: &str, value: &str, depth: usize) -> String {
        format!("{}- **{label}**: {value}", "  ".repeat(depth))
    }
}

fn item_line(label: &str, value: &str) -> String {
    format!("- **{label}**: {value}\n")
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

pub struct DayMdFormatter {
    config: DayMdConfig,
}

impl DayMdFormatter {
    fn header_content(&self, output: &mut String, data: &DailyReportView) {
        let labels = &self.config.labels;
        output.push_str(&format!("## {} {}\n\n", labels.title_prefix, data.date));
        output.push_str(&item_line(&labels.date_label, &data.date));
        output.push_str(&item_line(
            &labels.total_time_label,
            &format_duration(data.total_duration),
        ));
        output.push_str(&item_line(
            &labels.status_label,
            bool_to_string(&data.metadata.status),
        ));
        output.push_str(&item_line(
            &labels.sleep_label,
            bool_to_string(&data.metadata.sleep),
        ));
        output.push_str(&item_line(
            &labels.exercise_label,
            bool_to_string(&data.metadata.exercise),
        ));
        output.push_str(&item_line(&labels.getup_time_label, &data.metadata.getup_time));
        let remark = format_multiline_for_list(&data.metadata.remark, REMARK_INDENT, MD_LINE_BREAK);
        output.push_str(&item_line(&labels.remark_label, &remark));
    }

    fn detailed_activities(&self, output: &mut String, data: &DailyReportView) {
        if data.detailed_records.is_empty() {
            return;
        }
        let labels = &self.config.labels;
        output.push_str(&format!("\n## {}\n\n", labels.all_activities_label));
        for record in &data.detailed_records {
            let project_path = record
                .project_path
                .replace('_', &labels.activity_connector);
            output.push_str(&format!(
                "- {} - {} ({}): {}\n",
                record.start_time,
                record.end_time,
                format_duration(record.duration_seconds),
                project_path
            ));
            if let Some(remark) = &record.activity_remark {
                output.push_str(&format!(
                    "  - **{}**: {}\n",
                    labels.activity_remark_label, remark
                ));
            }
        }
        output.push('\n');
    }

    fn render(&self, data: &DailyReportView) -> String {
        let labels = &self.config.labels;
        let mut output = String::new();
        self.header_content(&mut output, data);

        if data.total_duration == 0 {
            output.push_str(&labels.no_records_message);
            output.push('\n');
            return output;
        }

        output.push_str(&render_statistics(
            data,
            &self.config.statistics,
            &labels.statistics_label,
            &MarkdownStatStrategy,
        ));
        self.detailed_activities(&mut output, data);

        output.push_str(&format!("\n## {}\n", labels.project_breakdown_label));
        output.push_str(&render_project_tree(
            &data.tree,
            data.total_duration,
            1,
            &MarkdownTreeStrategy,
        ));
        output
    }
}

impl PluginFormatter for DayMdFormatter {
    unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
        Ok(Self {
            config: parse_day_md_config(config)?,
        })
    }

    unsafe fn format_report(
        &self,
        view: &TtReportDataView,
        kind: u32,
    ) -> Result<String, FormatterError> {
        if kind != TT_REPORT_DATA_KIND_DAILY {
            return Err(FormatterError::not_supported(format!(
                "daily markdown formatter cannot render report kind {kind}"
            )));
        }
        Ok(self.render(&parse_daily_report(view)?))
    }
}

// ---------------------------------------------------------------------------
// Range-like (monthly, weekly, yearly, period, arbitrary range)
// ---------------------------------------------------------------------------

pub(crate) fn render_range_like_md(labels: &RangeLabels, data: &RangeReportView) -> String {
    if !data.is_valid {
        let mut output = labels.invalid_message.clone();
        output.push('\n');
        return output;
    }

    let mut output = String::new();
    let title = format_title_template(&labels.title_template, &data.range_label);
    output.push_str(&format!("## {title}\n\n"));

    if data.actual_days > 0 {
        output.push_str(&item_line(
            &labels.actual_days_label,
            &data.actual_days.to_string(),
        ));
        output.push_str(&item_line(
            &labels.total_time_label,
            &format_duration_avg(data.total_duration, data.actual_days),
        ));
        output.push_str(&item_line(
            &labels.status_days_label,
            &format_count_with_percentage(data.status_true_days, data.actual_days),
        ));
        output.push_str(&item_line(
            &labels.sleep_days_label,
            &format_count_with_percentage(data.sleep_true_days, data.actual_days),
        ));
        output.push_str(&item_line(
            &labels.exercise_days_label,
            &format_count_with_percentage(data.exercise_true_days, data.actual_days),
        ));
        output.push_str(&item_line(
            &labels.cardio_days_label,
            &format_count_with_percentage(data.cardio_true_days, data.actual_days),
        ));
        output.push_str(&item_line(
            &labels.anaerobic_days_label,
            &format_count_with_percentage(data.anaerobic_true_days, data.actual_days),
        ));
    }

    if data.actual_days == 0 {
        output.push_str(&labels.no_records_message);
        output.push('\n');
        return output;
    }

    output.push_str(&format!("\n## {}\n", labels.project_breakdown_label));
    output.push_str(&render_project_tree(
        &data.tree,
        data.total_duration,
        data.actual_days,
        &MarkdownTreeStrategy,
    ));
    output
}

macro_rules! range_like_md_formatter {
    ($name:ident, $config_kind:expr, $kinds:expr, $kind_label:literal) => {
        pub struct $name {
            labels: RangeLabels,
        }

        impl PluginFormatter for $name {
            unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
                Ok(Self {
                    labels: parse_range_like_md_config(config, $config_kind)?,
                })
            }

            unsafe fn format_report(
                &self,
                view: &TtReportDataView,
                kind: u32,
            ) -> Result<String, FormatterError> {
                if !$kinds.contains(&kind) {
                    return Err(FormatterError::not_supported(format!(
                        concat!($kind_label, " markdown formatter cannot render report kind {}"),
                        kind
                    )));
                }
                Ok(render_range_like_md(&self.labels, &parse_range_report(view)?))
            }
        }
    };
}

range_like_md_formatter!(
    MonthMdFormatter,
    TT_FORMATTER_CONFIG_KIND_MONTH_MD,
    [TT_REPORT_DATA_KIND_MONTHLY],
    "monthly"
);
range_like_md_formatter!(
    RangeMdFormatter,
    TT_FORMATTER_CONFIG_KIND_RANGE_MD,
    [
        TT_REPORT_DATA_KIND_PERIOD,
        TT_REPORT_DATA_KIND_RANGE,
        TT_REPORT_DATA_KIND_WEEKLY,
        TT_REPORT_DATA_KIND_YEARLY
    ],
    "range"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatisticItem;
    use crate::tree::test_support::forest;
    use crate::tree::FlatForest;
    use crate::view::{DayLabels, DayMetadata, TimeRecord};

    pub(crate) fn test_day_labels() -> DayLabels {
        DayLabels {
            title_prefix: "Daily Report".to_string(),
            report_title: "Daily Report".to_string(),
            date_label: "Date".to_string(),
            total_time_label: "Total Time".to_string(),
            status_label: "Status".to_string(),
            sleep_label: "Sleep".to_string(),
            getup_time_label: "Getup Time".to_string(),
            remark_label: "Remark".to_string(),
            exercise_label: "Exercise".to_string(),
            no_records_message: "No records for this day.".to_string(),
            statistics_label: "Statistics".to_string(),
            all_activities_label: "All Activities".to_string(),
            activity_remark_label: "Remark".to_string(),
            activity_connector: ".".to_string(),
            project_breakdown_label: "Project Breakdown".to_string(),
        }
    }

    pub(crate) fn test_range_labels() -> RangeLabels {
        RangeLabels {
            title_template: "Monthly Report {}".to_string(),
            actual_days_label: "Actual Days".to_string(),
            status_days_label: "Status Days".to_string(),
            sleep_days_label: "Sleep Days".to_string(),
            exercise_days_label: "Exercise Days".to_string(),
            cardio_days_label: "Cardio Days".to_string(),
            anaerobic_days_label: "Anaerobic Days".to_string(),
            total_time_label: "Total Time".to_string(),
            no_records_message: "No records in this range.".to_string(),
            invalid_message: "Invalid range format.".to_string(),
            project_breakdown_label: "Project Breakdown".to_string(),
        }
    }

    fn midnight_wrap_day() -> DailyReportView {
        DailyReportView {
            date: "2025-01-01".to_string(),
            metadata: DayMetadata {
                status: "0".to_string(),
                sleep: "0".to_string(),
                remark: String::new(),
                getup_time: "06:00".to_string(),
                exercise: "0".to_string(),
            },
            total_duration: 2700,
            detailed_records: vec![TimeRecord {
                start_time: "23:30".to_string(),
                end_time: "00:15".to_string(),
                project_path: "sleep_night".to_string(),
                duration_seconds: 2700,
                activity_remark: None,
            }],
            stats: Vec::new(),
            tree: forest(&[("sleep", 2700, -1), ("night", 2700, 0)]),
        }
    }

    fn range_data(tree: FlatForest) -> RangeReportView {
        RangeReportView {
            range_label: "2025-07".to_string(),
            start_date: "2025-07-01".to_string(),
            end_date: "2025-07-31".to_string(),
            requested_days: 0,
            total_duration: 36_000,
            actual_days: 20,
            status_true_days: 15,
            sleep_true_days: 18,
            exercise_true_days: 4,
            cardio_true_days: 3,
            anaerobic_true_days: 2,
            is_valid: true,
            tree,
        }
    }

    #[test]
    fn daily_header_shows_wrapped_total() {
        let formatter = DayMdFormatter {
            config: DayMdConfig {
                labels: test_day_labels(),
                statistics: Vec::new(),
            },
        };
        let output = formatter.render(&midnight_wrap_day());

        assert!(output.starts_with("## Daily Report 2025-01-01\n"));
        assert!(output.contains("- **Total Time**: 0h 45m\n"));
        assert!(output.contains("- **Getup Time**: 06:00\n"));
        assert!(output.contains("- 23:30 - 00:15 (0h 45m): sleep.night\n"));
        assert!(output.contains("\n### sleep: 0h 45m (100.0%) ###\n"));
        assert!(output.contains("- night: 0h 45m\n"));
    }

    #[test]
    fn daily_empty_day_renders_no_records_message() {
        let formatter = DayMdFormatter {
            config: DayMdConfig {
                labels: test_day_labels(),
                statistics: Vec::new(),
            },
        };
        let mut data = midnight_wrap_day();
        data.total_duration = 0;
        data.detailed_records.clear();
        data.tree = FlatForest::default();

        let output = formatter.render(&data);
        assert!(output.ends_with("No records for this day.\n"));
        assert!(!output.contains("Project Breakdown"));
    }

    #[test]
    fn daily_statistics_section_uses_configured_items() {
        let formatter = DayMdFormatter {
            config: DayMdConfig {
                labels: test_day_labels(),
                statistics: vec![StatisticItem {
                    label: "Sleep".to_string(),
                    db_column: "sleep_total_time".to_string(),
                    show: true,
                    children: Vec::new(),
                }],
            },
        };
        let mut data = midnight_wrap_day();
        data.stats = vec![("sleep_total_time".to_string(), 28_800)];

        let output = formatter.render(&data);
        assert!(output.contains("\n## Statistics\n\n- **Sleep**: 8h 0m\n"));
    }

    #[test]
    fn range_header_shows_flag_percentages() {
        let output = render_range_like_md(
            &test_range_labels(),
            &range_data(forest(&[("STUDY", 36_000, -1), ("math", 36_000, 0)])),
        );

        assert!(output.starts_with("## Monthly Report 2025-07\n"));
        assert!(output.contains("- **Actual Days**: 20\n"));
        assert!(output.contains("- **Status Days**: 15 (75.00%)\n"));
        assert!(output.contains("- **Sleep Days**: 18 (90.00%)\n"));
        assert!(output.contains("(average: 0h 30m/day)"));
        assert!(output.contains("\n### STUDY: 10h 0m (average: 0h 30m/day) (100.0%) ###\n"));
    }

    #[test]
    fn invalid_range_renders_only_the_invalid_message() {
        let mut data = range_data(FlatForest::default());
        data.is_valid = false;
        let output = render_range_like_md(&test_range_labels(), &data);
        assert_eq!(output, "Invalid range format.\n");
    }

    #[test]
    fn empty_range_renders_no_records_message() {
        let mut data = range_data(FlatForest::default());
        data.actual_days = 0;
        data.total_duration = 0;
        let output = render_range_like_md(&test_range_labels(), &data);
        assert!(output.starts_with("## Monthly Report 2025-07\n"));
        assert!(output.ends_with("No records in this range.\n"));
        assert!(!output.contains("Project Breakdown"));
    }
}
