//! Typst formatters: daily and range-like reports.

use crate::abi::{
    TtFormatterConfig, TtReportDataView, TT_FORMATTER_CONFIG_KIND_MONTH_TYP,
    TT_FORMATTER_CONFIG_KIND_RANGE_TYP, TT_REPORT_DATA_KIND_DAILY, TT_REPORT_DATA_KIND_MONTHLY,
    TT_REPORT_DATA_KIND_PERIOD, TT_REPORT_DATA_KIND_RANGE, TT_REPORT_DATA_KIND_WEEKLY,
    TT_REPORT_DATA_KIND_YEARLY,
};
use crate::fmt::{
    bool_to_string, format_compact_number, format_count_with_percentage, format_duration,
    format_duration_avg, format_multiline_for_list, format_title_template,
};
use crate::stats::{render_statistics, StatStrategy};
use crate::tree::{percent_text, render_project_tree, TreeStrategy};
use crate::view::{
    parse_daily_report, parse_day_typ_config, parse_range_like_typ_config, parse_range_report,
    DailyReportView, DayTypConfig, RangeReportView, RangeTypConfig, TypstStyle,
};
use crate::{FormatterError, PluginFormatter};

/// Typst forced line break inside a list item.
const TYP_LINE_BREAK: &str = " \\";
const REMARK_INDENT: usize = 2;
const ACTIVITY_REMARK_INDENT: usize = 4;

fn page_setup(style: &TypstStyle) -> String {
    format!(
        "#set page(margin: (top: {}cm, bottom: {}cm, left: {}cm, right: {}cm))",
        format_compact_number(style.margin_top_cm),
        format_compact_number(style.margin_bottom_cm),
        format_compact_number(style.margin_left_cm),
        format_compact_number(style.margin_right_cm)
    )
}

fn text_setup(style: &TypstStyle) -> String {
    format!(
        "#set text(font: \"{}\", size: {}pt, spacing: {}em)",
        style.base_font,
        style.base_font_size,
        format_compact_number(style.line_spacing_em)
    )
}

fn title_text(font: &str, font_size: i32, title: &str) -> String {
    format!("#text(font: \"{font}\", size: {font_size}pt)[= {title}]")
}

fn bullet_line(label: &str, value: &str) -> String {
    format!("+ *{label}:* {value}")
}

struct TypstTreeStrategy {
    category_title_font: String,
    category_title_font_size: i32,
}

impl TreeStrategy for TypstTreeStrategy {
    fn category_header(&self, name: &str, duration_text: &str, percentage: f64) -> String {
        format!(
            "#text(font: \"{}\", size: {}pt)[== {}: {} ({}%)]\n",
            self.category_title_font,
            self.category_title_font_size,
            name,
            duration_text,
            percent_text(percentage)
        )
    }

    fn tree_node(&self, name: &str, duration_text: &str, indent_level: usize) -> String {
        format!("{}+ {name}: {duration_text}\n", "  ".repeat(indent_level))
    }
}

struct TypstStatStrategy {
    statistic_font_size: i32,
    statistic_title_font_size: i32,
}

impl StatStrategy for TypstStatStrategy {
    fn header(&self, title: &str) -> String {
        let mut header = String::new();
        header.push_str(&format!(
            "#let statistic_font_size = {}pt\n",
            self.statistic_font_size
        ));
        header.push_str(&format!(
            "#let statistic_title_font_size = {}pt\n",
            self.statistic_title_font_size
        ));
        header.push_str("#set text(size: statistic_font_size)\n");
        header.push_str(&format!(
            "#text(size: statistic_title_font_size)[= {title}]\n\n"
        ));
        header
    }

    fn main_item(&self, label: &str, value: &str) -> String {
        format!("- *{label}*: {value}")
    }

    fn sub_item(&self, label: &str, value: &str, depth: usize) -> String {
        format!("{}- *{label}*: {value}", "  ".repeat(depth))
    }
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

pub struct DayTypFormatter {
    config: DayTypConfig,
}

impl DayTypFormatter {
    fn activity_line(&self, record: &crate::view::TimeRecord) -> String {
        let labels = &self.config.labels;
        let project_path = record
            .project_path
            .replace('_', &labels.activity_connector);
        let base_line = format!(
            "{} - {} ({}): {}",
            record.start_time,
            record.end_time,
            format_duration(record.duration_seconds),
            project_path
        );

        let mut output = match self
            .config
            .keyword_colors
            .iter()
            .find(|(keyword, _)| record.project_path.contains(keyword.as_str()))
        {
            Some((_, color)) => format!("+ #text(rgb(\"{color}\"))[{base_line}]"),
            None => format!("+ {base_line}"),
        };

        if let Some(remark) = &record.activity_remark {
            let formatted =
                format_multiline_for_list(remark, ACTIVITY_REMARK_INDENT, TYP_LINE_BREAK);
            output.push_str(&format!(
                "\n  + *{}:* {}",
                labels.activity_remark_label, formatted
            ));
        }
        output
    }

    fn header_content(&self, output: &mut String, data: &DailyReportView) {
        let labels = &self.config.labels;
        let style = &self.config.style;
        output.push_str(&title_text(
            &style.title_font,
            style.report_title_font_size,
            &format!("{} {}", labels.title_prefix, data.date),
        ));
        output.push_str("\n\n");
        output.push_str(&bullet_line(&labels.date_label, &data.date));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.total_time_label,
            &format_duration(data.total_duration),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.status_label,
            bool_to_string(&data.metadata.status),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.sleep_label,
            bool_to_string(&data.metadata.sleep),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.exercise_label,
            bool_to_string(&data.metadata.exercise),
        ));
        output.push('\n');
        output.push_str(&bullet_line(&labels.getup_time_label, &data.metadata.getup_time));
        output.push('\n');
        let remark = format_multiline_for_list(&data.metadata.remark, REMARK_INDENT, TYP_LINE_BREAK);
        output.push_str(&bullet_line(&labels.remark_label, &remark));
        output.push('\n');
    }

    fn detailed_activities(&self, output: &mut String, data: &DailyReportView) {
        if data.detailed_records.is_empty() {
            return;
        }
        let labels = &self.config.labels;
        let style = &self.config.style;
        output.push_str(&title_text(
            &style.category_title_font,
            style.category_title_font_size,
            &labels.all_activities_label,
        ));
        output.push_str("\n\n");
        for record in &data.detailed_records {
            output.push_str(&self.activity_line(record));
            output.push('\n');
        }
    }

    fn render(&self, data: &DailyReportView) -> String {
        let labels = &self.config.labels;
        let style = &self.config.style;

        let mut output = page_setup(style);
        output.push('\n');
        output.push_str(&text_setup(style));
        output.push_str("\n\n");

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
            &TypstStatStrategy {
                statistic_font_size: self.config.statistic_font_size,
                statistic_title_font_size: self.config.statistic_title_font_size,
            },
        ));
        self.detailed_activities(&mut output, data);

        output.push_str(&title_text(
            &style.category_title_font,
            style.category_title_font_size,
            &labels.project_breakdown_label,
        ));
        output.push_str("\n\n");
        output.push_str(&render_project_tree(
            &data.tree,
            data.total_duration,
            1,
            &TypstTreeStrategy {
                category_title_font: style.category_title_font.clone(),
                category_title_font_size: style.category_title_font_size,
            },
        ));
        output
    }
}

impl PluginFormatter for DayTypFormatter {
    unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
        Ok(Self {
            config: parse_day_typ_config(config)?,
        })
    }

    unsafe fn format_report(
        &self,
        view: &TtReportDataView,
        kind: u32,
    ) -> Result<String, FormatterError> {
        if kind != TT_REPORT_DATA_KIND_DAILY {
            return Err(FormatterError::not_supported(format!(
                "daily Typst formatter cannot render report kind {kind}"
            )));
        }
        Ok(self.render(&parse_daily_report(view)?))
    }
}

// ---------------------------------------------------------------------------
// Range-like
// ---------------------------------------------------------------------------

pub(crate) fn render_range_like_typ(config: &RangeTypConfig, data: &RangeReportView) -> String {
    let labels = &config.labels;
    let style = &config.style;

    let mut output = page_setup(style);
    output.push('\n');
    output.push_str(&text_setup(style));
    output.push_str("\n\n");

    if !data.is_valid {
        output.push_str(&labels.invalid_message);
        output.push('\n');
        return output;
    }

    let title = format_title_template(&labels.title_template, &data.range_label);
    output.push_str(&title_text(
        &style.title_font,
        style.report_title_font_size,
        &title,
    ));
    output.push_str("\n\n");

    if data.actual_days > 0 {
        output.push_str(&bullet_line(
            &labels.total_time_label,
            &format_duration_avg(data.total_duration, data.actual_days),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.actual_days_label,
            &data.actual_days.to_string(),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.status_days_label,
            &format_count_with_percentage(data.status_true_days, data.actual_days),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.sleep_days_label,
            &format_count_with_percentage(data.sleep_true_days, data.actual_days),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.exercise_days_label,
            &format_count_with_percentage(data.exercise_true_days, data.actual_days),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.cardio_days_label,
            &format_count_with_percentage(data.cardio_true_days, data.actual_days),
        ));
        output.push('\n');
        output.push_str(&bullet_line(
            &labels.anaerobic_days_label,
            &format_count_with_percentage(data.anaerobic_true_days, data.actual_days),
        ));
        output.push('\n');
    }

    if data.actual_days == 0 {
        output.push_str(&labels.no_records_message);
        output.push('\n');
        return output;
    }

    output.push_str(&title_text(
        &style.category_title_font,
        style.category_title_font_size,
        &labels.project_breakdown_label,
    ));
    output.push_str("\n\n");
    output.push_str(&render_project_tree(
        &data.tree,
        data.total_duration,
        data.actual_days,
        &TypstTreeStrategy {
            category_title_font: style.category_title_font.clone(),
            category_title_font_size: style.category_title_font_size,
        },
    ));
    output
}

macro_rules! range_like_typ_formatter {
    ($name:ident, $config_kind:expr, $kinds:expr, $kind_label:literal) => {
        pub struct $name {
            config: RangeTypConfig,
        }

        impl PluginFormatter for $name {
            unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
                Ok(Self {
                    config: parse_range_like_typ_config(config, $config_kind)?,
                })
            }

            unsafe fn format_report(
                &self,
                view: &TtReportDataView,
                kind: u32,
            ) -> Result<String, FormatterError> {
                if !$kinds.contains(&kind) {
                    return Err(FormatterError::not_supported(format!(
                        concat!($kind_label, " Typst formatter cannot render report kind {}"),
                        kind
                    )));
                }
                Ok(render_range_like_typ(&self.config, &parse_range_report(view)?))
            }
        }
    };
}

range_like_typ_formatter!(
    MonthTypFormatter,
    TT_FORMATTER_CONFIG_KIND_MONTH_TYP,
    [TT_REPORT_DATA_KIND_MONTHLY],
    "monthly"
);
range_like_typ_formatter!(
    RangeTypFormatter,
    TT_FORMATTER_CONFIG_KIND_RANGE_TYP,
    [
        TT_REPORT_DATA_KIND_PERIOD,
        TT_REPORT_DATA_KIND_RANGE,
        TT_REPORT_DATA_KIND_WEEKLY,
        TT_REPORT_DATA_KIND_YEARLY
    ],
    "range"
);
