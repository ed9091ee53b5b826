//! LaTeX formatters: daily and range-like reports.

use crate::abi::{
    TtFormatterConfig, TtReportDataView, TT_FORMATTER_CONFIG_KIND_MONTH_TEX,
    TT_FORMATTER_CONFIG_KIND_RANGE_TEX, TT_REPORT_DATA_KIND_DAILY, TT_REPORT_DATA_KIND_MONTHLY,
    TT_REPORT_DATA_KIND_PERIOD, TT_REPORT_DATA_KIND_RANGE, TT_REPORT_DATA_KIND_WEEKLY,
    TT_REPORT_DATA_KIND_YEARLY,
};
use crate::fmt::{
    bool_to_string, escape_latex, format_compact_number, format_duration, format_duration_avg,
    format_multiline_for_list, format_title_template,
};
use crate::stats::{render_statistics, StatStrategy};
use crate::tree::{percent_text, render_project_tree, TreeStrategy};
use crate::view::{
    parse_daily_report, parse_day_tex_config, parse_range_like_tex_config, parse_range_report,
    DailyReportView, DayTexConfig, RangeReportView, RangeTexConfig, TexStyle,
};
use crate::{FormatterError, PluginFormatter};

/// LaTeX line break inside a list item.
const TEX_LINE_BREAK: &str = "\\\\";

fn compact_list_options(top_sep_pt: f64, item_sep_ex: f64) -> String {
    format!(
        "[topsep={}pt, itemsep={}ex]",
        format_compact_number(top_sep_pt),
        format_compact_number(item_sep_ex)
    )
}

/// `{\fontsize{S}{L}\selectfont\section*{...}}` where the line height is
/// 1.2 times the font size, kept in tenths.
fn fontsize_title(content: &str, font_size: i32, subsection: bool) -> String {
    let line_height_tenths = font_size * 12;
    let command = if subsection {
        "\\subsection*"
    } else {
        "\\section*"
    };
    format!(
        "{{\\fontsize{{{font_size}}}{{{}.{}}}\\selectfont{command}{{{content}}}}}\n\n",
        line_height_tenths / 10,
        line_height_tenths % 10
    )
}

fn summary_list(items: &[(String, String)], top_sep_pt: f64, item_sep_ex: f64) -> String {
    let mut output = String::from("\\begin{itemize}");
    output.push_str(&compact_list_options(top_sep_pt, item_sep_ex));
    output.push('\n');
    for (label, value) in items {
        output.push_str(&format!("    \\item \\textbf{{{label}}}: {value}\n"));
    }
    output.push_str("\\end{itemize}\n\n");
    output
}

fn tex_preamble(style: &TexStyle, keyword_colors: &[(String, String)]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\\documentclass[{}pt]{{extarticle}}\n",
        style.base_font_size
    ));
    output.push_str(&format!(
        "\\usepackage[a4paper, margin={}in]{{geometry}}\n",
        format_compact_number(style.margin_in)
    ));
    output.push_str("\\usepackage[dvipsnames]{xcolor}\n");
    output.push_str("\\usepackage{enumitem}\n");
    output.push_str("\\usepackage{fontspec}\n");
    output.push_str("\\usepackage{ctex}\n");
    output.push_str("\\usepackage{titlesec}\n\n");
    output.push_str("\\titleformat{\\section}{\\normalfont\\bfseries}{}{0em}{}\n");
    output.push_str("\\titleformat{\\subsection}{\\normalfont\\bfseries}{}{0em}{}\n\n");

    for (keyword, color) in keyword_colors {
        let hex = color.strip_prefix('#').unwrap_or(color);
        output.push_str(&format!("\\definecolor{{{keyword}color}}{{HTML}}{{{hex}}}\n"));
    }

    output.push('\n');
    output.push_str(&format!("\\setmainfont{{{}}}\n", style.main_font));
    output.push_str(&format!("\\setCJKmainfont{{{}}}\n\n", style.cjk_main_font));
    output.push_str("\\begin{document}\n\n");
    output
}

fn tex_postfix() -> &'static str {
    "\n\\end{document}\n"
}

struct LatexTreeStrategy {
    category_font_size: i32,
    itemize_options: String,
}

impl LatexTreeStrategy {
    fn new(style: &TexStyle) -> Self {
        Self {
            category_font_size: style.category_title_font_size,
            itemize_options: compact_list_options(style.list_top_sep_pt, style.list_item_sep_ex),
        }
    }
}

impl TreeStrategy for LatexTreeStrategy {
    fn category_header(&self, name: &str, duration_text: &str, percentage: f64) -> String {
        let line_height_tenths = self.category_font_size * 12;
        format!(
            "{{\\fontsize{{{}}}{{{}.{}}}\\selectfont\\subsection*{{{}: {} ({}\\%)}}}}\n",
            self.category_font_size,
            line_height_tenths / 10,
            line_height_tenths % 10,
            escape_latex(name),
            escape_latex(duration_text),
            percent_text(percentage)
        )
    }

    fn tree_node(&self, name: &str, duration_text: &str, _indent_level: usize) -> String {
        // itemize handles the nesting depth
        format!(
            "    \\item {}: {}\n",
            escape_latex(name),
            escape_latex(duration_text)
        )
    }

    fn start_children_list(&self) -> String {
        format!("\\begin{{itemize}}{}\n", self.itemize_options)
    }

    fn end_children_list(&self) -> String {
        "\\end{itemize}\n".to_string()
    }
}

struct LatexStatStrategy {
    itemize_options: String,
}

impl StatStrategy for LatexStatStrategy {
    fn header(&self, title: &str) -> String {
        format!("\\subsection*{{{}}}\n", escape_latex(title))
    }

    fn main_item(&self, label: &str, value: &str) -> String {
        format!("    \\item \\textbf{{{}}}: {}", escape_latex(label), value)
    }

    fn sub_item(&self, label: &str, value: &str, _depth: usize) -> String {
        format!("        \\item \\textbf{{{}}}: {}", escape_latex(label), value)
    }

    fn build_output(&self, lines: &[String]) -> String {
        let mut output = format!("\\begin{{itemize}}{}\n", self.itemize_options);
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }
        output.push_str("\\end{itemize}\n\n");
        output
    }
}

fn format_ratio(count: i32, total_days: i32) -> String {
    if total_days <= 0 {
        return count.to_string();
    }
    let percent = 100.0 * f64::from(count) / f64::from(total_days);
    format!("{count} ({percent:.2}\\%)")
}

fn breakdown_title(label: &str, category_title_font_size: i32) -> String {
    fontsize_title(&escape_latex(label), category_title_font_size, false)
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

pub struct DayTexFormatter {
    config: DayTexConfig,
}

impl DayTexFormatter {
    fn header_content(&self, output: &mut String, data: &DailyReportView) {
        let labels = &self.config.labels;
        let style = &self.config.style;
        let title = format!("{} {}", labels.report_title, escape_latex(&data.date));
        output.push_str(&fontsize_title(&title, style.report_title_font_size, false));

        let safe_remark = escape_latex(&data.metadata.remark);
        let formatted_remark = format_multiline_for_list(&safe_remark, 0, TEX_LINE_BREAK);
        let items = vec![
            (labels.date_label.clone(), escape_latex(&data.date)),
            (
                labels.total_time_label.clone(),
                escape_latex(&format_duration(data.total_duration)),
            ),
            (
                labels.status_label.clone(),
                bool_to_string(&data.metadata.status).to_string(),
            ),
            (
                labels.sleep_label.clone(),
                bool_to_string(&data.metadata.sleep).to_string(),
            ),
            (
                labels.exercise_label.clone(),
                bool_to_string(&data.metadata.exercise).to_string(),
            ),
            (
                labels.getup_time_label.clone(),
                escape_latex(&data.metadata.getup_time),
            ),
            (labels.remark_label.clone(), formatted_remark),
        ];
        output.push_str(&summary_list(
            &items,
            style.list_top_sep_pt,
            style.list_item_sep_ex,
        ));
    }

    fn detailed_activities(&self, output: &mut String, data: &DailyReportView) {
        if data.detailed_records.is_empty() {
            return;
        }
        let labels = &self.config.labels;
        let style = &self.config.style;
        let options = compact_list_options(style.list_top_sep_pt, style.list_item_sep_ex);

        output.push_str(&fontsize_title(
            &escape_latex(&labels.all_activities_label),
            style.category_title_font_size,
            true,
        ));
        output.push_str(&format!("\\begin{{itemize}}{options}\n"));

        for record in &data.detailed_records {
            let project_path = record
                .project_path
                .replace('_', &labels.activity_connector);
            let base_line = format!(
                "{} - {} ({}): {}",
                escape_latex(&record.start_time),
                escape_latex(&record.end_time),
                escape_latex(&format_duration(record.duration_seconds)),
                escape_latex(&project_path)
            );

            let colorized = self
                .config
                .keyword_colors
                .iter()
                .find(|(keyword, _)| record.project_path.contains(keyword.as_str()))
                .map_or_else(
                    || base_line.clone(),
                    |(keyword, _)| format!("\\textcolor{{{keyword}color}}{{{base_line}}}"),
                );
            output.push_str(&format!("    \\item {colorized}\n"));

            if let Some(remark) = &record.activity_remark {
                let safe_remark = escape_latex(remark);
                let formatted = format_multiline_for_list(&safe_remark, 0, TEX_LINE_BREAK);
                output.push_str(&format!("    \\begin{{itemize}}{options}\n"));
                output.push_str(&format!(
                    "        \\item \\textbf{{{}}}: {}\n",
                    labels.activity_remark_label, formatted
                ));
                output.push_str("    \\end{itemize}\n");
            }
        }
        output.push_str("\\end{itemize}\n\n");
    }

    fn render(&self, data: &DailyReportView) -> String {
        let labels = &self.config.labels;
        let style = &self.config.style;

        let mut output = tex_preamble(style, &self.config.keyword_colors);
        self.header_content(&mut output, data);

        if data.total_duration == 0 {
            output.push_str(&labels.no_records_message);
            output.push('\n');
            output.push_str(tex_postfix());
            return output;
        }

        output.push_str(&render_statistics(
            data,
            &self.config.statistics,
            &labels.statistics_label,
            &LatexStatStrategy {
                itemize_options: compact_list_options(
                    style.list_top_sep_pt,
                    style.list_item_sep_ex,
                ),
            },
        ));
        self.detailed_activities(&mut output, data);

        output.push_str(&breakdown_title(
            &labels.project_breakdown_label,
            style.category_title_font_size,
        ));
        output.push_str(&render_project_tree(
            &data.tree,
            data.total_duration,
            1,
            &LatexTreeStrategy::new(style),
        ));
        output.push_str(tex_postfix());
        output
    }
}

impl PluginFormatter for DayTexFormatter {
    unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
        Ok(Self {
            config: parse_day_tex_config(config)?,
        })
    }

    unsafe fn format_report(
        &self,
        view: &TtReportDataView,
        kind: u32,
    ) -> Result<String, FormatterError> {
        if kind != TT_REPORT_DATA_KIND_DAILY {
            return Err(FormatterError::not_supported(format!(
                "daily LaTeX formatter cannot render report kind {kind}"
            )));
        }
        Ok(self.render(&parse_daily_report(view)?))
    }
}

// ---------------------------------------------------------------------------
// Range-like
// ---------------------------------------------------------------------------

pub(crate) fn render_range_like_tex(config: &RangeTexConfig, data: &RangeReportView) -> String {
    let labels = &config.labels;
    let style = &config.style;

    if !data.is_valid {
        let mut output = labels.invalid_message.clone();
        output.push('\n');
        return output;
    }

    let mut output = tex_preamble(style, &[]);

    let title = format_title_template(&labels.title_template, &data.range_label);
    output.push_str(&fontsize_title(
        &escape_latex(&title),
        style.report_title_font_size,
        false,
    ));

    if data.actual_days > 0 {
        let items = vec![
            (
                labels.total_time_label.clone(),
                escape_latex(&format_duration_avg(data.total_duration, data.actual_days)),
            ),
            (labels.actual_days_label.clone(), data.actual_days.to_string()),
            (
                labels.status_days_label.clone(),
                format_ratio(data.status_true_days, data.actual_days),
            ),
            (
                labels.sleep_days_label.clone(),
                format_ratio(data.sleep_true_days, data.actual_days),
            ),
            (
                labels.exercise_days_label.clone(),
                format_ratio(data.exercise_true_days, data.actual_days),
            ),
            (
                labels.cardio_days_label.clone(),
                format_ratio(data.cardio_true_days, data.actual_days),
            ),
            (
                labels.anaerobic_days_label.clone(),
                format_ratio(data.anaerobic_true_days, data.actual_days),
            ),
        ];
        output.push_str(&summary_list(
            &items,
            style.list_top_sep_pt,
            style.list_item_sep_ex,
        ));
    }

    if data.actual_days == 0 {
        output.push_str(&labels.no_records_message);
        output.push('\n');
        output.push_str(tex_postfix());
        return output;
    }

    output.push_str(&breakdown_title(
        &labels.project_breakdown_label,
        style.category_title_font_size,
    ));
    output.push_str(&render_project_tree(
        &data.tree,
        data.total_duration,
        data.actual_days,
        &LatexTreeStrategy::new(style),
    ));
    output.push_str(tex_postfix());
    output
}

macro_rules! range_like_tex_formatter {
    ($name:ident, $config_kind:expr, $kinds:expr, $kind_label:literal) => {
        pub struct $name {
            config: RangeTexConfig,
        }

        impl PluginFormatter for $name {
            unsafe fn create(config: &TtFormatterConfig) -> Result<Self, FormatterError> {
                Ok(Self {
                    config: parse_range_like_tex_config(config, $config_kind)?,
                })
            }

            unsafe fn format_report(
                &self,
                view: &TtReportDataView,
                kind: u32,
            ) -> Result<String, FormatterError> {
                if !$kinds.contains(&kind) {
                    return Err(FormatterError::not_supported(format!(
                        concat!($kind_label, " LaTeX formatter cannot render report kind {}"),
                        kind
                    )));
                }
                Ok(render_range_like_tex(&self.config, &parse_range_report(view)?))
            }
        }
    };
}

range_like_tex_formatter!(
    MonthTexFormatter,
    TT_FORMATTER_CONFIG_KIND_MONTH_TEX,
    [TT_REPORT_DATA_KIND_MONTHLY],
    "monthly"
);
range_like_tex_formatter!(
    RangeTexFormatter,
    TT_FORMATTER_CONFIG_KIND_RANGE_TEX,
    [
        TT_REPORT_DATA_KIND_PERIOD,
        TT_REPORT_DATA_KIND_RANGE,
        TT_REPORT_DATA_KIND_WEEKLY,
        TT_REPORT_DATA_KIND_YEARLY
    ],
    "range"
);
