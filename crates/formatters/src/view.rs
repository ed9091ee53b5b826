//! Parsing of borrowed ABI views into owned values.
//!
//! Every entry point validates `struct_size` and `version` before touching
//! payload fields, so a host built against a different ABI revision is
//! rejected with `CONFIG_ERROR`/`INVALID_ARGUMENT` instead of being
//! misread.

use std::mem::size_of;

use crate::abi::{
    TtDailyReportDataV1, TtDayMdConfigV1, TtDayTexConfigV1, TtDayTypConfigV1, TtFormatterConfig,
    TtFormatterKeywordColorV1, TtMonthLabelsConfigV1, TtMonthMdConfigV1, TtMonthTexConfigV1,
    TtMonthTypConfigV1, TtRangeLabelsConfigV1, TtRangeMdConfigV1, TtRangeReportDataV1,
    TtRangeTexConfigV1, TtRangeTypConfigV1, TtReportDataView, TtStringView, TtTexStyleConfigV1,
    TtTypstStyleConfigV1, TT_FORMATTER_CONFIG_KIND_DAY_MD, TT_FORMATTER_CONFIG_KIND_DAY_TEX,
    TT_FORMATTER_CONFIG_KIND_DAY_TYP, TT_FORMATTER_CONFIG_KIND_MONTH_MD,
    TT_FORMATTER_CONFIG_KIND_MONTH_TEX, TT_FORMATTER_CONFIG_KIND_MONTH_TYP,
    TT_FORMATTER_CONFIG_KIND_RANGE_MD, TT_FORMATTER_CONFIG_KIND_RANGE_TEX,
    TT_FORMATTER_CONFIG_KIND_RANGE_TYP, TT_FORMATTER_CONFIG_VERSION_V1,
    TT_REPORT_DATA_VERSION_V1, TT_REPORT_DATA_VIEW_VERSION_CURRENT,
};
use crate::stats::{build_statistic_items, StatisticItem};
use crate::tree::FlatForest;
use crate::FormatterError;

pub(crate) unsafe fn view_to_string(view: &TtStringView) -> String {
    if view.data.is_null() || view.length == 0 {
        return String::new();
    }
    let bytes = std::slice::from_raw_parts(view.data, view.length as usize);
    String::from_utf8_lossy(bytes).into_owned()
}

// ---------------------------------------------------------------------------
// Owned configuration values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DayLabels {
    pub title_prefix: String,
    pub report_title: String,
    pub date_label: String,
    pub total_time_label: String,
    pub status_label: String,
    pub sleep_label: String,
    pub getup_time_label: String,
    pub remark_label: String,
    pub exercise_label: String,
    pub no_records_message: String,
    pub statistics_label: String,
    pub all_activities_label: String,
    pub activity_remark_label: String,
    pub activity_connector: String,
    pub project_breakdown_label: String,
}

#[derive(Debug, Clone)]
pub struct RangeLabels {
    pub title_template: String,
    pub actual_days_label: String,
    pub status_days_label: String,
    pub sleep_days_label: String,
    pub exercise_days_label: String,
    pub cardio_days_label: String,
    pub anaerobic_days_label: String,
    pub total_time_label: String,
    pub no_records_message: String,
    pub invalid_message: String,
    pub project_breakdown_label: String,
}

#[derive(Debug, Clone)]
pub struct TexStyle {
    pub main_font: String,
    pub cjk_main_font: String,
    pub base_font_size: i32,
    pub report_title_font_size: i32,
    pub category_title_font_size: i32,
    pub margin_in: f64,
    pub list_top_sep_pt: f64,
    pub list_item_sep_ex: f64,
}

#[derive(Debug, Clone)]
pub struct TypstStyle {
    pub base_font: String,
    pub title_font: String,
    pub category_title_font: String,
    pub base_font_size: i32,
    pub report_title_font_size: i32,
    pub category_title_font_size: i32,
    pub line_spacing_em: f64,
    pub margin_top_cm: f64,
    pub margin_bottom_cm: f64,
    pub margin_left_cm: f64,
    pub margin_right_cm: f64,
}

#[derive(Debug, Clone)]
pub struct DayMdConfig {
    pub labels: DayLabels,
    pub statistics: Vec<StatisticItem>,
}

#[derive(Debug, Clone)]
pub struct DayTexConfig {
    pub labels: DayLabels,
    pub style: TexStyle,
    pub keyword_colors: Vec<(String, String)>,
    pub statistics: Vec<StatisticItem>,
}

#[derive(Debug, Clone)]
pub struct DayTypConfig {
    pub labels: DayLabels,
    pub style: TypstStyle,
    pub keyword_colors: Vec<(String, String)>,
    pub statistics: Vec<StatisticItem>,
    pub statistic_font_size: i32,
    pub statistic_title_font_size: i32,
}

#[derive(Debug, Clone)]
pub struct RangeTexConfig {
    pub labels: RangeLabels,
    pub style: TexStyle,
}

#[derive(Debug, Clone)]
pub struct RangeTypConfig {
    pub labels: RangeLabels,
    pub style: TypstStyle,
}

// ---------------------------------------------------------------------------
// Config descriptor validation
// ---------------------------------------------------------------------------

unsafe fn config_payload<'a, T>(
    config: &TtFormatterConfig,
    expected_kind: u32,
) -> Result<&'a T, FormatterError> {
    if config.struct_size as usize != size_of::<TtFormatterConfig>() {
        return Err(FormatterError::config_error(format!(
            "config descriptor struct_size mismatch: got {}, expected {}",
            config.struct_size,
            size_of::<TtFormatterConfig>()
        )));
    }
    if config.version != TT_FORMATTER_CONFIG_VERSION_V1
        || config.config_version != TT_FORMATTER_CONFIG_VERSION_V1
    {
        return Err(FormatterError::config_error(format!(
            "unsupported config version {} (payload version {})",
            config.version, config.config_version
        )));
    }
    if config.config_kind != expected_kind {
        return Err(FormatterError::config_error(format!(
            "unexpected config kind {}: this formatter expects kind {}",
            config.config_kind, expected_kind
        )));
    }
    if config.config_data.is_null() {
        return Err(FormatterError::config_error("config payload is null"));
    }
    if config.config_data_size as usize != size_of::<T>() {
        return Err(FormatterError::config_error(format!(
            "config payload size mismatch: got {}, expected {}",
            config.config_data_size,
            size_of::<T>()
        )));
    }
    Ok(&*config.config_data.cast::<T>())
}

fn check_payload_header(
    struct_size: u32,
    version: u32,
    expected_size: usize,
) -> Result<(), FormatterError> {
    if struct_size as usize != expected_size {
        return Err(FormatterError::config_error(format!(
            "payload struct_size mismatch: got {struct_size}, expected {expected_size}"
        )));
    }
    if version != TT_FORMATTER_CONFIG_VERSION_V1 {
        return Err(FormatterError::config_error(format!(
            "unsupported payload version {version}"
        )));
    }
    Ok(())
}

unsafe fn parse_day_labels(labels: &crate::abi::TtDayLabelsConfigV1) -> DayLabels {
    DayLabels {
        title_prefix: view_to_string(&labels.title_prefix),
        report_title: view_to_string(&labels.report_title),
        date_label: view_to_string(&labels.date_label),
        total_time_label: view_to_string(&labels.total_time_label),
        status_label: view_to_string(&labels.status_label),
        sleep_label: view_to_string(&labels.sleep_label),
        getup_time_label: view_to_string(&labels.getup_time_label),
        remark_label: view_to_string(&labels.remark_label),
        exercise_label: view_to_string(&labels.exercise_label),
        no_records_message: view_to_string(&labels.no_records_message),
        statistics_label: view_to_string(&labels.statistics_label),
        all_activities_label: view_to_string(&labels.all_activities_label),
        activity_remark_label: view_to_string(&labels.activity_remark_label),
        activity_connector: view_to_string(&labels.activity_connector),
        project_breakdown_label: view_to_string(&labels.project_breakdown_label),
    }
}

unsafe fn parse_month_labels(labels: &TtMonthLabelsConfigV1) -> RangeLabels {
    RangeLabels {
        title_template: view_to_string(&labels.title_template),
        actual_days_label: view_to_string(&labels.actual_days_label),
        status_days_label: view_to_string(&labels.status_days_label),
        sleep_days_label: view_to_string(&labels.sleep_days_label),
        exercise_days_label: view_to_string(&labels.exercise_days_label),
        cardio_days_label: view_to_string(&labels.cardio_days_label),
        anaerobic_days_label: view_to_string(&labels.anaerobic_days_label),
        total_time_label: view_to_string(&labels.total_time_label),
        no_records_message: view_to_string(&labels.no_records_message),
        invalid_message: view_to_string(&labels.invalid_format_message),
        project_breakdown_label: view_to_string(&labels.project_breakdown_label),
    }
}

unsafe fn parse_range_labels(labels: &TtRangeLabelsConfigV1) -> RangeLabels {
    RangeLabels {
        title_template: view_to_string(&labels.title_template),
        actual_days_label: view_to_string(&labels.actual_days_label),
        status_days_label: view_to_string(&labels.status_days_label),
        sleep_days_label: view_to_string(&labels.sleep_days_label),
        exercise_days_label: view_to_string(&labels.exercise_days_label),
        cardio_days_label: view_to_string(&labels.cardio_days_label),
        anaerobic_days_label: view_to_string(&labels.anaerobic_days_label),
        total_time_label: view_to_string(&labels.total_time_label),
        no_records_message: view_to_string(&labels.no_records_message),
        invalid_message: view_to_string(&labels.invalid_range_message),
        project_breakdown_label: view_to_string(&labels.project_breakdown_label),
    }
}

unsafe fn parse_tex_style(style: &TtTexStyleConfigV1) -> TexStyle {
    TexStyle {
        main_font: view_to_string(&style.main_font),
        cjk_main_font: view_to_string(&style.cjk_main_font),
        base_font_size: style.base_font_size,
        report_title_font_size: style.report_title_font_size,
        category_title_font_size: style.category_title_font_size,
        margin_in: style.margin_in,
        list_top_sep_pt: style.list_top_sep_pt,
        list_item_sep_ex: style.list_item_sep_ex,
    }
}

unsafe fn parse_typst_style(style: &TtTypstStyleConfigV1) -> TypstStyle {
    TypstStyle {
        base_font: view_to_string(&style.base_font),
        title_font: view_to_string(&style.title_font),
        category_title_font: view_to_string(&style.category_title_font),
        base_font_size: style.base_font_size,
        report_title_font_size: style.report_title_font_size,
        category_title_font_size: style.category_title_font_size,
        line_spacing_em: style.line_spacing_em,
        margin_top_cm: style.margin_top_cm,
        margin_bottom_cm: style.margin_bottom_cm,
        margin_left_cm: style.margin_left_cm,
        margin_right_cm: style.margin_right_cm,
    }
}

/// Sorted by keyword so iteration (and first-match coloring) is
/// deterministic regardless of the order the host supplied.
unsafe fn parse_keyword_colors(
    colors: *const TtFormatterKeywordColorV1,
    count: u32,
) -> Vec<(String, String)> {
    if colors.is_null() || count == 0 {
        return Vec::new();
    }
    let mut parsed: Vec<(String, String)> = std::slice::from_raw_parts(colors, count as usize)
        .iter()
        .map(|pair| (view_to_string(&pair.keyword), view_to_string(&pair.color)))
        .collect();
    parsed.sort();
    parsed
}

pub unsafe fn parse_day_md_config(config: &TtFormatterConfig) -> Result<DayMdConfig, FormatterError> {
    let payload: &TtDayMdConfigV1 = config_payload(config, TT_FORMATTER_CONFIG_KIND_DAY_MD)?;
    check_payload_header(payload.struct_size, payload.version, size_of::<TtDayMdConfigV1>())?;
    Ok(DayMdConfig {
        labels: parse_day_labels(&payload.labels),
        statistics: build_statistic_items(payload.statistics_items, payload.statistics_item_count)?,
    })
}

pub unsafe fn parse_day_tex_config(
    config: &TtFormatterConfig,
) -> Result<DayTexConfig, FormatterError> {
    let payload: &TtDayTexConfigV1 = config_payload(config, TT_FORMATTER_CONFIG_KIND_DAY_TEX)?;
    check_payload_header(payload.struct_size, payload.version, size_of::<TtDayTexConfigV1>())?;
    Ok(DayTexConfig {
        labels: parse_day_labels(&payload.labels),
        style: parse_tex_style(&payload.style),
        keyword_colors: parse_keyword_colors(payload.keyword_colors, payload.keyword_color_count),
        statistics: build_statistic_items(payload.statistics_items, payload.statistics_item_count)?,
    })
}

pub unsafe fn parse_day_typ_config(
    config: &TtFormatterConfig,
) -> Result<DayTypConfig, FormatterError> {
    let payload: &TtDayTypConfigV1 = config_payload(config, TT_FORMATTER_CONFIG_KIND_DAY_TYP)?;
    check_payload_header(payload.struct_size, payload.version, size_of::<TtDayTypConfigV1>())?;
    Ok(DayTypConfig {
        labels: parse_day_labels(&payload.labels),
        style: parse_typst_style(&payload.style),
        keyword_colors: parse_keyword_colors(payload.keyword_colors, payload.keyword_color_count),
        statistics: build_statistic_items(payload.statistics_items, payload.statistics_item_count)?,
        statistic_font_size: payload.statistic_font_size,
        statistic_title_font_size: payload.statistic_title_font_size,
    })
}

/// Month and range labels share one owned shape; the `expected_kind`
/// selects which payload struct is read.
pub unsafe fn parse_range_like_md_config(
    config: &TtFormatterConfig,
    expected_kind: u32,
) -> Result<RangeLabels, FormatterError> {
    match expected_kind {
        TT_FORMATTER_CONFIG_KIND_MONTH_MD => {
            let payload: &TtMonthMdConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtMonthMdConfigV1>(),
            )?;
            Ok(parse_month_labels(&payload.labels))
        }
        TT_FORMATTER_CONFIG_KIND_RANGE_MD => {
            let payload: &TtRangeMdConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtRangeMdConfigV1>(),
            )?;
            Ok(parse_range_labels(&payload.labels))
        }
        other => Err(FormatterError::config_error(format!(
            "config kind {other} is not a markdown range-like kind"
        ))),
    }
}

pub unsafe fn parse_range_like_tex_config(
    config: &TtFormatterConfig,
    expected_kind: u32,
) -> Result<RangeTexConfig, FormatterError> {
    match expected_kind {
        TT_FORMATTER_CONFIG_KIND_MONTH_TEX => {
            let payload: &TtMonthTexConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtMonthTexConfigV1>(),
            )?;
            Ok(RangeTexConfig {
                labels: parse_month_labels(&payload.labels),
                style: parse_tex_style(&payload.style),
            })
        }
        TT_FORMATTER_CONFIG_KIND_RANGE_TEX => {
            let payload: &TtRangeTexConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtRangeTexConfigV1>(),
            )?;
            Ok(RangeTexConfig {
                labels: parse_range_labels(&payload.labels),
                style: parse_tex_style(&payload.style),
            })
        }
        other => Err(FormatterError::config_error(format!(
            "config kind {other} is not a LaTeX range-like kind"
        ))),
    }
}

pub unsafe fn parse_range_like_typ_config(
    config: &TtFormatterConfig,
    expected_kind: u32,
) -> Result<RangeTypConfig, FormatterError> {
    match expected_kind {
        TT_FORMATTER_CONFIG_KIND_MONTH_TYP => {
            let payload: &TtMonthTypConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtMonthTypConfigV1>(),
            )?;
            Ok(RangeTypConfig {
                labels: parse_month_labels(&payload.labels),
                style: parse_typst_style(&payload.style),
            })
        }
        TT_FORMATTER_CONFIG_KIND_RANGE_TYP => {
            let payload: &TtRangeTypConfigV1 = config_payload(config, expected_kind)?;
            check_payload_header(
                payload.struct_size,
                payload.version,
                size_of::<TtRangeTypConfigV1>(),
            )?;
            Ok(RangeTypConfig {
                labels: parse_range_labels(&payload.labels),
                style: parse_typst_style(&payload.style),
            })
        }
        other => Err(FormatterError::config_error(format!(
            "config kind {other} is not a Typst range-like kind"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Owned report data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DayMetadata {
    pub status: String,
    pub sleep: String,
    pub remark: String,
    pub getup_time: String,
    pub exercise: String,
}

#[derive(Debug, Clone)]
pub struct TimeRecord {
    pub start_time: String,
    pub end_time: String,
    pub project_path: String,
    pub duration_seconds: i64,
    pub activity_remark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DailyReportView {
    pub date: String,
    pub metadata: DayMetadata,
    pub total_duration: i64,
    pub detailed_records: Vec<TimeRecord>,
    pub stats: Vec<(String, i64)>,
    pub tree: FlatForest,
}

impl DailyReportView {
    #[must_use]
    pub fn stat(&self, column: &str) -> i64 {
        self.stats
            .iter()
            .find(|(key, _)| key == column)
            .map_or(0, |(_, value)| *value)
    }
}

#[derive(Debug, Clone)]
pub struct RangeReportView {
    pub range_label: String,
    pub start_date: String,
    pub end_date: String,
    pub requested_days: i32,
    pub total_duration: i64,
    pub actual_days: i32,
    pub status_true_days: i32,
    pub sleep_true_days: i32,
    pub exercise_true_days: i32,
    pub cardio_true_days: i32,
    pub anaerobic_true_days: i32,
    pub is_valid: bool,
    pub tree: FlatForest,
}

unsafe fn report_payload<'a, T>(view: &TtReportDataView) -> Result<&'a T, FormatterError> {
    if view.struct_size as usize != size_of::<TtReportDataView>() {
        return Err(FormatterError::invalid_argument(format!(
            "report descriptor struct_size mismatch: got {}, expected {}",
            view.struct_size,
            size_of::<TtReportDataView>()
        )));
    }
    if view.version != TT_REPORT_DATA_VIEW_VERSION_CURRENT {
        return Err(FormatterError::invalid_argument(format!(
            "unsupported report descriptor version {}",
            view.version
        )));
    }
    if view.report_data_version != TT_REPORT_DATA_VERSION_V1 {
        return Err(FormatterError::invalid_argument(format!(
            "unsupported report data version {}",
            view.report_data_version
        )));
    }
    if view.report_data.is_null() {
        return Err(FormatterError::invalid_argument("report payload is null"));
    }
    if view.report_data_size as usize != size_of::<T>() {
        return Err(FormatterError::invalid_argument(format!(
            "report payload size mismatch: got {}, expected {}",
            view.report_data_size,
            size_of::<T>()
        )));
    }
    Ok(&*view.report_data.cast::<T>())
}

pub unsafe fn parse_daily_report(
    view: &TtReportDataView,
) -> Result<DailyReportView, FormatterError> {
    let payload: &TtDailyReportDataV1 = report_payload(view)?;
    if payload.struct_size as usize != size_of::<TtDailyReportDataV1>()
        || payload.version != TT_REPORT_DATA_VERSION_V1
    {
        return Err(FormatterError::invalid_argument(
            "daily report payload header mismatch",
        ));
    }

    let mut detailed_records = Vec::with_capacity(payload.detailed_record_count as usize);
    if !payload.detailed_records.is_null() {
        for record in std::slice::from_raw_parts(
            payload.detailed_records,
            payload.detailed_record_count as usize,
        ) {
            detailed_records.push(TimeRecord {
                start_time: view_to_string(&record.start_time),
                end_time: view_to_string(&record.end_time),
                project_path: view_to_string(&record.project_path),
                duration_seconds: record.duration_seconds,
                activity_remark: (record.has_activity_remark != 0)
                    .then(|| view_to_string(&record.activity_remark)),
            });
        }
    }

    let mut stats = Vec::with_capacity(payload.stats_count as usize);
    if !payload.stats.is_null() {
        for pair in std::slice::from_raw_parts(payload.stats, payload.stats_count as usize) {
            stats.push((view_to_string(&pair.key), pair.value));
        }
    }

    Ok(DailyReportView {
        date: view_to_string(&payload.date),
        metadata: DayMetadata {
            status: view_to_string(&payload.metadata.status),
            sleep: view_to_string(&payload.metadata.sleep),
            remark: view_to_string(&payload.metadata.remark),
            getup_time: view_to_string(&payload.metadata.getup_time),
            exercise: view_to_string(&payload.metadata.exercise),
        },
        total_duration: payload.total_duration,
        detailed_records,
        stats,
        tree: FlatForest::parse(payload.project_tree_nodes, payload.project_tree_node_count),
    })
}

pub unsafe fn parse_range_report(
    view: &TtReportDataView,
) -> Result<RangeReportView, FormatterError> {
    let payload: &TtRangeReportDataV1 = report_payload(view)?;
    if payload.struct_size as usize != size_of::<TtRangeReportDataV1>()
        || payload.version != TT_REPORT_DATA_VERSION_V1
    {
        return Err(FormatterError::invalid_argument(
            "range report payload header mismatch",
        ));
    }

    Ok(RangeReportView {
        range_label: view_to_string(&payload.range_label),
        start_date: view_to_string(&payload.start_date),
        end_date: view_to_string(&payload.end_date),
        requested_days: payload.requested_days,
        total_duration: payload.total_duration,
        actual_days: payload.actual_days,
        status_true_days: payload.status_true_days,
        sleep_true_days: payload.sleep_true_days,
        exercise_true_days: payload.exercise_true_days,
        cardio_true_days: payload.cardio_true_days,
        anaerobic_true_days: payload.anaerobic_true_days,
        is_valid: payload.is_valid != 0,
        tree: FlatForest::parse(payload.project_tree_nodes, payload.project_tree_node_count),
    })
}
