//! Formatter configuration: typed TOML sections with complete defaults,
//! lowered into the versioned ABI config structs.
//!
//! The lowered payload owns every string it exposes, so the borrowed
//! `TtStringView`s stay valid for the whole `tt_createFormatter` call.

use std::collections::BTreeMap;
use std::mem::size_of;
use std::path::Path;

use serde::Deserialize;
use tracer_formatter_abi::{
    TtDayLabelsConfigV1, TtDayMdConfigV1, TtDayTexConfigV1, TtDayTypConfigV1, TtFormatterConfig,
    TtFormatterKeywordColorV1, TtFormatterStatisticItemNodeV1, TtMonthLabelsConfigV1,
    TtMonthMdConfigV1, TtMonthTexConfigV1, TtMonthTypConfigV1, TtRangeLabelsConfigV1,
    TtRangeMdConfigV1, TtRangeTexConfigV1, TtRangeTypConfigV1, TtStringView, TtTexStyleConfigV1,
    TtTypstStyleConfigV1, TT_FORMATTER_CONFIG_KIND_DAY_MD, TT_FORMATTER_CONFIG_KIND_DAY_TEX,
    TT_FORMATTER_CONFIG_KIND_DAY_TYP, TT_FORMATTER_CONFIG_KIND_MONTH_MD,
    TT_FORMATTER_CONFIG_KIND_MONTH_TEX, TT_FORMATTER_CONFIG_KIND_MONTH_TYP,
    TT_FORMATTER_CONFIG_KIND_RANGE_MD, TT_FORMATTER_CONFIG_KIND_RANGE_TEX,
    TT_FORMATTER_CONFIG_KIND_RANGE_TYP, TT_FORMATTER_CONFIG_VERSION_V1,
};

use crate::domain::reports::{ReportFormat, ReportKind};

// ---------------------------------------------------------------------------
// TOML sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayLabelsSection {
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

impl Default for DayLabelsSection {
    fn default() -> Self {
        Self {
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
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RangeLabelsSection {
    pub report_title: String,
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

impl Default for RangeLabelsSection {
    fn default() -> Self {
        Self {
            report_title: String::new(),
            title_template: "Report {}".to_string(),
            actual_days_label: "Actual Days".to_string(),
            status_days_label: "Status Days".to_string(),
            sleep_days_label: "Sleep Days".to_string(),
            exercise_days_label: "Exercise Days".to_string(),
            cardio_days_label: "Cardio Days".to_string(),
            anaerobic_days_label: "Anaerobic Days".to_string(),
            total_time_label: "Total Time".to_string(),
            no_records_message: "No records in this range.".to_string(),
            invalid_message: "Invalid range.".to_string(),
            project_breakdown_label: "Project Breakdown".to_string(),
        }
    }
}

fn month_labels_default() -> RangeLabelsSection {
    RangeLabelsSection {
        report_title: "Monthly Report".to_string(),
        title_template: "Monthly Report {}".to_string(),
        invalid_message: "Invalid month format.".to_string(),
        ..RangeLabelsSection::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TexStyleSection {
    pub main_font: String,
    pub cjk_main_font: String,
    pub base_font_size: i32,
    pub report_title_font_size: i32,
    pub category_title_font_size: i32,
    pub margin_in: f64,
    pub list_top_sep_pt: f64,
    pub list_item_sep_ex: f64,
}

impl Default for TexStyleSection {
    fn default() -> Self {
        Self {
            main_font: "Noto Serif".to_string(),
            cjk_main_font: "Noto Serif CJK SC".to_string(),
            base_font_size: 10,
            report_title_font_size: 14,
            category_title_font_size: 12,
            margin_in: 1.0,
            list_top_sep_pt: 0.0,
            list_item_sep_ex: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypstStyleSection {
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

impl Default for TypstStyleSection {
    fn default() -> Self {
        Self {
            base_font: "Noto Sans".to_string(),
            title_font: "Noto Sans".to_string(),
            category_title_font: "Noto Sans".to_string(),
            base_font_size: 11,
            report_title_font_size: 16,
            category_title_font_size: 14,
            line_spacing_em: 0.5,
            margin_top_cm: 2.0,
            margin_bottom_cm: 2.0,
            margin_left_cm: 2.5,
            margin_right_cm: 2.5,
        }
    }
}

/// One statistics line, flat with an explicit parent index (`-1` roots,
/// otherwise an earlier index).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatisticItemSection {
    pub label: String,
    pub db_column: String,
    pub show: bool,
    pub parent_index: i32,
}

impl Default for StatisticItemSection {
    fn default() -> Self {
        Self {
            label: String::new(),
            db_column: String::new(),
            show: true,
            parent_index: -1,
        }
    }
}

fn default_statistics() -> Vec<StatisticItemSection> {
    let item = |label: &str, db_column: &str, parent_index: i32| StatisticItemSection {
        label: label.to_string(),
        db_column: db_column.to_string(),
        show: true,
        parent_index,
    };
    vec![
        item("Sleep", "sleep_total_time", -1),
        item("Exercise", "total_exercise_time", -1),
        item("Anaerobic", "anaerobic_time", 1),
        item("Cardio", "cardio_time", 1),
        item("Grooming", "grooming_time", -1),
        item("Study", "study_time", -1),
        item("Recreation", "recreation_time", -1),
        item("Zhihu", "recreation_zhihu_time", 6),
        item("Bilibili", "recreation_bilibili_time", 6),
        item("Douyin", "recreation_douyin_time", 6),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayMdSection {
    pub labels: DayLabelsSection,
    pub statistics: Vec<StatisticItemSection>,
}

impl Default for DayMdSection {
    fn default() -> Self {
        Self {
            labels: DayLabelsSection::default(),
            statistics: default_statistics(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayTexSection {
    pub labels: DayLabelsSection,
    pub style: TexStyleSection,
    pub keyword_colors: BTreeMap<String, String>,
    pub statistics: Vec<StatisticItemSection>,
}

impl Default for DayTexSection {
    fn default() -> Self {
        Self {
            labels: DayLabelsSection::default(),
            style: TexStyleSection::default(),
            keyword_colors: BTreeMap::new(),
            statistics: default_statistics(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayTypSection {
    pub labels: DayLabelsSection,
    pub style: TypstStyleSection,
    pub keyword_colors: BTreeMap<String, String>,
    pub statistics: Vec<StatisticItemSection>,
    pub statistic_font_size: i32,
    pub statistic_title_font_size: i32,
}

impl Default for DayTypSection {
    fn default() -> Self {
        Self {
            labels: DayLabelsSection::default(),
            style: TypstStyleSection::default(),
            keyword_colors: BTreeMap::new(),
            statistics: default_statistics(),
            statistic_font_size: 10,
            statistic_title_font_size: 12,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RangeMdSection {
    pub labels: RangeLabelsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RangeTexSection {
    pub labels: RangeLabelsSection,
    pub style: TexStyleSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RangeTypSection {
    pub labels: RangeLabelsSection,
    pub style: TypstStyleSection,
}

fn month_md_default() -> RangeMdSection {
    RangeMdSection {
        labels: month_labels_default(),
    }
}

fn month_tex_default() -> RangeTexSection {
    RangeTexSection {
        labels: month_labels_default(),
        style: TexStyleSection::default(),
    }
}

fn month_typ_default() -> RangeTypSection {
    RangeTypSection {
        labels: month_labels_default(),
        style: TypstStyleSection::default(),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub day_md: DayMdSection,
    pub day_tex: DayTexSection,
    pub day_typ: DayTypSection,
    #[serde(default = "month_md_default")]
    pub month_md: RangeMdSection,
    #[serde(default = "month_tex_default")]
    pub month_tex: RangeTexSection,
    #[serde(default = "month_typ_default")]
    pub month_typ: RangeTypSection,
    pub range_md: RangeMdSection,
    pub range_tex: RangeTexSection,
    pub range_typ: RangeTypSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            day_md: DayMdSection::default(),
            day_tex: DayTexSection::default(),
            day_typ: DayTypSection::default(),
            month_md: month_md_default(),
            month_tex: month_tex_default(),
            month_typ: month_typ_default(),
            range_md: RangeMdSection::default(),
            range_tex: RangeTexSection::default(),
            range_typ: RangeTypSection::default(),
        }
    }
}

impl AppConfig {
    /// Loads from TOML; a missing file yields the defaults, a malformed
    /// file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

// ---------------------------------------------------------------------------
// Lowering into ABI payloads
// ---------------------------------------------------------------------------

/// String arena: the views point at the `String` heap buffers, which stay
/// put when the vector grows.
#[derive(Default)]
struct StringArena {
    strings: Vec<String>,
}

impl StringArena {
    fn view(&mut self, text: &str) -> TtStringView {
        self.strings.push(text.to_string());
        TtStringView::from_str(self.strings.last().expect("just pushed"))
    }
}

enum PayloadBox {
    DayMd(Box<TtDayMdConfigV1>),
    DayTex(Box<TtDayTexConfigV1>),
    DayTyp(Box<TtDayTypConfigV1>),
    MonthMd(Box<TtMonthMdConfigV1>),
    MonthTex(Box<TtMonthTexConfigV1>),
    MonthTyp(Box<TtMonthTypConfigV1>),
    RangeMd(Box<TtRangeMdConfigV1>),
    RangeTex(Box<TtRangeTexConfigV1>),
    RangeTyp(Box<TtRangeTypConfigV1>),
}

impl PayloadBox {
    fn descriptor_parts(&self) -> (u32, *const std::ffi::c_void, u64) {
        match self {
            PayloadBox::DayMd(payload) => (
                TT_FORMATTER_CONFIG_KIND_DAY_MD,
                (&**payload as *const TtDayMdConfigV1).cast(),
                size_of::<TtDayMdConfigV1>() as u64,
            ),
            PayloadBox::DayTex(payload) => (
                TT_FORMATTER_CONFIG_KIND_DAY_TEX,
                (&**payload as *const TtDayTexConfigV1).cast(),
                size_of::<TtDayTexConfigV1>() as u64,
            ),
            PayloadBox::DayTyp(payload) => (
                TT_FORMATTER_CONFIG_KIND_DAY_TYP,
                (&**payload as *const TtDayTypConfigV1).cast(),
                size_of::<TtDayTypConfigV1>() as u64,
            ),
            PayloadBox::MonthMd(payload) => (
                TT_FORMATTER_CONFIG_KIND_MONTH_MD,
                (&**payload as *const TtMonthMdConfigV1).cast(),
                size_of::<TtMonthMdConfigV1>() as u64,
            ),
            PayloadBox::MonthTex(payload) => (
                TT_FORMATTER_CONFIG_KIND_MONTH_TEX,
                (&**payload as *const TtMonthTexConfigV1).cast(),
                size_of::<TtMonthTexConfigV1>() as u64,
            ),
            PayloadBox::MonthTyp(payload) => (
                TT_FORMATTER_CONFIG_KIND_MONTH_TYP,
                (&**payload as *const TtMonthTypConfigV1).cast(),
                size_of::<TtMonthTypConfigV1>() as u64,
            ),
            PayloadBox::RangeMd(payload) => (
                TT_FORMATTER_CONFIG_KIND_RANGE_MD,
                (&**payload as *const TtRangeMdConfigV1).cast(),
                size_of::<TtRangeMdConfigV1>() as u64,
            ),
            PayloadBox::RangeTex(payload) => (
                TT_FORMATTER_CONFIG_KIND_RANGE_TEX,
                (&**payload as *const TtRangeTexConfigV1).cast(),
                size_of::<TtRangeTexConfigV1>() as u64,
            ),
            PayloadBox::RangeTyp(payload) => (
                TT_FORMATTER_CONFIG_KIND_RANGE_TYP,
                (&**payload as *const TtRangeTypConfigV1).cast(),
                size_of::<TtRangeTypConfigV1>() as u64,
            ),
        }
    }
}

/// Owned, lowered formatter configuration. Keep this alive for the whole
/// `tt_createFormatter` call; the descriptor borrows everything from it.
pub struct ConfigPayload {
    _arena: StringArena,
    _keyword_colors: Vec<TtFormatterKeywordColorV1>,
    _statistic_items: Vec<TtFormatterStatisticItemNodeV1>,
    _payload: PayloadBox,
    descriptor: TtFormatterConfig,
}

impl ConfigPayload {
    #[must_use]
    pub fn build(config: &AppConfig, kind: ReportKind, format: ReportFormat) -> Self {
        let mut arena = StringArena::default();

        let (keyword_colors, statistic_items, payload) = match (kind, format) {
            (ReportKind::Daily, ReportFormat::Markdown) => {
                let items = lower_statistics(&mut arena, &config.day_md.statistics);
                let labels = lower_day_labels(&mut arena, &config.day_md.labels);
                let payload = Box::new(TtDayMdConfigV1 {
                    struct_size: size_of::<TtDayMdConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    statistics_items: items.as_ptr(),
                    statistics_item_count: items.len() as u32,
                    reserved: 0,
                });
                (Vec::new(), items, PayloadBox::DayMd(payload))
            }
            (ReportKind::Daily, ReportFormat::LaTeX) => {
                let section = &config.day_tex;
                let items = lower_statistics(&mut arena, &section.statistics);
                let colors = lower_keyword_colors(&mut arena, &section.keyword_colors);
                let labels = lower_day_labels(&mut arena, &section.labels);
                let style = lower_tex_style(&mut arena, &section.style);
                let payload = Box::new(TtDayTexConfigV1 {
                    struct_size: size_of::<TtDayTexConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                    keyword_colors: colors.as_ptr(),
                    keyword_color_count: colors.len() as u32,
                    statistics_items: items.as_ptr(),
                    statistics_item_count: items.len() as u32,
                });
                (colors, items, PayloadBox::DayTex(payload))
            }
            (ReportKind::Daily, ReportFormat::Typst) => {
                let section = &config.day_typ;
                let items = lower_statistics(&mut arena, &section.statistics);
                let colors = lower_keyword_colors(&mut arena, &section.keyword_colors);
                let labels = lower_day_labels(&mut arena, &section.labels);
                let style = lower_typst_style(&mut arena, &section.style);
                let payload = Box::new(TtDayTypConfigV1 {
                    struct_size: size_of::<TtDayTypConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                    keyword_colors: colors.as_ptr(),
                    keyword_color_count: colors.len() as u32,
                    statistics_items: items.as_ptr(),
                    statistics_item_count: items.len() as u32,
                    statistic_font_size: section.statistic_font_size,
                    statistic_title_font_size: section.statistic_title_font_size,
                });
                (colors, items, PayloadBox::DayTyp(payload))
            }
            (ReportKind::Monthly, ReportFormat::Markdown) => {
                let labels = lower_month_labels(&mut arena, &config.month_md.labels);
                let payload = Box::new(TtMonthMdConfigV1 {
                    struct_size: size_of::<TtMonthMdConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                });
                (Vec::new(), Vec::new(), PayloadBox::MonthMd(payload))
            }
            (ReportKind::Monthly, ReportFormat::LaTeX) => {
                let labels = lower_month_labels(&mut arena, &config.month_tex.labels);
                let style = lower_tex_style(&mut arena, &config.month_tex.style);
                let payload = Box::new(TtMonthTexConfigV1 {
                    struct_size: size_of::<TtMonthTexConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                });
                (Vec::new(), Vec::new(), PayloadBox::MonthTex(payload))
            }
            (ReportKind::Monthly, ReportFormat::Typst) => {
                let labels = lower_month_labels(&mut arena, &config.month_typ.labels);
                let style = lower_typst_style(&mut arena, &config.month_typ.style);
                let payload = Box::new(TtMonthTypConfigV1 {
                    struct_size: size_of::<TtMonthTypConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                });
                (Vec::new(), Vec::new(), PayloadBox::MonthTyp(payload))
            }
            (_, ReportFormat::Markdown) => {
                let labels = lower_range_labels(&mut arena, &config.range_md.labels);
                let payload = Box::new(TtRangeMdConfigV1 {
                    struct_size: size_of::<TtRangeMdConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                });
                (Vec::new(), Vec::new(), PayloadBox::RangeMd(payload))
            }
            (_, ReportFormat::LaTeX) => {
                let labels = lower_range_labels(&mut arena, &config.range_tex.labels);
                let style = lower_tex_style(&mut arena, &config.range_tex.style);
                let payload = Box::new(TtRangeTexConfigV1 {
                    struct_size: size_of::<TtRangeTexConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                });
                (Vec::new(), Vec::new(), PayloadBox::RangeTex(payload))
            }
            (_, ReportFormat::Typst) => {
                let labels = lower_range_labels(&mut arena, &config.range_typ.labels);
                let style = lower_typst_style(&mut arena, &config.range_typ.style);
                let payload = Box::new(TtRangeTypConfigV1 {
                    struct_size: size_of::<TtRangeTypConfigV1>() as u32,
                    version: TT_FORMATTER_CONFIG_VERSION_V1,
                    labels,
                    style,
                });
                (Vec::new(), Vec::new(), PayloadBox::RangeTyp(payload))
            }
        };

        let (config_kind, config_data, config_data_size) = payload.descriptor_parts();
        let descriptor = TtFormatterConfig {
            struct_size: size_of::<TtFormatterConfig>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_kind,
            config_version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_data,
            config_data_size,
        };

        Self {
            _arena: arena,
            _keyword_colors: keyword_colors,
            _statistic_items: statistic_items,
            _payload: payload,
            descriptor,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &TtFormatterConfig {
        &self.descriptor
    }
}

fn lower_day_labels(arena: &mut StringArena, labels: &DayLabelsSection) -> TtDayLabelsConfigV1 {
    TtDayLabelsConfigV1 {
        title_prefix: arena.view(&labels.title_prefix),
        report_title: arena.view(&labels.report_title),
        date_label: arena.view(&labels.date_label),
        total_time_label: arena.view(&labels.total_time_label),
        status_label: arena.view(&labels.status_label),
        sleep_label: arena.view(&labels.sleep_label),
        getup_time_label: arena.view(&labels.getup_time_label),
        remark_label: arena.view(&labels.remark_label),
        exercise_label: arena.view(&labels.exercise_label),
        no_records_message: arena.view(&labels.no_records_message),
        statistics_label: arena.view(&labels.statistics_label),
        all_activities_label: arena.view(&labels.all_activities_label),
        activity_remark_label: arena.view(&labels.activity_remark_label),
        activity_connector: arena.view(&labels.activity_connector),
        project_breakdown_label: arena.view(&labels.project_breakdown_label),
    }
}

fn lower_month_labels(arena: &mut StringArena, labels: &RangeLabelsSection) -> TtMonthLabelsConfigV1 {
    TtMonthLabelsConfigV1 {
        report_title: arena.view(&labels.report_title),
        title_template: arena.view(&labels.title_template),
        actual_days_label: arena.view(&labels.actual_days_label),
        status_days_label: arena.view(&labels.status_days_label),
        sleep_days_label: arena.view(&labels.sleep_days_label),
        exercise_days_label: arena.view(&labels.exercise_days_label),
        cardio_days_label: arena.view(&labels.cardio_days_label),
        anaerobic_days_label: arena.view(&labels.anaerobic_days_label),
        total_time_label: arena.view(&labels.total_time_label),
        no_records_message: arena.view(&labels.no_records_message),
        invalid_format_message: arena.view(&labels.invalid_message),
        project_breakdown_label: arena.view(&labels.project_breakdown_label),
    }
}

fn lower_range_labels(arena: &mut StringArena, labels: &RangeLabelsSection) -> TtRangeLabelsConfigV1 {
    TtRangeLabelsConfigV1 {
        title_template: arena.view(&labels.title_template),
        actual_days_label: arena.view(&labels.actual_days_label),
        status_days_label: arena.view(&labels.status_days_label),
        sleep_days_label: arena.view(&labels.sleep_days_label),
        exercise_days_label: arena.view(&labels.exercise_days_label),
        cardio_days_label: arena.view(&labels.cardio_days_label),
        anaerobic_days_label: arena.view(&labels.anaerobic_days_label),
        total_time_label: arena.view(&labels.total_time_label),
        no_records_message: arena.view(&labels.no_records_message),
        invalid_range_message: arena.view(&labels.invalid_message),
        project_breakdown_label: arena.view(&labels.project_breakdown_label),
    }
}

fn lower_tex_style(arena: &mut StringArena, style: &TexStyleSection) -> TtTexStyleConfigV1 {
    TtTexStyleConfigV1 {
        main_font: arena.view(&style.main_font),
        cjk_main_font: arena.view(&style.cjk_main_font),
        base_font_size: style.base_font_size,
        report_title_font_size: style.report_title_font_size,
        category_title_font_size: style.category_title_font_size,
        margin_in: style.margin_in,
        list_top_sep_pt: style.list_top_sep_pt,
        list_item_sep_ex: style.list_item_sep_ex,
    }
}

fn lower_typst_style(arena: &mut StringArena, style: &TypstStyleSection) -> TtTypstStyleConfigV1 {
    TtTypstStyleConfigV1 {
        base_font: arena.view(&style.base_font),
        title_font: arena.view(&style.title_font),
        category_title_font: arena.view(&style.category_title_font),
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

fn lower_keyword_colors(
    arena: &mut StringArena,
    colors: &BTreeMap<String, String>,
) -> Vec<TtFormatterKeywordColorV1> {
    colors
        .iter()
        .map(|(keyword, color)| TtFormatterKeywordColorV1 {
            keyword: arena.view(keyword),
            color: arena.view(color),
        })
        .collect()
}

fn lower_statistics(
    arena: &mut StringArena,
    items: &[StatisticItemSection],
) -> Vec<TtFormatterStatisticItemNodeV1> {
    items
        .iter()
        .map(|item| TtFormatterStatisticItemNodeV1 {
            label: arena.view(&item.label),
            db_column: arena.view(&item.db_column),
            show: u8::from(item.show),
            reserved0: [0; 3],
            parent_index: item.parent_index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = AppConfig::default();
        assert_eq!(config.day_md.labels.total_time_label, "Total Time");
        assert_eq!(config.month_md.labels.title_template, "Monthly Report {}");
        assert_eq!(config.month_md.labels.invalid_message, "Invalid month format.");
        assert_eq!(config.range_md.labels.title_template, "Report {}");
        assert_eq!(config.day_md.statistics.len(), 10);
        assert_eq!(config.day_md.statistics[2].parent_index, 1);
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let config: AppConfig = toml::from_str(
            r##"
            [day_md.labels]
            title_prefix = "Tagesbericht"

            [day_typ.keyword_colors]
            study = "#336699"

            [range_typ.labels]
            title_template = "Weekly {}"
            "##,
        )
        .unwrap();

        assert_eq!(config.day_md.labels.title_prefix, "Tagesbericht");
        assert_eq!(config.day_md.labels.date_label, "Date");
        assert_eq!(config.day_typ.keyword_colors["study"], "#336699");
        assert_eq!(config.range_typ.labels.title_template, "Weekly {}");
    }

    #[test]
    fn lowered_payload_matches_its_descriptor() {
        let config = AppConfig::default();
        let payload = ConfigPayload::build(&config, ReportKind::Daily, ReportFormat::Markdown);
        let descriptor = payload.descriptor();

        assert_eq!(descriptor.config_kind, TT_FORMATTER_CONFIG_KIND_DAY_MD);
        assert_eq!(
            descriptor.config_data_size,
            size_of::<TtDayMdConfigV1>() as u64
        );
        assert!(!descriptor.config_data.is_null());

        let day_md = unsafe { &*descriptor.config_data.cast::<TtDayMdConfigV1>() };
        assert_eq!(day_md.statistics_item_count, 10);
        let label = unsafe {
            std::slice::from_raw_parts(
                day_md.labels.title_prefix.data,
                day_md.labels.title_prefix.length as usize,
            )
        };
        assert_eq!(std::str::from_utf8(label).unwrap(), "Daily Report");
    }

    #[test]
    fn every_kind_and_format_lowers() {
        let config = AppConfig::default();
        for kind in [
            ReportKind::Daily,
            ReportKind::Monthly,
            ReportKind::Weekly,
            ReportKind::Yearly,
            ReportKind::Period,
            ReportKind::Range,
        ] {
            for format in [ReportFormat::Markdown, ReportFormat::LaTeX, ReportFormat::Typst] {
                let payload = ConfigPayload::build(&config, kind, format);
                assert!(!payload.descriptor().config_data.is_null());
            }
        }
    }
}
