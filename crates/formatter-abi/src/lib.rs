//! Stable C ABI shared between the Time Tracer host and its formatter
//! plugins.
//!
//! Every struct that crosses the boundary starts with `struct_size` and
//! `version` so both sides can reject layouts they do not understand.
//! Strings are borrowed `TtStringView`s and never own their bytes; the only
//! owned allocation that crosses the boundary is the report string returned
//! by `tt_formatReport`, which must be released through `tt_freeCString`
//! from the same plugin.

#![allow(non_camel_case_types)]

use std::ffi::c_void;
use std::os::raw::c_char;

pub const TT_FORMATTER_ABI_VERSION_CURRENT: u32 = 5;

pub const TT_FORMATTER_CONFIG_VERSION_V1: u32 = 1;
pub const TT_REPORT_DATA_VIEW_VERSION_CURRENT: u32 = 2;
pub const TT_REPORT_DATA_VERSION_V1: u32 = 1;

/// Status codes returned by every plugin entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TtStatus {
    Ok = 0,
    InvalidArgument = 1,
    ConfigError = 2,
    FormatError = 3,
    MemoryError = 4,
    NotSupported = 5,
    InternalError = 100,
}

impl TtStatus {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(TtStatus::Ok),
            1 => Some(TtStatus::InvalidArgument),
            2 => Some(TtStatus::ConfigError),
            3 => Some(TtStatus::FormatError),
            4 => Some(TtStatus::MemoryError),
            5 => Some(TtStatus::NotSupported),
            100 => Some(TtStatus::InternalError),
            _ => None,
        }
    }
}

/// Tags identifying which concrete struct a report payload pointer carries.
pub const TT_REPORT_DATA_KIND_UNKNOWN: u32 = 0;
pub const TT_REPORT_DATA_KIND_DAILY: u32 = 1;
pub const TT_REPORT_DATA_KIND_MONTHLY: u32 = 2;
pub const TT_REPORT_DATA_KIND_PERIOD: u32 = 3;
pub const TT_REPORT_DATA_KIND_RANGE: u32 = 4;
pub const TT_REPORT_DATA_KIND_WEEKLY: u32 = 5;
pub const TT_REPORT_DATA_KIND_YEARLY: u32 = 6;

/// Tags identifying which concrete struct a config payload pointer carries.
pub const TT_FORMATTER_CONFIG_KIND_UNKNOWN: u32 = 0;
pub const TT_FORMATTER_CONFIG_KIND_DAY_MD: u32 = 101;
pub const TT_FORMATTER_CONFIG_KIND_DAY_TEX: u32 = 102;
pub const TT_FORMATTER_CONFIG_KIND_DAY_TYP: u32 = 103;
pub const TT_FORMATTER_CONFIG_KIND_MONTH_MD: u32 = 201;
pub const TT_FORMATTER_CONFIG_KIND_MONTH_TEX: u32 = 202;
pub const TT_FORMATTER_CONFIG_KIND_MONTH_TYP: u32 = 203;
pub const TT_FORMATTER_CONFIG_KIND_RANGE_MD: u32 = 301;
pub const TT_FORMATTER_CONFIG_KIND_RANGE_TEX: u32 = 302;
pub const TT_FORMATTER_CONFIG_KIND_RANGE_TYP: u32 = 303;

pub type TtFormatterHandle = *mut c_void;

/// Borrowed UTF-8 string view. Never owns its bytes; the producer keeps the
/// backing storage alive for the duration of the call.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtStringView {
    pub data: *const u8,
    pub length: u64,
}

impl TtStringView {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: std::ptr::null(),
            length: 0,
        }
    }

    /// Borrows `text` for as long as the caller keeps it alive. The view
    /// must not outlive the string it points into.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        Self {
            data: text.as_ptr(),
            length: text.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TtFormatterVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub reserved: u16,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtFormatterAbiInfo {
    pub struct_size: u32,
    pub abi_version: u32,
    pub implementation_version: TtFormatterVersion,
}

/// Last-error record filled by `tt_getLastError`. `message` points into
/// plugin-owned thread-local storage and is only valid until the next call
/// into the same plugin on the same thread.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtFormatterError {
    pub struct_size: u32,
    pub code: i32,
    pub message: *const c_char,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtFormatterKeywordColorV1 {
    pub keyword: TtStringView,
    pub color: TtStringView,
}

/// One statistics line in topological order: `parent_index` is `-1` for
/// roots and otherwise smaller than the node's own index.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtFormatterStatisticItemNodeV1 {
    pub label: TtStringView,
    pub db_column: TtStringView,
    pub show: u8,
    pub reserved0: [u8; 3],
    pub parent_index: i32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDayLabelsConfigV1 {
    pub title_prefix: TtStringView,
    pub report_title: TtStringView,
    pub date_label: TtStringView,
    pub total_time_label: TtStringView,
    pub status_label: TtStringView,
    pub sleep_label: TtStringView,
    pub getup_time_label: TtStringView,
    pub remark_label: TtStringView,
    pub exercise_label: TtStringView,
    pub no_records_message: TtStringView,
    pub statistics_label: TtStringView,
    pub all_activities_label: TtStringView,
    pub activity_remark_label: TtStringView,
    pub activity_connector: TtStringView,
    pub project_breakdown_label: TtStringView,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtMonthLabelsConfigV1 {
    pub report_title: TtStringView,
    pub title_template: TtStringView,
    pub actual_days_label: TtStringView,
    pub status_days_label: TtStringView,
    pub sleep_days_label: TtStringView,
    pub exercise_days_label: TtStringView,
    pub cardio_days_label: TtStringView,
    pub anaerobic_days_label: TtStringView,
    pub total_time_label: TtStringView,
    pub no_records_message: TtStringView,
    pub invalid_format_message: TtStringView,
    pub project_breakdown_label: TtStringView,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtRangeLabelsConfigV1 {
    pub title_template: TtStringView,
    pub actual_days_label: TtStringView,
    pub status_days_label: TtStringView,
    pub sleep_days_label: TtStringView,
    pub exercise_days_label: TtStringView,
    pub cardio_days_label: TtStringView,
    pub anaerobic_days_label: TtStringView,
    pub total_time_label: TtStringView,
    pub no_records_message: TtStringView,
    pub invalid_range_message: TtStringView,
    pub project_breakdown_label: TtStringView,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtTexStyleConfigV1 {
    pub main_font: TtStringView,
    pub cjk_main_font: TtStringView,
    pub base_font_size: i32,
    pub report_title_font_size: i32,
    pub category_title_font_size: i32,
    pub margin_in: f64,
    pub list_top_sep_pt: f64,
    pub list_item_sep_ex: f64,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtTypstStyleConfigV1 {
    pub base_font: TtStringView,
    pub title_font: TtStringView,
    pub category_title_font: TtStringView,
    pub base_font_size: i32,
    pub report_title_font_size: i32,
    pub category_title_font_size: i32,
    pub line_spacing_em: f64,
    pub margin_top_cm: f64,
    pub margin_bottom_cm: f64,
    pub margin_left_cm: f64,
    pub margin_right_cm: f64,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDayMdConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtDayLabelsConfigV1,
    pub statistics_items: *const TtFormatterStatisticItemNodeV1,
    pub statistics_item_count: u32,
    pub reserved: u32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDayTexConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtDayLabelsConfigV1,
    pub style: TtTexStyleConfigV1,
    pub keyword_colors: *const TtFormatterKeywordColorV1,
    pub keyword_color_count: u32,
    pub statistics_items: *const TtFormatterStatisticItemNodeV1,
    pub statistics_item_count: u32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDayTypConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtDayLabelsConfigV1,
    pub style: TtTypstStyleConfigV1,
    pub keyword_colors: *const TtFormatterKeywordColorV1,
    pub keyword_color_count: u32,
    pub statistics_items: *const TtFormatterStatisticItemNodeV1,
    pub statistics_item_count: u32,
    pub statistic_font_size: i32,
    pub statistic_title_font_size: i32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtMonthMdConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtMonthLabelsConfigV1,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtMonthTexConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtMonthLabelsConfigV1,
    pub style: TtTexStyleConfigV1,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtMonthTypConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtMonthLabelsConfigV1,
    pub style: TtTypstStyleConfigV1,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtRangeMdConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtRangeLabelsConfigV1,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtRangeTexConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtRangeLabelsConfigV1,
    pub style: TtTexStyleConfigV1,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtRangeTypConfigV1 {
    pub struct_size: u32,
    pub version: u32,
    pub labels: TtRangeLabelsConfigV1,
    pub style: TtTypstStyleConfigV1,
}

/// Descriptor handed to `tt_createFormatter`: a kind tag plus a pointer to
/// the matching `Tt*ConfigV1` payload.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtFormatterConfig {
    pub struct_size: u32,
    pub version: u32,
    pub config_kind: u32,
    pub config_version: u32,
    pub config_data: *const c_void,
    pub config_data_size: u64,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDayMetadataV1 {
    pub status: TtStringView,
    pub sleep: TtStringView,
    pub remark: TtStringView,
    pub getup_time: TtStringView,
    pub exercise: TtStringView,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDailyTimeRecordV1 {
    pub start_time: TtStringView,
    pub end_time: TtStringView,
    pub project_path: TtStringView,
    pub duration_seconds: i64,
    pub activity_remark: TtStringView,
    pub has_activity_remark: u8,
    pub reserved: [u8; 7],
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtStringInt64PairV1 {
    pub key: TtStringView,
    pub value: i64,
}

/// One node of a flattened project tree. `parent_index` is `-1` for roots
/// and otherwise a smaller index, so a single forward pass rebuilds the
/// tree.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtProjectTreeNodeV1 {
    pub name: TtStringView,
    pub duration: i64,
    pub parent_index: i32,
    pub reserved: u32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtDailyReportDataV1 {
    pub struct_size: u32,
    pub version: u32,
    pub date: TtStringView,
    pub metadata: TtDayMetadataV1,
    pub total_duration: i64,
    pub detailed_records: *const TtDailyTimeRecordV1,
    pub detailed_record_count: u32,
    pub stats: *const TtStringInt64PairV1,
    pub stats_count: u32,
    pub project_tree_nodes: *const TtProjectTreeNodeV1,
    pub project_tree_node_count: u32,
    pub reserved: u32,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtRangeReportDataV1 {
    pub struct_size: u32,
    pub version: u32,
    pub range_label: TtStringView,
    pub start_date: TtStringView,
    pub end_date: TtStringView,
    pub requested_days: i32,
    pub total_duration: i64,
    pub actual_days: i32,
    pub status_true_days: i32,
    pub sleep_true_days: i32,
    pub exercise_true_days: i32,
    pub cardio_true_days: i32,
    pub anaerobic_true_days: i32,
    pub is_valid: u8,
    pub reserved0: [u8; 3],
    pub project_tree_nodes: *const TtProjectTreeNodeV1,
    pub project_tree_node_count: u32,
    pub reserved: u32,
}

pub type TtMonthlyReportDataV1 = TtRangeReportDataV1;
pub type TtPeriodReportDataV1 = TtRangeReportDataV1;
pub type TtWeeklyReportDataV1 = TtRangeReportDataV1;
pub type TtYearlyReportDataV1 = TtRangeReportDataV1;

/// Descriptor handed to `tt_formatReport`: a kind tag plus a pointer to the
/// matching report payload. The kind argument of `tt_formatReport` must
/// agree with `report_data_kind`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TtReportDataView {
    pub struct_size: u32,
    pub version: u32,
    pub report_data_kind: u32,
    pub report_data_version: u32,
    pub report_data: *const c_void,
    pub report_data_size: u64,
}

pub type TtGetFormatterAbiInfoFn = unsafe extern "C" fn(out_abi: *mut TtFormatterAbiInfo) -> i32;
pub type TtCreateFormatterFn =
    unsafe extern "C" fn(config: *const TtFormatterConfig, out_handle: *mut TtFormatterHandle) -> i32;
pub type TtDestroyFormatterFn = unsafe extern "C" fn(handle: TtFormatterHandle) -> i32;
pub type TtFormatReportFn = unsafe extern "C" fn(
    handle: TtFormatterHandle,
    report_data: *const TtReportDataView,
    report_data_kind: u32,
    out_report_content: *mut *mut c_char,
    out_report_size: *mut u64,
) -> i32;
pub type TtFreeCStringFn = unsafe extern "C" fn(c_string: *mut c_char);
pub type TtGetLastErrorFn =
    unsafe extern "C" fn(handle: TtFormatterHandle, out_error: *mut TtFormatterError) -> i32;
