//! Generic plugin bootstrap shared by every formatter cdylib.
//!
//! The plugin crates call [`export_formatter_abi!`] with one concrete
//! [`PluginFormatter`] type; the macro expands to the six `tt_*` entry
//! points backed by the generic functions here. All unwinding is caught
//! before it can cross the C boundary, and the last error is kept in
//! thread-local storage for `tt_getLastError`.

use std::cell::RefCell;
use std::ffi::CString;
use std::mem::size_of;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::abi::{
    TtFormatterAbiInfo, TtFormatterConfig, TtFormatterError, TtFormatterHandle,
    TtFormatterVersion, TtReportDataView, TtStatus, TT_FORMATTER_ABI_VERSION_CURRENT,
};
use crate::{FormatterError, PluginFormatter};

thread_local! {
    static LAST_ERROR: RefCell<(i32, CString)> =
        RefCell::new((TtStatus::Ok.code(), CString::default()));
}

fn set_last_error(code: i32, message: &str) {
    let message = CString::new(message)
        .unwrap_or_else(|_| CString::new("error message contained a NUL byte").unwrap());
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = (code, message);
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = (TtStatus::Ok.code(), CString::default());
    });
}

fn fail(error: &FormatterError) -> i32 {
    set_last_error(error.status.code(), &error.message);
    error.status.code()
}

pub fn abi_info<F: PluginFormatter>(out_abi: *mut TtFormatterAbiInfo) -> i32 {
    if out_abi.is_null() {
        return TtStatus::InvalidArgument.code();
    }
    let (major, minor, patch) = F::IMPL_VERSION;
    unsafe {
        *out_abi = TtFormatterAbiInfo {
            struct_size: size_of::<TtFormatterAbiInfo>() as u32,
            abi_version: TT_FORMATTER_ABI_VERSION_CURRENT,
            implementation_version: TtFormatterVersion {
                major,
                minor,
                patch,
                reserved: 0,
            },
        };
    }
    TtStatus::Ok.code()
}

/// # Safety
///
/// `config` must be null or point to a valid descriptor whose payload
/// matches its `config_kind`.
pub unsafe fn create_formatter<F: PluginFormatter>(
    config: *const TtFormatterConfig,
    out_handle: *mut TtFormatterHandle,
) -> i32 {
    if out_handle.is_null() {
        set_last_error(
            TtStatus::InvalidArgument.code(),
            "out_handle must not be null",
        );
        return TtStatus::InvalidArgument.code();
    }
    *out_handle = std::ptr::null_mut();

    if config.is_null() {
        set_last_error(TtStatus::InvalidArgument.code(), "config must not be null");
        return TtStatus::InvalidArgument.code();
    }

    let config = &*config;
    match catch_unwind(AssertUnwindSafe(|| unsafe { F::create(config) })) {
        Ok(Ok(formatter)) => {
            *out_handle = Box::into_raw(Box::new(formatter)).cast();
            clear_last_error();
            TtStatus::Ok.code()
        }
        Ok(Err(error)) => fail(&error),
        Err(_) => {
            set_last_error(
                TtStatus::InternalError.code(),
                "panic while creating formatter",
            );
            TtStatus::InternalError.code()
        }
    }
}

/// # Safety
///
/// `handle` must be null or a handle previously returned by
/// `create_formatter::<F>` that has not been destroyed yet.
pub unsafe fn destroy_formatter<F: PluginFormatter>(handle: TtFormatterHandle) -> i32 {
    if !handle.is_null() {
        drop(Box::from_raw(handle.cast::<F>()));
    }
    TtStatus::Ok.code()
}

/// # Safety
///
/// `handle` must come from `create_formatter::<F>`, and `report_data` must
/// point to a descriptor whose payload matches `report_data_kind`.
pub unsafe fn format_report<F: PluginFormatter>(
    handle: TtFormatterHandle,
    report_data: *const TtReportDataView,
    report_data_kind: u32,
    out_report_content: *mut *mut c_char,
    out_report_size: *mut u64,
) -> i32 {
    if out_report_content.is_null() || out_report_size.is_null() {
        set_last_error(
            TtStatus::InvalidArgument.code(),
            "output parameters must not be null",
        );
        return TtStatus::InvalidArgument.code();
    }
    *out_report_content = std::ptr::null_mut();
    *out_report_size = 0;

    if handle.is_null() || report_data.is_null() {
        set_last_error(
            TtStatus::InvalidArgument.code(),
            "handle and report data must not be null",
        );
        return TtStatus::InvalidArgument.code();
    }

    let view = &*report_data;
    if view.report_data_kind != report_data_kind {
        set_last_error(
            TtStatus::InvalidArgument.code(),
            "report kind argument disagrees with the descriptor",
        );
        return TtStatus::InvalidArgument.code();
    }

    let formatter = &*handle.cast::<F>();
    match catch_unwind(AssertUnwindSafe(|| unsafe {
        formatter.format_report(view, report_data_kind)
    })) {
        Ok(Ok(report)) => {
            let length = report.len() as u64;
            match CString::new(report) {
                Ok(c_string) => {
                    *out_report_content = c_string.into_raw();
                    *out_report_size = length;
                    clear_last_error();
                    TtStatus::Ok.code()
                }
                Err(_) => {
                    set_last_error(
                        TtStatus::FormatError.code(),
                        "formatted report contained a NUL byte",
                    );
                    TtStatus::FormatError.code()
                }
            }
        }
        Ok(Err(error)) => fail(&error),
        Err(_) => {
            set_last_error(
                TtStatus::FormatError.code(),
                "panic while formatting report",
            );
            TtStatus::FormatError.code()
        }
    }
}

/// # Safety
///
/// `c_string` must be null or a string previously returned by
/// `format_report` from this plugin, freed at most once.
pub unsafe fn free_cstring(c_string: *mut c_char) {
    if !c_string.is_null() {
        drop(CString::from_raw(c_string));
    }
}

/// # Safety
///
/// `out_error` must be null or writable.
pub unsafe fn get_last_error(
    _handle: TtFormatterHandle,
    out_error: *mut TtFormatterError,
) -> i32 {
    if out_error.is_null() {
        return TtStatus::InvalidArgument.code();
    }
    let (code, message) = LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        (slot.0, slot.1.as_ptr())
    });
    *out_error = TtFormatterError {
        struct_size: size_of::<TtFormatterError>() as u32,
        code,
        message,
    };
    TtStatus::Ok.code()
}

/// Exports the six `tt_*` symbols for one concrete formatter type. Every
/// plugin cdylib invokes this exactly once.
#[macro_export]
macro_rules! export_formatter_abi {
    ($formatter:ty) => {
        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `out_abi` must be null or writable.
        pub unsafe extern "C" fn tt_getFormatterAbiInfo(
            out_abi: *mut $crate::abi::TtFormatterAbiInfo,
        ) -> i32 {
            $crate::export::abi_info::<$formatter>(out_abi)
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `config` must point to a valid descriptor for this formatter.
        pub unsafe extern "C" fn tt_createFormatter(
            config: *const $crate::abi::TtFormatterConfig,
            out_handle: *mut $crate::abi::TtFormatterHandle,
        ) -> i32 {
            $crate::export::create_formatter::<$formatter>(config, out_handle)
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `handle` must come from `tt_createFormatter` and not be destroyed twice.
        pub unsafe extern "C" fn tt_destroyFormatter(
            handle: $crate::abi::TtFormatterHandle,
        ) -> i32 {
            $crate::export::destroy_formatter::<$formatter>(handle)
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `handle` must come from `tt_createFormatter`; `report_data` must
        /// describe a payload matching `report_data_kind`.
        pub unsafe extern "C" fn tt_formatReport(
            handle: $crate::abi::TtFormatterHandle,
            report_data: *const $crate::abi::TtReportDataView,
            report_data_kind: u32,
            out_report_content: *mut *mut ::std::os::raw::c_char,
            out_report_size: *mut u64,
        ) -> i32 {
            $crate::export::format_report::<$formatter>(
                handle,
                report_data,
                report_data_kind,
                out_report_content,
                out_report_size,
            )
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `c_string` must come from `tt_formatReport` of this plugin.
        pub unsafe extern "C" fn tt_freeCString(c_string: *mut ::std::os::raw::c_char) {
            $crate::export::free_cstring(c_string)
        }

        #[allow(non_snake_case)]
        #[no_mangle]
        /// # Safety
        /// `out_error` must be null or writable.
        pub unsafe extern "C" fn tt_getLastError(
            handle: $crate::abi::TtFormatterHandle,
            out_error: *mut $crate::abi::TtFormatterError,
        ) -> i32 {
            $crate::export::get_last_error(handle, out_error)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{
        TtDayLabelsConfigV1, TtDayMdConfigV1, TtDayMetadataV1, TtDailyReportDataV1,
        TtStringView, TT_FORMATTER_CONFIG_KIND_DAY_MD, TT_FORMATTER_CONFIG_VERSION_V1,
        TT_REPORT_DATA_KIND_DAILY, TT_REPORT_DATA_VERSION_V1, TT_REPORT_DATA_VIEW_VERSION_CURRENT,
    };
    use crate::markdown::DayMdFormatter;
    use std::ffi::{c_void, CStr};

    fn day_labels() -> TtDayLabelsConfigV1 {
        TtDayLabelsConfigV1 {
            title_prefix: TtStringView::from_str("Daily Report"),
            report_title: TtStringView::from_str("Daily Report"),
            date_label: TtStringView::from_str("Date"),
            total_time_label: TtStringView::from_str("Total Time"),
            status_label: TtStringView::from_str("Status"),
            sleep_label: TtStringView::from_str("Sleep"),
            getup_time_label: TtStringView::from_str("Getup Time"),
            remark_label: TtStringView::from_str("Remark"),
            exercise_label: TtStringView::from_str("Exercise"),
            no_records_message: TtStringView::from_str("No records."),
            statistics_label: TtStringView::from_str("Statistics"),
            all_activities_label: TtStringView::from_str("All Activities"),
            activity_remark_label: TtStringView::from_str("Remark"),
            activity_connector: TtStringView::from_str("."),
            project_breakdown_label: TtStringView::from_str("Project Breakdown"),
        }
    }

    #[test]
    fn full_handle_lifecycle_across_the_abi() {
        let payload = TtDayMdConfigV1 {
            struct_size: size_of::<TtDayMdConfigV1>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            labels: day_labels(),
            statistics_items: std::ptr::null(),
            statistics_item_count: 0,
            reserved: 0,
        };
        let config = TtFormatterConfig {
            struct_size: size_of::<TtFormatterConfig>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_kind: TT_FORMATTER_CONFIG_KIND_DAY_MD,
            config_version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_data: (&payload as *const TtDayMdConfigV1).cast::<c_void>(),
            config_data_size: size_of::<TtDayMdConfigV1>() as u64,
        };

        let mut handle: TtFormatterHandle = std::ptr::null_mut();
        let status = unsafe { create_formatter::<DayMdFormatter>(&config, &mut handle) };
        assert_eq!(status, TtStatus::Ok.code());
        assert!(!handle.is_null());

        let date = "2025-01-01";
        let report = TtDailyReportDataV1 {
            struct_size: size_of::<TtDailyReportDataV1>() as u32,
            version: TT_REPORT_DATA_VERSION_V1,
            date: TtStringView::from_str(date),
            metadata: TtDayMetadataV1 {
                status: TtStringView::from_str("1"),
                sleep: TtStringView::from_str("0"),
                remark: TtStringView::empty(),
                getup_time: TtStringView::from_str("06:00"),
                exercise: TtStringView::from_str("0"),
            },
            total_duration: 0,
            detailed_records: std::ptr::null(),
            detailed_record_count: 0,
            stats: std::ptr::null(),
            stats_count: 0,
            project_tree_nodes: std::ptr::null(),
            project_tree_node_count: 0,
            reserved: 0,
        };
        let view = TtReportDataView {
            struct_size: size_of::<TtReportDataView>() as u32,
            version: TT_REPORT_DATA_VIEW_VERSION_CURRENT,
            report_data_kind: TT_REPORT_DATA_KIND_DAILY,
            report_data_version: TT_REPORT_DATA_VERSION_V1,
            report_data: (&report as *const TtDailyReportDataV1).cast::<c_void>(),
            report_data_size: size_of::<TtDailyReportDataV1>() as u64,
        };

        let mut content: *mut c_char = std::ptr::null_mut();
        let mut length: u64 = 0;
        let status = unsafe {
            format_report::<DayMdFormatter>(
                handle,
                &view,
                TT_REPORT_DATA_KIND_DAILY,
                &mut content,
                &mut length,
            )
        };
        assert_eq!(status, TtStatus::Ok.code());
        assert!(!content.is_null());

        let text = unsafe { CStr::from_ptr(content) }.to_str().unwrap();
        assert_eq!(text.len() as u64, length);
        assert!(text.starts_with("## Daily Report 2025-01-01\n"));
        assert!(text.ends_with("No records.\n"));

        unsafe {
            free_cstring(content);
            assert_eq!(
                destroy_formatter::<DayMdFormatter>(handle),
                TtStatus::Ok.code()
            );
        }
    }

    #[test]
    fn kind_mismatch_sets_last_error() {
        let payload = TtDayMdConfigV1 {
            struct_size: size_of::<TtDayMdConfigV1>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            labels: day_labels(),
            statistics_items: std::ptr::null(),
            statistics_item_count: 0,
            reserved: 0,
        };
        let config = TtFormatterConfig {
            struct_size: size_of::<TtFormatterConfig>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_kind: TT_FORMATTER_CONFIG_KIND_DAY_MD,
            config_version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_data: (&payload as *const TtDayMdConfigV1).cast::<c_void>(),
            config_data_size: size_of::<TtDayMdConfigV1>() as u64,
        };

        let mut handle: TtFormatterHandle = std::ptr::null_mut();
        unsafe {
            assert_eq!(
                create_formatter::<DayMdFormatter>(&config, &mut handle),
                TtStatus::Ok.code()
            );
        }

        let view = TtReportDataView {
            struct_size: size_of::<TtReportDataView>() as u32,
            version: TT_REPORT_DATA_VIEW_VERSION_CURRENT,
            report_data_kind: TT_REPORT_DATA_KIND_DAILY,
            report_data_version: TT_REPORT_DATA_VERSION_V1,
            report_data: std::ptr::null(),
            report_data_size: 0,
        };
        let mut content: *mut c_char = std::ptr::null_mut();
        let mut length: u64 = 0;
        let status = unsafe {
            format_report::<DayMdFormatter>(handle, &view, 99, &mut content, &mut length)
        };
        assert_eq!(status, TtStatus::InvalidArgument.code());
        assert!(content.is_null());

        let mut error = TtFormatterError {
            struct_size: 0,
            code: 0,
            message: std::ptr::null(),
        };
        unsafe {
            assert_eq!(
                get_last_error(handle, &mut error),
                TtStatus::Ok.code()
            );
        }
        assert_eq!(error.code, TtStatus::InvalidArgument.code());
        let message = unsafe { CStr::from_ptr(error.message) }.to_str().unwrap();
        assert!(message.contains("disagrees"));

        unsafe {
            destroy_formatter::<DayMdFormatter>(handle);
        }
    }

    #[test]
    fn bad_config_kind_is_a_config_error() {
        let config = TtFormatterConfig {
            struct_size: size_of::<TtFormatterConfig>() as u32,
            version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_kind: 999,
            config_version: TT_FORMATTER_CONFIG_VERSION_V1,
            config_data: std::ptr::null(),
            config_data_size: 0,
        };
        let mut handle: TtFormatterHandle = std::ptr::null_mut();
        let status = unsafe { create_formatter::<DayMdFormatter>(&config, &mut handle) };
        assert_eq!(status, TtStatus::ConfigError.code());
        assert!(handle.is_null());
    }
}
