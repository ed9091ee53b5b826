//! The libloading host for formatter plugins.
//!
//! A plugin is usable only when all six `tt_*` symbols resolve and its ABI
//! version matches the host's compile-time expectation. Handles are RAII
//! values so `tt_destroyFormatter` runs on every exit path, and strings
//! returned by `tt_formatReport` are copied host-side and immediately
//! handed back through `tt_freeCString`; the two sides never share an
//! allocator.

use std::ffi::CStr;
use std::path::Path;

use libloading::Library;
use tracer_formatter_abi::{
    TtCreateFormatterFn, TtDestroyFormatterFn, TtFormatReportFn, TtFormatterAbiInfo,
    TtFormatterConfig, TtFormatterError, TtFormatterHandle, TtFreeCStringFn, TtGetFormatterAbiInfoFn,
    TtGetLastErrorFn, TtReportDataView, TtStatus, TT_FORMATTER_ABI_VERSION_CURRENT,
};

#[derive(Debug)]
pub enum PluginError {
    Load { path: String, details: String },
    MissingSymbol { name: String, details: String },
    AbiMismatch { host: u32, plugin: u32 },
    Call { code: i32, message: String },
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::Load { path, details } => {
                write!(f, "failed to load formatter plugin {path}: {details}")
            }
            PluginError::MissingSymbol { name, details } => {
                write!(f, "formatter plugin is missing symbol {name}: {details}")
            }
            PluginError::AbiMismatch { host, plugin } => write!(
                f,
                "formatter ABI mismatch: host expects version {host}, plugin reports {plugin}"
            ),
            PluginError::Call { code, message } => {
                write!(f, "formatter call failed with status {code}: {message}")
            }
        }
    }
}

impl std::error::Error for PluginError {}

/// Shared-library file name for a plugin basename on this platform.
#[must_use]
pub fn platform_library_name(basename: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{basename}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{basename}.dylib")
    } else {
        format!("lib{basename}.so")
    }
}

#[derive(Debug)]
pub struct FormatterPlugin {
    // dropped last; the resolved fn pointers stay valid while it lives
    _library: Library,
    create: TtCreateFormatterFn,
    destroy: TtDestroyFormatterFn,
    format: TtFormatReportFn,
    free_cstring: TtFreeCStringFn,
    get_last_error: TtGetLastErrorFn,
}

impl FormatterPlugin {
    /// Loads `basename` from `plugin_dir`, resolves all six symbols and
    /// verifies the ABI version before the plugin is considered usable.
    pub fn load(plugin_dir: &Path, basename: &str) -> Result<Self, PluginError> {
        let path = plugin_dir.join(platform_library_name(basename));
        let library = unsafe { Library::new(&path) }.map_err(|error| PluginError::Load {
            path: path.display().to_string(),
            details: error.to_string(),
        })?;

        unsafe {
            let get_abi_info: TtGetFormatterAbiInfoFn =
                *resolve(&library, "tt_getFormatterAbiInfo")?;
            let create: TtCreateFormatterFn = *resolve(&library, "tt_createFormatter")?;
            let destroy: TtDestroyFormatterFn = *resolve(&library, "tt_destroyFormatter")?;
            let format: TtFormatReportFn = *resolve(&library, "tt_formatReport")?;
            let free_cstring: TtFreeCStringFn = *resolve(&library, "tt_freeCString")?;
            let get_last_error: TtGetLastErrorFn = *resolve(&library, "tt_getLastError")?;

            let mut abi_info = TtFormatterAbiInfo {
                struct_size: 0,
                abi_version: 0,
                implementation_version: tracer_formatter_abi::TtFormatterVersion {
                    major: 0,
                    minor: 0,
                    patch: 0,
                    reserved: 0,
                },
            };
            let status = get_abi_info(&mut abi_info);
            if status != TtStatus::Ok.code() {
                return Err(PluginError::Call {
                    code: status,
                    message: "tt_getFormatterAbiInfo failed".to_string(),
                });
            }
            if abi_info.abi_version != TT_FORMATTER_ABI_VERSION_CURRENT {
                return Err(PluginError::AbiMismatch {
                    host: TT_FORMATTER_ABI_VERSION_CURRENT,
                    plugin: abi_info.abi_version,
                });
            }

            Ok(Self {
                _library: library,
                create,
                destroy,
                format,
                free_cstring,
                get_last_error,
            })
        }
    }

    /// Creates a formatter instance; the returned guard destroys it on
    /// drop. The caller keeps `config` (and everything its views borrow)
    /// alive for the duration of this call only.
    pub fn create_formatter(
        &self,
        config: &TtFormatterConfig,
    ) -> Result<FormatterHandle<'_>, PluginError> {
        let mut handle: TtFormatterHandle = std::ptr::null_mut();
        let status = unsafe { (self.create)(config, &mut handle) };
        if status != TtStatus::Ok.code() || handle.is_null() {
            return Err(self.call_error(handle, status));
        }
        Ok(FormatterHandle {
            plugin: self,
            handle,
        })
    }

    fn call_error(&self, handle: TtFormatterHandle, code: i32) -> PluginError {
        let mut error = TtFormatterError {
            struct_size: 0,
            code: 0,
            message: std::ptr::null(),
        };
        let message = unsafe {
            if (self.get_last_error)(handle, &mut error) == TtStatus::Ok.code()
                && !error.message.is_null()
            {
                CStr::from_ptr(error.message).to_string_lossy().into_owned()
            } else {
                String::new()
            }
        };
        PluginError::Call { code, message }
    }
}

/// Scoped formatter instance; `tt_destroyFormatter` runs exactly once, on
/// drop, whatever happened in between.
pub struct FormatterHandle<'plugin> {
    plugin: &'plugin FormatterPlugin,
    handle: TtFormatterHandle,
}

impl FormatterHandle<'_> {
    /// Renders one report. The plugin-owned output buffer is copied into a
    /// host `String` and released before this returns.
    pub fn format_report(
        &self,
        view: &TtReportDataView,
        report_data_kind: u32,
    ) -> Result<String, PluginError> {
        let mut content: *mut std::os::raw::c_char = std::ptr::null_mut();
        let mut size: u64 = 0;
        let status = unsafe {
            (self.plugin.format)(self.handle, view, report_data_kind, &mut content, &mut size)
        };
        if status != TtStatus::Ok.code() {
            return Err(self.plugin.call_error(self.handle, status));
        }
        if content.is_null() {
            return Err(PluginError::Call {
                code: TtStatus::InternalError.code(),
                message: "plugin returned a null report buffer".to_string(),
            });
        }

        let report = unsafe { CStr::from_ptr(content).to_string_lossy().into_owned() };
        unsafe { (self.plugin.free_cstring)(content) };
        Ok(report)
    }
}

impl Drop for FormatterHandle<'_> {
    fn drop(&mut self) {
        unsafe {
            (self.plugin.destroy)(self.handle);
        }
    }
}

unsafe fn resolve<'lib, T>(
    library: &'lib Library,
    name: &str,
) -> Result<libloading::Symbol<'lib, T>, PluginError> {
    let symbol_name = format!("{name}\0");
    library
        .get(symbol_name.as_bytes())
        .map_err(|error| PluginError::MissingSymbol {
            name: name.to_string(),
            details: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_names_follow_the_platform() {
        let name = platform_library_name("DayMdFormatter");
        if cfg!(target_os = "windows") {
            assert_eq!(name, "DayMdFormatter.dll");
        } else if cfg!(target_os = "macos") {
            assert_eq!(name, "libDayMdFormatter.dylib");
        } else {
            assert_eq!(name, "libDayMdFormatter.so");
        }
    }

    #[test]
    fn loading_a_missing_plugin_reports_the_path() {
        let error =
            FormatterPlugin::load(Path::new("/nonexistent"), "DayMdFormatter").unwrap_err();
        match error {
            PluginError::Load { path, .. } => assert!(path.contains("DayMdFormatter")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
