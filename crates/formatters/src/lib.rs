//! The Time Tracer formatter family.
//!
//! Each concrete formatter renders one report shape (daily or range-like)
//! into one text dialect (Markdown, LaTeX, Typst). The plugin crates under
//! `crates/plugins/` are thin cdylib wrappers that export these formatters
//! across the C ABI via [`export_formatter_abi!`].

pub use tracer_formatter_abi as abi;

pub mod export;
pub mod fmt;
pub mod latex;
pub mod markdown;
pub mod stats;
pub mod tree;
pub mod typst;
pub mod view;

use tracer_formatter_abi::TtStatus;

/// Error carried out of config parsing and report rendering; converted to a
/// status code plus a `tt_getLastError` message at the ABI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterError {
    pub status: TtStatus,
    pub message: String,
}

impl FormatterError {
    #[must_use]
    pub fn new(status: TtStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(TtStatus::InvalidArgument, message)
    }

    #[must_use]
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(TtStatus::ConfigError, message)
    }

    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(TtStatus::NotSupported, message)
    }
}

impl std::fmt::Display for FormatterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FormatterError {}

/// One formatter as seen from the plugin bootstrap: construction from the
/// ABI config descriptor and rendering of one report payload.
pub trait PluginFormatter: Sized + 'static {
    /// Implementation version reported through `tt_getFormatterAbiInfo`.
    const IMPL_VERSION: (u16, u16, u16) = (0, 1, 0);

    /// # Safety
    ///
    /// `config.config_data` must point to the payload struct announced by
    /// `config.config_kind`, valid for `config.config_data_size` bytes.
    unsafe fn create(config: &abi::TtFormatterConfig) -> Result<Self, FormatterError>;

    /// # Safety
    ///
    /// `view.report_data` must point to the payload struct announced by
    /// `view.report_data_kind`, and every embedded string view must stay
    /// valid for the duration of the call.
    unsafe fn format_report(
        &self,
        view: &abi::TtReportDataView,
        kind: u32,
    ) -> Result<String, FormatterError>;
}
