pub mod runtime;

pub use runtime::{FormatterHandle, FormatterPlugin, PluginError};

use crate::domain::reports::{ReportFormat, ReportKind};

/// The read-only registry mapping a report request to the plugin basename
/// shipping its formatter. Daily and monthly reports have dedicated
/// plugins; the other range-shaped kinds share the range family.
#[must_use]
pub fn plugin_basename(kind: ReportKind, format: ReportFormat) -> &'static str {
    match (kind, format) {
        (ReportKind::Daily, ReportFormat::Markdown) => "DayMdFormatter",
        (ReportKind::Daily, ReportFormat::LaTeX) => "DayTexFormatter",
        (ReportKind::Daily, ReportFormat::Typst) => "DayTypFormatter",
        (ReportKind::Monthly, ReportFormat::Markdown) => "MonthMdFormatter",
        (ReportKind::Monthly, ReportFormat::LaTeX) => "MonthTexFormatter",
        (ReportKind::Monthly, ReportFormat::Typst) => "MonthTypFormatter",
        (
            ReportKind::Weekly | ReportKind::Yearly | ReportKind::Period | ReportKind::Range,
            ReportFormat::Markdown,
        ) => "RangeMdFormatter",
        (
            ReportKind::Weekly | ReportKind::Yearly | ReportKind::Period | ReportKind::Range,
            ReportFormat::LaTeX,
        ) => "RangeTexFormatter",
        (
            ReportKind::Weekly | ReportKind::Yearly | ReportKind::Period | ReportKind::Range,
            ReportFormat::Typst,
        ) => "RangeTypFormatter",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_and_monthly_have_dedicated_plugins() {
        assert_eq!(
            plugin_basename(ReportKind::Daily, ReportFormat::Markdown),
            "DayMdFormatter"
        );
        assert_eq!(
            plugin_basename(ReportKind::Monthly, ReportFormat::Typst),
            "MonthTypFormatter"
        );
    }

    #[test]
    fn range_shaped_kinds_share_the_range_family() {
        for kind in [
            ReportKind::Weekly,
            ReportKind::Yearly,
            ReportKind::Period,
            ReportKind::Range,
        ] {
            assert_eq!(
                plugin_basename(kind, ReportFormat::LaTeX),
                "RangeTexFormatter"
            );
        }
    }
}
