//! Markdown range report formatter, shipped as the `RangeMdFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::markdown::RangeMdFormatter);
