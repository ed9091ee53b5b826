//! Markdown daily report formatter, shipped as the `DayMdFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::markdown::DayMdFormatter);
