//! Markdown monthly report formatter, shipped as the `MonthMdFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::markdown::MonthMdFormatter);
