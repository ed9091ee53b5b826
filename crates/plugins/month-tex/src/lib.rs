//! LaTeX monthly report formatter, shipped as the `MonthTexFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::latex::MonthTexFormatter);
