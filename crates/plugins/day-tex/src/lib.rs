//! LaTeX daily report formatter, shipped as the `DayTexFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::latex::DayTexFormatter);
