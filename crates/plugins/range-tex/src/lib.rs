//! LaTeX range report formatter, shipped as the `RangeTexFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::latex::RangeTexFormatter);
