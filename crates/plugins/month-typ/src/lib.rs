//! Typst monthly report formatter, shipped as the `MonthTypFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::typst::MonthTypFormatter);
