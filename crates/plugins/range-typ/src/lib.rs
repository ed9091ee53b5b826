//! Typst range report formatter, shipped as the `RangeTypFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::typst::RangeTypFormatter);
