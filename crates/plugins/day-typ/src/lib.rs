//! Typst daily report formatter, shipped as the `DayTypFormatter`
//! shared library.

tracer_formatters::export_formatter_abi!(tracer_formatters::typst::DayTypFormatter);
