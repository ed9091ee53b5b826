//! Small formatting helpers shared by every dialect.

/// Renders a duration as `"Xh Ym"`.
#[must_use]
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Renders a duration, appending a per-day average when the report covers
/// more than one day.
#[must_use]
pub fn format_duration_avg(total_seconds: i64, avg_days: i32) -> String {
    if total_seconds == 0 {
        if avg_days > 1 {
            return "0h 0m (average: 0h 0m/day)".to_string();
        }
        return "0h 0m".to_string();
    }

    let mut output = format_duration(total_seconds);
    if avg_days > 1 {
        let per_day = total_seconds / i64::from(avg_days);
        output.push_str(&format!(" (average: {}/day)", format_duration(per_day)));
    }
    output
}

/// `"N (xx.yy%)"` with exactly two decimals; falls back to the bare count
/// when the denominator is not positive.
#[must_use]
pub fn format_count_with_percentage(count: i32, total_days: i32) -> String {
    if total_days <= 0 {
        return count.to_string();
    }
    let percent = 100.0 * f64::from(count) / f64::from(total_days);
    format!("{count} ({percent:.2}%)")
}

/// One-decimal percentage, rounded half away from zero.
#[must_use]
pub fn format_one_decimal(value: f64) -> String {
    let scaled = if value >= 0.0 {
        (value * 10.0 + 0.5) as i64
    } else {
        (value * 10.0 - 0.5) as i64
    };
    let abs_scaled = scaled.abs();
    let sign = if scaled < 0 { "-" } else { "" };
    format!("{sign}{}.{}", abs_scaled / 10, abs_scaled % 10)
}

/// Style values (margins, separators) rendered without trailing zeros.
#[must_use]
pub fn format_compact_number(value: f64) -> String {
    let mut output = format!("{value:.6}");
    while output.ends_with('0') {
        output.pop();
    }
    if output.ends_with('.') {
        output.pop();
    }
    if output == "-0" || output.is_empty() {
        return "0".to_string();
    }
    output
}

/// Reflows multi-line text for use inside a list item: continuation lines
/// are indented and every line but the last carries the dialect's line-break
/// suffix (`"\\\\"` for LaTeX, `" \\"` for Typst, `"  "` for Markdown).
#[must_use]
pub fn format_multiline_for_list(text: &str, indent: usize, line_break_suffix: &str) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };

    let mut output = first.to_string();
    for line in lines {
        output.push_str(line_break_suffix);
        output.push('\n');
        output.push_str(&" ".repeat(indent));
        output.push_str(line);
    }
    output
}

/// Day flags arrive as the raw column text (`"1"`/`"0"`) or already
/// spelled out; render them uniformly.
#[must_use]
pub fn bool_to_string(value: &str) -> &'static str {
    match value.trim() {
        "1" | "true" | "True" => "True",
        _ => "False",
    }
}

/// Escapes the LaTeX special characters.
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => output.push_str("\\textbackslash{}"),
            '~' => output.push_str("\\textasciitilde{}"),
            '^' => output.push_str("\\textasciicircum{}"),
            '&' => output.push_str("\\&"),
            '%' => output.push_str("\\%"),
            '$' => output.push_str("\\$"),
            '#' => output.push_str("\\#"),
            '_' => output.push_str("\\_"),
            '{' => output.push_str("\\{"),
            '}' => output.push_str("\\}"),
            other => output.push(other),
        }
    }
    output
}

/// Substitutes the `{}` placeholder of a title template with the range
/// label.
#[must_use]
pub fn format_title_template(template: &str, range_label: &str) -> String {
    if template.contains("{}") {
        template.replacen("{}", range_label, 1)
    } else {
        format!("{template} {range_label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_text() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(2700), "0h 45m");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3661), "1h 1m");
        assert_eq!(format_duration(90_000), "25h 0m");
    }

    #[test]
    fn duration_with_average() {
        assert_eq!(format_duration_avg(7200, 1), "2h 0m");
        assert_eq!(format_duration_avg(7200, 2), "2h 0m (average: 1h 0m/day)");
        assert_eq!(format_duration_avg(0, 3), "0h 0m (average: 0h 0m/day)");
        assert_eq!(format_duration_avg(0, 1), "0h 0m");
    }

    #[test]
    fn count_with_percentage_keeps_two_decimals() {
        assert_eq!(format_count_with_percentage(15, 20), "15 (75.00%)");
        assert_eq!(format_count_with_percentage(18, 20), "18 (90.00%)");
        assert_eq!(format_count_with_percentage(1, 3), "1 (33.33%)");
        assert_eq!(format_count_with_percentage(3, 0), "3");
    }

    #[test]
    fn one_decimal_rounds_half_away() {
        assert_eq!(format_one_decimal(0.0), "0.0");
        assert_eq!(format_one_decimal(33.35), "33.4");
        assert_eq!(format_one_decimal(100.0), "100.0");
        assert_eq!(format_one_decimal(-2.25), "-2.3");
    }

    #[test]
    fn compact_number_strips_trailing_zeros() {
        assert_eq!(format_compact_number(1.0), "1");
        assert_eq!(format_compact_number(0.5), "0.5");
        assert_eq!(format_compact_number(2.54), "2.54");
        assert_eq!(format_compact_number(0.0), "0");
    }

    #[test]
    fn multiline_reflow() {
        assert_eq!(format_multiline_for_list("one line", 2, " \\"), "one line");
        assert_eq!(
            format_multiline_for_list("first\nsecond", 2, " \\"),
            "first \\\n  second"
        );
        assert_eq!(
            format_multiline_for_list("a\nb\nc", 0, "\\\\"),
            "a\\\\\nb\\\\\nc"
        );
        assert_eq!(format_multiline_for_list("", 2, " \\"), "");
    }

    #[test]
    fn latex_escaping() {
        assert_eq!(escape_latex("study_math"), "study\\_math");
        assert_eq!(escape_latex("50%"), "50\\%");
        assert_eq!(escape_latex("a&b#c"), "a\\&b\\#c");
        assert_eq!(escape_latex("{x}"), "\\{x\\}");
    }

    #[test]
    fn title_template_substitution() {
        assert_eq!(
            format_title_template("Monthly Report {}", "2025-07"),
            "Monthly Report 2025-07"
        );
        assert_eq!(
            format_title_template("Weekly Report", "2025-W01"),
            "Weekly Report 2025-W01"
        );
    }

    #[test]
    fn bool_rendering() {
        assert_eq!(bool_to_string("1"), "True");
        assert_eq!(bool_to_string("True"), "True");
        assert_eq!(bool_to_string("0"), "False");
        assert_eq!(bool_to_string(""), "False");
    }
}
