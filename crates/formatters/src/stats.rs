//! The per-day statistics section of daily reports.
//!
//! The host ships the configured statistic lines as a flat array in
//! topological order (`parent_index < own_index`, `-1` for roots); the
//! formatter rebuilds the tree once at config time and renders it against
//! the report's `stats` column map.

use crate::abi::TtFormatterStatisticItemNodeV1;
use crate::fmt::format_duration;
use crate::view::{view_to_string, DailyReportView};
use crate::FormatterError;

#[derive(Debug, Clone)]
pub struct StatisticItem {
    pub label: String,
    pub db_column: String,
    pub show: bool,
    pub children: Vec<StatisticItem>,
}

/// Rebuilds the statistic-item tree from the flat ABI array.
///
/// # Safety
///
/// `items` must point to `count` valid nodes whose string views outlive the
/// call.
pub unsafe fn build_statistic_items(
    items: *const TtFormatterStatisticItemNodeV1,
    count: u32,
) -> Result<Vec<StatisticItem>, FormatterError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if items.is_null() {
        return Err(FormatterError::config_error(
            "statistics_items is null while statistics_item_count > 0",
        ));
    }

    let raw = std::slice::from_raw_parts(items, count as usize);
    let mut flat: Vec<StatisticItem> = Vec::with_capacity(raw.len());
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); raw.len()];
    let mut roots = Vec::new();

    for (index, node) in raw.iter().enumerate() {
        flat.push(StatisticItem {
            label: view_to_string(&node.label),
            db_column: view_to_string(&node.db_column),
            show: node.show != 0,
            children: Vec::new(),
        });

        match node.parent_index {
            -1 => roots.push(index),
            parent if parent >= 0 && (parent as usize) < index => {
                children[parent as usize].push(index);
            }
            other => {
                return Err(FormatterError::config_error(format!(
                    "statistics_items[{index}].parent_index {other} is not topological"
                )));
            }
        }
    }

    fn assemble(flat: &[StatisticItem], children: &[Vec<usize>], index: usize) -> StatisticItem {
        let mut item = flat[index].clone();
        item.children = children[index]
            .iter()
            .map(|&child| assemble(flat, children, child))
            .collect();
        item
    }

    Ok(roots
        .into_iter()
        .map(|root| assemble(&flat, &children, root))
        .collect())
}

/// Dialect hooks for the statistics section.
pub trait StatStrategy {
    fn header(&self, title: &str) -> String;
    fn main_item(&self, label: &str, value: &str) -> String;
    fn sub_item(&self, label: &str, value: &str, depth: usize) -> String;
    fn build_output(&self, lines: &[String]) -> String {
        let mut output = String::new();
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }
        output
    }
}

fn push_item_lines(
    lines: &mut Vec<String>,
    data: &DailyReportView,
    item: &StatisticItem,
    depth: usize,
    strategy: &dyn StatStrategy,
) {
    if !item.show {
        return;
    }
    let value = format_duration(data.stat(&item.db_column));
    let line = if depth == 0 {
        strategy.main_item(&item.label, &value)
    } else {
        strategy.sub_item(&item.label, &value, depth)
    };
    lines.push(line);
    for child in &item.children {
        push_item_lines(lines, data, child, depth + 1, strategy);
    }
}

/// Renders the statistics section, or nothing when no items are configured.
#[must_use]
pub fn render_statistics(
    data: &DailyReportView,
    items: &[StatisticItem],
    title: &str,
    strategy: &dyn StatStrategy,
) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut lines = Vec::new();
    for item in items {
        push_item_lines(&mut lines, data, item, 0, strategy);
    }
    if lines.is_empty() {
        return String::new();
    }

    let mut output = strategy.header(title);
    output.push_str(&strategy.build_output(&lines));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::TtStringView;
    use crate::tree::FlatForest;
    use crate::view::DayMetadata;

    fn node(
        label: &str,
        column: &str,
        show: bool,
        parent_index: i32,
    ) -> TtFormatterStatisticItemNodeV1 {
        TtFormatterStatisticItemNodeV1 {
            label: TtStringView::from_str(label),
            db_column: TtStringView::from_str(column),
            show: u8::from(show),
            reserved0: [0; 3],
            parent_index,
        }
    }

    fn sample_data() -> DailyReportView {
        DailyReportView {
            date: "2024-10-31".to_string(),
            metadata: DayMetadata::default(),
            total_duration: 3600,
            detailed_records: Vec::new(),
            stats: vec![
                ("sleep_total_time".to_string(), 28_800),
                ("total_exercise_time".to_string(), 1800),
                ("cardio_time".to_string(), 1200),
            ],
            tree: FlatForest::default(),
        }
    }

    struct PlainStat;

    impl StatStrategy for PlainStat {
        fn header(&self, title: &str) -> String {
            format!("== {title} ==\n")
        }
        fn main_item(&self, label: &str, value: &str) -> String {
            format!("{label}: {value}")
        }
        fn sub_item(&self, label: &str, value: &str, depth: usize) -> String {
            format!("{}{label}: {value}", "  ".repeat(depth))
        }
    }

    #[test]
    fn builds_tree_from_topological_array() {
        let labels = ["Sleep", "Exercise", "Cardio"];
        let raw = [
            node(labels[0], "sleep_total_time", true, -1),
            node(labels[1], "total_exercise_time", true, -1),
            node(labels[2], "cardio_time", true, 1),
        ];

        let items = unsafe { build_statistic_items(raw.as_ptr(), raw.len() as u32) }.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].children.len(), 1);
        assert_eq!(items[1].children[0].db_column, "cardio_time");
    }

    #[test]
    fn rejects_forward_parent_reference() {
        let label = "Broken";
        let raw = [node(label, "col", true, 3)];
        let result = unsafe { build_statistic_items(raw.as_ptr(), 1) };
        assert!(result.is_err());
    }

    #[test]
    fn renders_nested_items_and_skips_hidden() {
        let items = vec![
            StatisticItem {
                label: "Sleep".to_string(),
                db_column: "sleep_total_time".to_string(),
                show: true,
                children: Vec::new(),
            },
            StatisticItem {
                label: "Exercise".to_string(),
                db_column: "total_exercise_time".to_string(),
                show: true,
                children: vec![StatisticItem {
                    label: "Cardio".to_string(),
                    db_column: "cardio_time".to_string(),
                    show: true,
                    children: Vec::new(),
                }],
            },
            StatisticItem {
                label: "Hidden".to_string(),
                db_column: "grooming_time".to_string(),
                show: false,
                children: Vec::new(),
            },
        ];

        let output = render_statistics(&sample_data(), &items, "Statistics", &PlainStat);
        assert_eq!(
            output,
            "== Statistics ==\n\
             Sleep: 8h 0m\n\
             Exercise: 0h 30m\n\
             \u{20}\u{20}Cardio: 0h 20m\n"
        );
    }

    #[test]
    fn missing_columns_render_as_zero() {
        let items = vec![StatisticItem {
            label: "Study".to_string(),
            db_column: "study_time".to_string(),
            show: true,
            children: Vec::new(),
        }];
        let output = render_statistics(&sample_data(), &items, "Stats", &PlainStat);
        assert!(output.contains("Study: 0h 0m"));
    }
}
