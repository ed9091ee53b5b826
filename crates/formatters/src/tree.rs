//! Project-tree rendering over flattened parent-indexed nodes.
//!
//! The host flattens its in-memory tree into an array where every node's
//! `parent_index` is either `-1` (root) or a smaller index, so one forward
//! pass rebuilds the forest. Sibling order is decided here, at render time:
//! descending duration, then lexical name.

use crate::abi::TtProjectTreeNodeV1;
use crate::fmt::{format_duration_avg, format_one_decimal};

#[derive(Debug, Clone)]
pub struct FlatNode {
    pub name: String,
    pub duration: i64,
    pub children: Vec<usize>,
}

/// The reconstructed forest: node storage plus root indices.
#[derive(Debug, Clone, Default)]
pub struct FlatForest {
    pub nodes: Vec<FlatNode>,
    pub roots: Vec<usize>,
}

impl FlatForest {
    /// Rebuilds the forest from the ABI node array. Nodes with an
    /// out-of-range or forward-referencing parent are treated as roots, so
    /// a malformed payload degrades instead of being dropped.
    ///
    /// # Safety
    ///
    /// `nodes` must point to `count` valid nodes whose string views outlive
    /// the call.
    #[must_use]
    pub unsafe fn parse(nodes: *const TtProjectTreeNodeV1, count: u32) -> Self {
        if nodes.is_null() || count == 0 {
            return Self::default();
        }

        let raw = std::slice::from_raw_parts(nodes, count as usize);
        let mut parsed: Vec<FlatNode> = raw
            .iter()
            .map(|node| FlatNode {
                name: crate::view::view_to_string(&node.name),
                duration: node.duration,
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for (index, node) in raw.iter().enumerate() {
            let parent = node.parent_index;
            if parent < 0 || parent as usize >= index {
                roots.push(index);
            } else {
                parsed[parent as usize].children.push(index);
            }
        }

        Self {
            nodes: parsed,
            roots,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Dialect hooks for tree rendering. Markdown needs no list wrappers, so
/// the wrapper hooks default to empty strings.
pub trait TreeStrategy {
    fn category_header(&self, name: &str, duration_text: &str, percentage: f64) -> String;
    fn tree_node(&self, name: &str, duration_text: &str, indent_level: usize) -> String;
    fn start_children_list(&self) -> String {
        String::new()
    }
    fn end_children_list(&self) -> String {
        String::new()
    }
}

fn percentage_of(duration: i64, total_duration: i64) -> f64 {
    if total_duration <= 0 {
        return 0.0;
    }
    duration as f64 / total_duration as f64 * 100.0
}

fn sorted_by_duration(forest: &FlatForest, indices: &[usize]) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&lhs, &rhs| {
        let left = &forest.nodes[lhs];
        let right = &forest.nodes[rhs];
        right
            .duration
            .cmp(&left.duration)
            .then_with(|| left.name.cmp(&right.name))
    });
    sorted
}

fn render_children(
    output: &mut String,
    forest: &FlatForest,
    children: &[usize],
    indent: usize,
    avg_days: i32,
    strategy: &dyn TreeStrategy,
) {
    output.push_str(&strategy.start_children_list());
    for index in sorted_by_duration(forest, children) {
        let node = &forest.nodes[index];
        if node.duration <= 0 && node.children.is_empty() {
            continue;
        }
        if node.name.is_empty() {
            continue;
        }
        output.push_str(&strategy.tree_node(
            &node.name,
            &format_duration_avg(node.duration, avg_days),
            indent,
        ));
        if !node.children.is_empty() {
            render_children(output, forest, &node.children, indent + 1, avg_days, strategy);
        }
    }
    output.push_str(&strategy.end_children_list());
}

/// Renders the whole forest: category headers for roots, nested lists for
/// descendants.
#[must_use]
pub fn render_project_tree(
    forest: &FlatForest,
    total_duration: i64,
    avg_days: i32,
    strategy: &dyn TreeStrategy,
) -> String {
    let mut output = String::new();
    for root_index in sorted_by_duration(forest, &forest.roots) {
        let root = &forest.nodes[root_index];
        if root.name.is_empty() {
            continue;
        }
        output.push_str(&strategy.category_header(
            &root.name,
            &format_duration_avg(root.duration, avg_days),
            percentage_of(root.duration, total_duration),
        ));
        if root.children.is_empty() {
            continue;
        }
        render_children(&mut output, forest, &root.children, 0, avg_days, strategy);
    }
    output
}

/// Shared one-decimal percent formatting for category headers.
#[must_use]
pub fn percent_text(percentage: f64) -> String {
    format_one_decimal(percentage)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a forest directly, bypassing the ABI array, for renderer
    /// tests.
    pub fn forest(nodes: &[(&str, i64, i32)]) -> FlatForest {
        let mut parsed: Vec<FlatNode> = nodes
            .iter()
            .map(|(name, duration, _)| FlatNode {
                name: (*name).to_string(),
                duration: *duration,
                children: Vec::new(),
            })
            .collect();
        let mut roots = Vec::new();
        for (index, (_, _, parent)) in nodes.iter().enumerate() {
            if *parent < 0 || *parent as usize >= index {
                roots.push(index);
            } else {
                parsed[*parent as usize].children.push(index);
            }
        }
        FlatForest {
            nodes: parsed,
            roots,
        }
    }
}
