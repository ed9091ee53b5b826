pub mod day;
pub mod filters;
pub mod range;
pub mod stats;

use crate::domain::reports::{DailyReportData, RangeReportData};
use crate::domain::tree::build_project_tree_from_ids;
use crate::storage::ProjectNameCache;

/// Builds the project tree once the flat stats are in place; a no-op for
/// empty days and already-built trees.
pub fn ensure_daily_tree(data: &mut DailyReportData, cache: &ProjectNameCache) {
    if data.total_duration > 0 && data.project_tree.is_empty() {
        build_project_tree_from_ids(&mut data.project_tree, &data.project_stats, cache);
    }
}

pub fn ensure_range_tree(data: &mut RangeReportData, cache: &ProjectNameCache) {
    if data.total_duration > 0 && data.project_tree.is_empty() {
        build_project_tree_from_ids(&mut data.project_tree, &data.project_stats, cache);
    }
}
