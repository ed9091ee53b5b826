//! Lowering of in-memory report data into the flattened ABI payload.
//!
//! The payload owns all backing storage (strings, record/stat/node
//! arrays), so every view stays valid for the duration of the
//! `tt_formatReport` call; the plugin must not retain the pointers past
//! return.

use std::mem::size_of;

use tracer_formatter_abi::{
    TtDailyReportDataV1, TtDailyTimeRecordV1, TtDayMetadataV1, TtProjectTreeNodeV1,
    TtRangeReportDataV1, TtReportDataView, TtStringInt64PairV1, TtStringView,
    TT_REPORT_DATA_KIND_DAILY, TT_REPORT_DATA_KIND_MONTHLY, TT_REPORT_DATA_KIND_PERIOD,
    TT_REPORT_DATA_KIND_RANGE, TT_REPORT_DATA_KIND_WEEKLY, TT_REPORT_DATA_KIND_YEARLY,
    TT_REPORT_DATA_VERSION_V1, TT_REPORT_DATA_VIEW_VERSION_CURRENT,
};

use crate::domain::reports::{DailyReportData, RangeReportData, ReportKind};
use crate::domain::tree::{ProjectNode, ProjectTree};

/// ABI tag for a report kind.
#[must_use]
pub fn abi_report_kind(kind: ReportKind) -> u32 {
    match kind {
        ReportKind::Daily => TT_REPORT_DATA_KIND_DAILY,
        ReportKind::Monthly => TT_REPORT_DATA_KIND_MONTHLY,
        ReportKind::Weekly => TT_REPORT_DATA_KIND_WEEKLY,
        ReportKind::Yearly => TT_REPORT_DATA_KIND_YEARLY,
        ReportKind::Period => TT_REPORT_DATA_KIND_PERIOD,
        ReportKind::Range => TT_REPORT_DATA_KIND_RANGE,
    }
}

#[derive(Default)]
struct StringArena {
    strings: Vec<String>,
}

impl StringArena {
    fn view(&mut self, text: &str) -> TtStringView {
        self.strings.push(text.to_string());
        TtStringView::from_str(self.strings.last().expect("just pushed"))
    }
}

/// Flattens the forest pre-order with `parent_index < own_index`; siblings
/// are emitted by descending duration then name so the wire order is
/// deterministic too.
fn flatten_tree(arena: &mut StringArena, tree: &ProjectTree) -> Vec<TtProjectTreeNodeV1> {
    fn sorted<'a>(
        children: &'a std::collections::BTreeMap<String, ProjectNode>,
    ) -> Vec<(&'a String, &'a ProjectNode)> {
        let mut entries: Vec<_> = children.iter().collect();
        entries.sort_by(|(left_name, left), (right_name, right)| {
            right
                .duration
                .cmp(&left.duration)
                .then_with(|| left_name.cmp(right_name))
        });
        entries
    }

    fn push_node(
        arena: &mut StringArena,
        nodes: &mut Vec<TtProjectTreeNodeV1>,
        name: &str,
        node: &ProjectNode,
        parent_index: i32,
    ) {
        let own_index = nodes.len() as i32;
        let name_view = arena.view(name);
        nodes.push(TtProjectTreeNodeV1 {
            name: name_view,
            duration: node.duration,
            parent_index,
            reserved: 0,
        });
        for (child_name, child) in sorted(&node.children) {
            push_node(arena, nodes, child_name, child, own_index);
        }
    }

    let mut nodes = Vec::new();
    for (name, node) in sorted(tree) {
        push_node(arena, &mut nodes, name, node, -1);
    }
    nodes
}

enum ReportPayloadBox {
    Daily(Box<TtDailyReportDataV1>),
    Range(Box<TtRangeReportDataV1>),
}

/// Owned, flattened report data plus the descriptor handed to the plugin.
pub struct ReportPayload {
    _arena: StringArena,
    _records: Vec<TtDailyTimeRecordV1>,
    _stats: Vec<TtStringInt64PairV1>,
    _nodes: Vec<TtProjectTreeNodeV1>,
    _payload: ReportPayloadBox,
    view: TtReportDataView,
    kind: u32,
}

impl ReportPayload {
    #[must_use]
    pub fn daily(data: &DailyReportData) -> Self {
        let mut arena = StringArena::default();

        let records: Vec<TtDailyTimeRecordV1> = data
            .detailed_records
            .iter()
            .map(|record| TtDailyTimeRecordV1 {
                start_time: arena.view(&record.start_time),
                end_time: arena.view(&record.end_time),
                project_path: arena.view(&record.project_path),
                duration_seconds: record.duration_seconds,
                activity_remark: record
                    .activity_remark
                    .as_deref()
                    .map_or_else(TtStringView::empty, |remark| arena.view(remark)),
                has_activity_remark: u8::from(record.activity_remark.is_some()),
                reserved: [0; 7],
            })
            .collect();

        let stats: Vec<TtStringInt64PairV1> = data
            .stats
            .iter()
            .map(|(key, value)| TtStringInt64PairV1 {
                key: arena.view(key),
                value: *value,
            })
            .collect();

        let nodes = flatten_tree(&mut arena, &data.project_tree);

        let payload = Box::new(TtDailyReportDataV1 {
            struct_size: size_of::<TtDailyReportDataV1>() as u32,
            version: TT_REPORT_DATA_VERSION_V1,
            date: arena.view(&data.date),
            metadata: TtDayMetadataV1 {
                status: arena.view(&data.metadata.status),
                sleep: arena.view(&data.metadata.sleep),
                remark: arena.view(&data.metadata.remark),
                getup_time: arena.view(&data.metadata.getup_time),
                exercise: arena.view(&data.metadata.exercise),
            },
            total_duration: data.total_duration,
            detailed_records: records.as_ptr(),
            detailed_record_count: records.len() as u32,
            stats: stats.as_ptr(),
            stats_count: stats.len() as u32,
            project_tree_nodes: nodes.as_ptr(),
            project_tree_node_count: nodes.len() as u32,
            reserved: 0,
        });

        let kind = TT_REPORT_DATA_KIND_DAILY;
        let view = TtReportDataView {
            struct_size: size_of::<TtReportDataView>() as u32,
            version: TT_REPORT_DATA_VIEW_VERSION_CURRENT,
            report_data_kind: kind,
            report_data_version: TT_REPORT_DATA_VERSION_V1,
            report_data: (&*payload as *const TtDailyReportDataV1).cast(),
            report_data_size: size_of::<TtDailyReportDataV1>() as u64,
        };

        Self {
            _arena: arena,
            _records: records,
            _stats: stats,
            _nodes: nodes,
            _payload: ReportPayloadBox::Daily(payload),
            view,
            kind,
        }
    }

    #[must_use]
    pub fn range(data: &RangeReportData, kind: ReportKind) -> Self {
        let mut arena = StringArena::default();
        let nodes = flatten_tree(&mut arena, &data.project_tree);

        let payload = Box::new(TtRangeReportDataV1 {
            struct_size: size_of::<TtRangeReportDataV1>() as u32,
            version: TT_REPORT_DATA_VERSION_V1,
            range_label: arena.view(&data.range_label),
            start_date: arena.view(&data.start_date),
            end_date: arena.view(&data.end_date),
            requested_days: data.requested_days,
            total_duration: data.total_duration,
            actual_days: data.actual_days,
            status_true_days: data.status_true_days,
            sleep_true_days: data.sleep_true_days,
            exercise_true_days: data.exercise_true_days,
            cardio_true_days: data.cardio_true_days,
            anaerobic_true_days: data.anaerobic_true_days,
            is_valid: u8::from(data.is_valid),
            reserved0: [0; 3],
            project_tree_nodes: nodes.as_ptr(),
            project_tree_node_count: nodes.len() as u32,
            reserved: 0,
        });

        let abi_kind = abi_report_kind(kind);
        let view = TtReportDataView {
            struct_size: size_of::<TtReportDataView>() as u32,
            version: TT_REPORT_DATA_VIEW_VERSION_CURRENT,
            report_data_kind: abi_kind,
            report_data_version: TT_REPORT_DATA_VERSION_V1,
            report_data: (&*payload as *const TtRangeReportDataV1).cast(),
            report_data_size: size_of::<TtRangeReportDataV1>() as u64,
        };

        Self {
            _arena: arena,
            _records: Vec::new(),
            _stats: Vec::new(),
            _nodes: nodes,
            _payload: ReportPayloadBox::Range(payload),
            view,
            kind: abi_kind,
        }
    }

    #[must_use]
    pub fn view(&self) -> &TtReportDataView {
        &self.view
    }

    #[must_use]
    pub fn kind(&self) -> u32 {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reports::{DayMetadata, TimeRecord};
    use crate::domain::tree::{build_project_tree_from_ids, ProjectInfoProvider};

    struct FixedProvider;

    impl ProjectInfoProvider for FixedProvider {
        fn path_parts(&self, project_id: i64) -> Vec<String> {
            match project_id {
                1 => vec!["study".to_string()],
                2 => vec!["study".to_string(), "math".to_string()],
                3 => vec!["rest".to_string()],
                _ => Vec::new(),
            }
        }
    }

    fn sample_daily() -> DailyReportData {
        let mut data = DailyReportData {
            date: "2025-01-01".to_string(),
            metadata: DayMetadata {
                status: "1".to_string(),
                sleep: "0".to_string(),
                remark: "ok".to_string(),
                getup_time: "06:00".to_string(),
                exercise: "0".to_string(),
            },
            total_duration: 4200,
            detailed_records: vec![TimeRecord {
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                project_path: "study_math".to_string(),
                duration_seconds: 3600,
                activity_remark: Some("focus".to_string()),
            }],
            ..DailyReportData::default()
        };
        data.stats.insert("study_time".to_string(), 3600);
        data.project_stats = vec![(2, 3600), (3, 600)];
        build_project_tree_from_ids(&mut data.project_tree, &data.project_stats, &FixedProvider);
        data
    }

    fn view_str(view: &TtStringView) -> &str {
        if view.data.is_null() {
            return "";
        }
        let bytes = unsafe { std::slice::from_raw_parts(view.data, view.length as usize) };
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn daily_payload_carries_records_stats_and_tree() {
        let data = sample_daily();
        let payload = ReportPayload::daily(&data);

        assert_eq!(payload.kind(), TT_REPORT_DATA_KIND_DAILY);
        let view = payload.view();
        assert_eq!(view.report_data_kind, TT_REPORT_DATA_KIND_DAILY);

        let daily = unsafe { &*view.report_data.cast::<TtDailyReportDataV1>() };
        assert_eq!(view_str(&daily.date), "2025-01-01");
        assert_eq!(daily.total_duration, 4200);
        assert_eq!(daily.detailed_record_count, 1);
        assert_eq!(daily.stats_count, 1);

        let record = unsafe { &*daily.detailed_records };
        assert_eq!(view_str(&record.project_path), "study_math");
        assert_eq!(record.has_activity_remark, 1);
        assert_eq!(view_str(&record.activity_remark), "focus");
    }

    #[test]
    fn flattened_tree_is_topological_and_sorted() {
        let data = sample_daily();
        let payload = ReportPayload::daily(&data);
        let daily = unsafe { &*payload.view().report_data.cast::<TtDailyReportDataV1>() };

        let nodes = unsafe {
            std::slice::from_raw_parts(
                daily.project_tree_nodes,
                daily.project_tree_node_count as usize,
            )
        };
        // study (3600) before rest (600); math follows its parent
        assert_eq!(nodes.len(), 3);
        assert_eq!(view_str(&nodes[0].name), "study");
        assert_eq!(nodes[0].parent_index, -1);
        assert_eq!(view_str(&nodes[1].name), "math");
        assert_eq!(nodes[1].parent_index, 0);
        assert_eq!(view_str(&nodes[2].name), "rest");
        assert_eq!(nodes[2].parent_index, -1);

        for (index, node) in nodes.iter().enumerate() {
            assert!(node.parent_index < index as i32);
        }
    }

    #[test]
    fn range_payload_keeps_flag_counts_and_kind() {
        let data = RangeReportData {
            range_label: "2025-07".to_string(),
            start_date: "2025-07-01".to_string(),
            end_date: "2025-07-31".to_string(),
            actual_days: 20,
            total_duration: 36_000,
            status_true_days: 15,
            sleep_true_days: 18,
            ..RangeReportData::default()
        };
        let payload = ReportPayload::range(&data, ReportKind::Monthly);
        assert_eq!(payload.kind(), TT_REPORT_DATA_KIND_MONTHLY);

        let range = unsafe { &*payload.view().report_data.cast::<TtRangeReportDataV1>() };
        assert_eq!(range.actual_days, 20);
        assert_eq!(range.status_true_days, 15);
        assert_eq!(range.is_valid, 1);
        assert_eq!(view_str(&range.range_label), "2025-07");
    }

    #[test]
    fn moving_the_payload_keeps_views_valid() {
        let data = sample_daily();
        let payload = ReportPayload::daily(&data);
        let moved = payload;
        let daily = unsafe { &*moved.view().report_data.cast::<TtDailyReportDataV1>() };
        assert_eq!(view_str(&daily.date), "2025-01-01");
    }
}
