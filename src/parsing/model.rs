use std::collections::BTreeSet;

/// Per-date metadata block. Created when the parser sees a `Date:` header
/// and mutated until the day is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: String,
    pub status: String,
    pub sleep: String,
    pub remark: String,
    pub getup_time: String,
    pub exercise: String,
}

/// One `HH:MM~HH:MM<project_path>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRecord {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub project_path: String,
    pub duration_seconds: i64,
}

/// `(child_path, parent_path)` pairs; ordered for deterministic ingestion.
pub type ParentChildSet = BTreeSet<(String, String)>;
