//! The report service: composes queriers with formatter plugins for
//! single reports and for batch exports.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::Connection;

use crate::domain::reports::{DailyReportData, RangeReportData, ReportFormat, ReportKind};
use crate::domain::time::Clock;
use crate::plugin::{plugin_basename, FormatterPlugin};
use crate::query::day::{fetch_all_daily, fetch_daily_report};
use crate::query::range::{
    fetch_all_periods, fetch_all_ranges, fetch_range_report, BatchRangeKind, RangeRequest,
};
use crate::query::{ensure_daily_tree, ensure_range_tree};
use crate::reporting::config::{AppConfig, ConfigPayload};
use crate::reporting::payload::ReportPayload;
use crate::storage::ProjectNameCache;

/// Daily batch output: `(year, month) -> [(date, report)]` in date order.
pub type GroupedDailyReports = BTreeMap<(i64, i64), Vec<(String, String)>>;

pub struct ReportService<'conn> {
    conn: &'conn Connection,
    config: AppConfig,
    plugin_dir: PathBuf,
    clock: Clock,
    cache: ProjectNameCache,
    plugins: HashMap<&'static str, FormatterPlugin>,
}

impl<'conn> ReportService<'conn> {
    #[must_use]
    pub fn new(conn: &'conn Connection, config: AppConfig, plugin_dir: PathBuf, clock: Clock) -> Self {
        Self {
            conn,
            config,
            plugin_dir,
            clock,
            cache: ProjectNameCache::new(),
            plugins: HashMap::new(),
        }
    }

    /// Loads (or reuses) the plugin serving `kind`+`format`. The cache
    /// keeps one loaded library per basename for the whole session.
    fn plugin<'p>(
        plugins: &'p mut HashMap<&'static str, FormatterPlugin>,
        plugin_dir: &Path,
        kind: ReportKind,
        format: ReportFormat,
    ) -> anyhow::Result<&'p FormatterPlugin> {
        let basename = plugin_basename(kind, format);
        if !plugins.contains_key(basename) {
            let plugin = FormatterPlugin::load(plugin_dir, basename)
                .with_context(|| format!("loading formatter plugin {basename}"))?;
            plugins.insert(basename, plugin);
        }
        Ok(&plugins[basename])
    }

    // -- single reports ----------------------------------------------------

    pub fn run_daily_query(&mut self, date: &str, format: ReportFormat) -> anyhow::Result<String> {
        let data = fetch_daily_report(self.conn, date, &mut self.cache)?;
        self.format_daily(&data, format)
    }

    pub fn run_monthly_query(
        &mut self,
        year_month: &str,
        format: ReportFormat,
    ) -> anyhow::Result<String> {
        self.run_range_query(&RangeRequest::Month(year_month.to_string()), format)
    }

    pub fn run_weekly_query(
        &mut self,
        iso_week: &str,
        format: ReportFormat,
    ) -> anyhow::Result<String> {
        self.run_range_query(&RangeRequest::Week(iso_week.to_string()), format)
    }

    pub fn run_yearly_query(&mut self, year: &str, format: ReportFormat) -> anyhow::Result<String> {
        self.run_range_query(&RangeRequest::Year(year.to_string()), format)
    }

    pub fn run_period_query(&mut self, days: i32, format: ReportFormat) -> anyhow::Result<String> {
        self.run_range_query(&RangeRequest::Period(days), format)
    }

    pub fn run_date_range_query(
        &mut self,
        start: &str,
        end: &str,
        format: ReportFormat,
    ) -> anyhow::Result<String> {
        self.run_range_query(
            &RangeRequest::Dates {
                start: start.to_string(),
                end: end.to_string(),
            },
            format,
        )
    }

    fn run_range_query(
        &mut self,
        request: &RangeRequest,
        format: ReportFormat,
    ) -> anyhow::Result<String> {
        let data = fetch_range_report(self.conn, request, &mut self.cache, &self.clock)?;
        self.format_range(&data, request.kind(), format)
    }

    fn format_daily(&mut self, data: &DailyReportData, format: ReportFormat) -> anyhow::Result<String> {
        let config_payload = ConfigPayload::build(&self.config, ReportKind::Daily, format);
        let plugin = Self::plugin(&mut self.plugins, &self.plugin_dir, ReportKind::Daily, format)?;
        let handle = plugin.create_formatter(config_payload.descriptor())?;
        let report_payload = ReportPayload::daily(data);
        Ok(handle.format_report(report_payload.view(), report_payload.kind())?)
    }

    fn format_range(
        &mut self,
        data: &RangeReportData,
        kind: ReportKind,
        format: ReportFormat,
    ) -> anyhow::Result<String> {
        let config_payload = ConfigPayload::build(&self.config, kind, format);
        let plugin = Self::plugin(&mut self.plugins, &self.plugin_dir, kind, format)?;
        let handle = plugin.create_formatter(config_payload.descriptor())?;
        let report_payload = ReportPayload::range(data, kind);
        Ok(handle.format_report(report_payload.view(), report_payload.kind())?)
    }

    // -- batch exports -----------------------------------------------------

    /// All days with records, grouped by `(year, month)`. One formatter
    /// handle serves the whole batch.
    pub fn export_all_daily(&mut self, format: ReportFormat) -> anyhow::Result<GroupedDailyReports> {
        let mut batch = fetch_all_daily(self.conn, &mut self.cache)?;

        let config_payload = ConfigPayload::build(&self.config, ReportKind::Daily, format);
        let plugin = Self::plugin(&mut self.plugins, &self.plugin_dir, ReportKind::Daily, format)?;
        let handle = plugin.create_formatter(config_payload.descriptor())?;

        let mut grouped = GroupedDailyReports::new();
        for (date, year, month) in &batch.date_order {
            let Some(data) = batch.data_map.get_mut(date) else {
                continue;
            };
            if data.total_duration == 0 {
                continue;
            }
            ensure_daily_tree(data, &self.cache);
            let report_payload = ReportPayload::daily(data);
            let report = handle.format_report(report_payload.view(), report_payload.kind())?;
            grouped
                .entry((*year, *month))
                .or_default()
                .push((date.clone(), report));
        }
        Ok(grouped)
    }

    pub fn export_all_monthly(
        &mut self,
        format: ReportFormat,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.export_ranges(BatchRangeKind::Month, ReportKind::Monthly, format)
    }

    pub fn export_all_weekly(
        &mut self,
        format: ReportFormat,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.export_ranges(BatchRangeKind::Week, ReportKind::Weekly, format)
    }

    pub fn export_all_yearly(
        &mut self,
        format: ReportFormat,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.export_ranges(BatchRangeKind::Year, ReportKind::Yearly, format)
    }

    fn export_ranges(
        &mut self,
        batch_kind: BatchRangeKind,
        report_kind: ReportKind,
        format: ReportFormat,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        let mut groups = fetch_all_ranges(self.conn, batch_kind, &mut self.cache)?;

        let config_payload = ConfigPayload::build(&self.config, report_kind, format);
        let plugin = Self::plugin(&mut self.plugins, &self.plugin_dir, report_kind, format)?;
        let handle = plugin.create_formatter(config_payload.descriptor())?;

        let mut reports = BTreeMap::new();
        for (label, data) in &mut groups {
            ensure_range_tree(data, &self.cache);
            let report_payload = ReportPayload::range(data, report_kind);
            let report = handle.format_report(report_payload.view(), report_payload.kind())?;
            reports.insert(label.clone(), report);
        }
        Ok(reports)
    }

    pub fn export_all_periods(
        &mut self,
        days_list: &[i32],
        format: ReportFormat,
    ) -> anyhow::Result<BTreeMap<i32, String>> {
        let mut periods = fetch_all_periods(self.conn, days_list, &mut self.cache, &self.clock)?;

        let config_payload = ConfigPayload::build(&self.config, ReportKind::Period, format);
        let plugin = Self::plugin(&mut self.plugins, &self.plugin_dir, ReportKind::Period, format)?;
        let handle = plugin.create_formatter(config_payload.descriptor())?;

        let mut reports = BTreeMap::new();
        for (days, data) in &mut periods {
            ensure_range_tree(data, &self.cache);
            let report_payload = ReportPayload::range(data, ReportKind::Period);
            let report = handle.format_report(report_payload.view(), report_payload.kind())?;
            reports.insert(*days, report);
        }
        Ok(reports)
    }
}
