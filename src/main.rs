use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use itertools::Itertools;
use walkdir::WalkDir;

use time_tracer::cli::{data_query, Cli, Command, ExportArgs, ExportKind, IngestArgs, ReportTarget};
use time_tracer::domain::reports::ReportFormat;
use time_tracer::domain::time::Clock;
use time_tracer::parsing::{self, LogParser};
use time_tracer::reporting::{AppConfig, ReportService};
use time_tracer::storage::store;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let clock = match std::env::var("TTR_TODAY").ok() {
        Some(today) => {
            let parsed = NaiveDate::parse_from_str(&today, "%Y-%m-%d")
                .map_err(|err| anyhow::anyhow!("Error parsing TTR_TODAY: {err}"))?;
            Clock::with_today(parsed)
        }
        None => Clock::system(),
    };

    match &cli.command {
        Command::Ingest(args) => run_ingest(&cli, args),
        Command::Report { target } => run_report(&cli, target, &clock),
        Command::Export(args) => run_export(&cli, args, &clock),
        Command::Query { action } => {
            let conn = store::open_database(&cli.db)
                .with_context(|| format!("opening database {}", cli.db.display()))?;
            data_query::execute(&conn, action)
        }
    }
}

fn collect_log_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                let entry_path = entry.path();
                if entry_path.is_file()
                    && entry_path.extension().is_some_and(|ext| ext == "txt")
                {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    // overlapping path arguments must not ingest a file twice
    files.into_iter().unique().collect()
}

fn run_ingest(cli: &Cli, args: &IngestArgs) -> Result<()> {
    let mapping = parsing::load_top_level_parents(args.mapping.as_deref());
    let mut parser = LogParser::new(&mapping);

    let files = collect_log_files(&args.paths);
    if files.is_empty() {
        anyhow::bail!("no log files found under the given paths");
    }
    if cli.verbose {
        for file in &files {
            println!("Processing path: {}", file.display());
        }
    }

    let errors = parsing::parse_files(&mut parser, &files);

    let mut conn = store::open_database(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let summary = store::import_parsed(
        &mut conn,
        &parser.days,
        &parser.records,
        &parser.parent_child_pairs,
    )?;

    println!(
        "Imported {} days, {} records, {} projects",
        summary.days, summary.records, summary.projects
    );
    for error in &errors {
        println!("Warning: {error}");
    }
    Ok(())
}

/// Plugin directory resolution: flag, then TTR_PLUGIN_DIR, then the
/// directory the executable lives in.
fn resolve_plugin_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.plugin_dir {
        return dir.clone();
    }
    if let Some(dir) = std::env::var_os("TTR_PLUGIN_DIR") {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn build_service<'conn>(
    cli: &Cli,
    conn: &'conn rusqlite::Connection,
    clock: &Clock,
) -> Result<ReportService<'conn>> {
    let config = AppConfig::load(cli.config.as_deref())?;
    Ok(ReportService::new(
        conn,
        config,
        resolve_plugin_dir(cli),
        clock.clone(),
    ))
}

fn run_report(cli: &Cli, target: &ReportTarget, clock: &Clock) -> Result<()> {
    let conn = store::open_database(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let mut service = build_service(cli, &conn, clock)?;

    let report = match target {
        ReportTarget::Day { date, format } => {
            service.run_daily_query(date, format.to_report_format())?
        }
        ReportTarget::Month { month, format } => {
            service.run_monthly_query(month, format.to_report_format())?
        }
        ReportTarget::Week { week, format } => {
            service.run_weekly_query(week, format.to_report_format())?
        }
        ReportTarget::Year { year, format } => {
            service.run_yearly_query(year, format.to_report_format())?
        }
        ReportTarget::Period { days, format } => {
            service.run_period_query(*days, format.to_report_format())?
        }
        ReportTarget::Range { from, to, format } => {
            service.run_date_range_query(from, to, format.to_report_format())?
        }
    };
    print!("{report}");
    Ok(())
}

fn write_report_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

fn write_labelled_reports(
    output: &Path,
    reports: &BTreeMap<String, String>,
    format: ReportFormat,
) -> Result<usize> {
    for (label, report) in reports {
        let file = output.join(format!("{label}.{}", format.extension()));
        write_report_file(&file, report)?;
    }
    Ok(reports.len())
}

fn run_export(cli: &Cli, args: &ExportArgs, clock: &Clock) -> Result<()> {
    let conn = store::open_database(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let mut service = build_service(cli, &conn, clock)?;
    let format = args.format.to_report_format();

    let written = match args.kind {
        ExportKind::Day => {
            let grouped = service.export_all_daily(format)?;
            let mut written = 0;
            for ((year, month), reports) in &grouped {
                for (date, report) in reports {
                    let file = args
                        .output
                        .join(format!("{year:04}"))
                        .join(format!("{month:02}"))
                        .join(format!("{date}.{}", format.extension()));
                    write_report_file(&file, report)?;
                    written += 1;
                }
            }
            written
        }
        ExportKind::Month => {
            write_labelled_reports(&args.output, &service.export_all_monthly(format)?, format)?
        }
        ExportKind::Week => {
            write_labelled_reports(&args.output, &service.export_all_weekly(format)?, format)?
        }
        ExportKind::Year => {
            write_labelled_reports(&args.output, &service.export_all_yearly(format)?, format)?
        }
        ExportKind::Period => {
            let reports = service.export_all_periods(&args.days, format)?;
            for (days, report) in &reports {
                let file = args
                    .output
                    .join(format!("last_{days}_days.{}", format.extension()));
                write_report_file(&file, report)?;
            }
            reports.len()
        }
    };

    println!("Wrote {written} report(s) to {}", args.output.display());
    Ok(())
}
