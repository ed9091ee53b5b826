pub mod data_query;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::reports::ReportFormat;
use crate::query::filters::QueryFilters;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Time log ingestion, querying and report generation"
)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, value_name = "FILE", default_value = "time_data.db", global = true)]
    pub db: PathBuf,

    /// Directory containing the formatter plugins (default: next to the
    /// executable, or TTR_PLUGIN_DIR)
    #[arg(long, value_name = "DIR", global = true)]
    pub plugin_dir: Option<PathBuf>,

    /// Formatter configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse time-log files and commit them to the database
    Ingest(IngestArgs),
    /// Generate a single report
    Report {
        #[command(subcommand)]
        target: ReportTarget,
    },
    /// Generate reports for every stored entity and write them to disk
    Export(ExportArgs),
    /// Low-level data queries
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Log files or directories to scan for .txt logs
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// JSON mapping of top-level categories, e.g. {"study": "STUDY"}
    #[arg(long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Md,
    Markdown,
    Tex,
    Latex,
    Typ,
    Typst,
}

impl FormatArg {
    #[must_use]
    pub fn to_report_format(self) -> ReportFormat {
        match self {
            FormatArg::Md | FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Tex | FormatArg::Latex => ReportFormat::LaTeX,
            FormatArg::Typ | FormatArg::Typst => ReportFormat::Typst,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ReportTarget {
    /// Daily report for one date
    Day {
        /// Date as YYYY-MM-DD
        date: String,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
    /// Monthly report
    Month {
        /// Month as YYYY-MM
        month: String,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
    /// Weekly report
    Week {
        /// ISO week as YYYY-Www
        week: String,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
    /// Yearly report
    Year {
        /// Year as YYYY
        year: String,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
    /// Report over the last N days
    Period {
        days: i32,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
    /// Report over an arbitrary date range
    Range {
        /// Start date as YYYY-MM-DD
        from: String,
        /// End date as YYYY-MM-DD
        to: String,
        #[arg(long, value_enum, default_value = "md")]
        format: FormatArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Day,
    Month,
    Week,
    Year,
    Period,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Which report family to export
    #[arg(value_enum)]
    pub kind: ExportKind,

    #[arg(long, value_enum, default_value = "md")]
    pub format: FormatArg,

    /// Window lengths for period exports
    #[arg(long, value_delimiter = ',', default_value = "7,30,90,365")]
    pub days: Vec<i32>,

    /// Output directory
    #[arg(long, value_name = "DIR", default_value = "reports")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub year: Option<i64>,
    #[arg(long)]
    pub month: Option<i64>,
    /// Lower date bound (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<String>,
    /// Upper date bound (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<String>,
    /// Day remark contains
    #[arg(long)]
    pub day_remark: Option<String>,
    /// Project path contains
    #[arg(long)]
    pub project: Option<String>,
    /// Activity remark contains
    #[arg(long)]
    pub remark: Option<String>,
    /// Exercise flag (0 or 1)
    #[arg(long)]
    pub exercise: Option<i64>,
    /// Status flag (0 or 1)
    #[arg(long)]
    pub status: Option<i64>,
    /// Days without a recorded getup time
    #[arg(long)]
    pub overnight: bool,
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub reverse: bool,
}

impl FilterArgs {
    #[must_use]
    pub fn to_filters(&self) -> QueryFilters {
        QueryFilters {
            year: self.year,
            month: self.month,
            from_date: self.from.clone(),
            to_date: self.to.clone(),
            day_remark: self.day_remark.clone(),
            project: self.project.clone(),
            remark: self.remark.clone(),
            exercise: self.exercise,
            status: self.status,
            overnight: self.overnight,
            limit: self.limit,
            reverse: self.reverse,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum QueryAction {
    /// Distinct years with data
    Years,
    /// Distinct months, optionally within a year
    Months {
        #[arg(long)]
        year: Option<i64>,
    },
    /// Stored dates, with optional bounds
    Days {
        #[arg(long)]
        year: Option<i64>,
        #[arg(long)]
        month: Option<i64>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        from: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        to: Option<String>,
        #[arg(long)]
        reverse: bool,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Per-day total durations ordered by duration
    #[command(name = "days-duration", alias = "days_duration")]
    DaysDuration(FilterArgs),
    /// Statistics over per-day durations
    #[command(name = "days-stats", alias = "days_stats")]
    DaysStats {
        /// Also print the N longest and shortest days
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Dates matching the full filter set
    Search(FilterArgs),
}
