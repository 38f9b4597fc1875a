//! CLI argument definitions for the extraction builder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "xform",
    version,
    about = "Build nested extraction records from a JSON template and CSV exports",
    long_about = "Build nested extraction records from a JSON template and CSV exports.\n\n\
                  Each unique refid in the SPD table becomes one record; Safety, Harms,\n\
                  Performance and Follow-up rows are attached under their SPD form."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow CSV cell values in log output.
    ///
    /// Cells carry clinical data and are redacted unless this is set.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build records from a template and CSV exports.
    Build(BuildArgs),

    /// List the form prototypes found in a template.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Template JSON (a record, or an array whose first element is one).
    #[arg(long = "template", value_name = "PATH")]
    pub template: PathBuf,

    /// Study Parameters and Demographics CSV (requires refid, spd_id).
    #[arg(long = "spd", value_name = "PATH")]
    pub spd: PathBuf,

    /// Safety CSV (requires refid, spd_id, safety_id).
    #[arg(long = "safety", value_name = "PATH")]
    pub safety: Option<PathBuf>,

    /// Performance (discrete) CSV.
    #[arg(long = "perf", value_name = "PATH")]
    pub performance: Option<PathBuf>,

    /// Harms CSV, linked to Safety rows by safety_id.
    #[arg(long = "harms", value_name = "PATH")]
    pub harms: Option<PathBuf>,

    /// Follow-up CSV.
    #[arg(long = "follow-up", value_name = "PATH")]
    pub follow_up: Option<PathBuf>,

    /// Output JSON path.
    #[arg(long = "out", value_name = "PATH")]
    pub out: PathBuf,

    /// Render numeric spd_id values two digits wide (spd_01).
    #[arg(long = "zero-pad-spd-id")]
    pub zero_pad_spd_id: bool,

    /// Value for every generated node's `user` field
    /// (default: the template Extraction form's user).
    #[arg(long = "user", value_name = "NAME")]
    pub user: Option<String>,

    /// Drop Follow-up rows when the template has no Follow-up form
    /// instead of synthesizing one.
    #[arg(long = "skip-unmatched-follow-up")]
    pub skip_unmatched_follow_up: bool,

    /// Build and report without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Template JSON to inspect.
    #[arg(long = "template", value_name = "PATH")]
    pub template: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
