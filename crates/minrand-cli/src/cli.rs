//! CLI argument definitions for minrand.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "minrand",
    version,
    about = "Minimization randomization for clinical trials",
    long_about = "Assign subjects to treatment groups with the Pocock-Simon minimization \
                  method.\n\n\
                  Projects are stored as JSON documents in a store directory; every \
                  change is committed atomically."
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

    /// Include covariate values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Directory holding project files.
    #[arg(
        long = "store-dir",
        value_name = "DIR",
        env = "MINRAND_STORE_DIR",
        default_value = "minrand-data",
        global = true
    )]
    pub store_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a project from a TOML definition.
    Create(CreateArgs),

    /// Randomize one subject.
    Assign(AssignArgs),

    /// Withdraw a subject from the balance counts.
    Remove(SubjectArgs),

    /// Move a subject to another group.
    Reassign(ReassignArgs),

    /// Open enrollment.
    Open(ProjectArg),

    /// Close enrollment.
    Close(ProjectArg),

    /// Show group totals and per-level balance.
    Stats(StatsArgs),

    /// List stored projects.
    List,
}

#[derive(Parser)]
pub struct CreateArgs {
    /// Path to the project definition (TOML).
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Store key (default: the definition's file stem).
    #[arg(long = "key", value_name = "KEY")]
    pub key: Option<String>,
}

#[derive(Parser)]
pub struct ProjectArg {
    /// Project key.
    #[arg(value_name = "PROJECT")]
    pub project: String,
}

#[derive(Parser)]
pub struct AssignArgs {
    #[arg(value_name = "PROJECT")]
    pub project: String,

    #[arg(long = "subject", value_name = "ID")]
    pub subject: String,

    /// Who performed the randomization.
    #[arg(long = "assigner", value_name = "NAME", env = "USER")]
    pub assigner: String,

    /// Covariate value, repeated for each variable.
    #[arg(long = "value", value_name = "VARIABLE=LEVEL", required = true)]
    pub values: Vec<String>,

    /// Seed the draw for a reproducible assignment.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Commit attempts when other writers change the project meanwhile.
    #[arg(long = "max-attempts", value_name = "N", default_value_t = 3)]
    pub max_attempts: u32,
}

#[derive(Parser)]
pub struct SubjectArgs {
    #[arg(value_name = "PROJECT")]
    pub project: String,

    #[arg(long = "subject", value_name = "ID")]
    pub subject: String,
}

#[derive(Parser)]
pub struct ReassignArgs {
    #[arg(value_name = "PROJECT")]
    pub project: String,

    #[arg(long = "subject", value_name = "ID")]
    pub subject: String,

    /// Target group name.
    #[arg(long = "group", value_name = "GROUP")]
    pub group: String,
}

#[derive(Parser)]
pub struct StatsArgs {
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Print the report as JSON.
    #[arg(long = "json")]
    pub json: bool,
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
