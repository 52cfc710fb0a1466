//! CLI argument definitions for the MODS transpiler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "mods-transpiler",
    version,
    about = "MODS Transpiler - Convert metadata spreadsheets to MODS XML",
    long_about = "Convert tabular bibliographic metadata to normalized MODS XML.\n\n\
                  Renders an XML template per spreadsheet row, canonicalizes the\n\
                  result, and aggregates the records or writes one file per row."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a spreadsheet into one aggregated container document.
    Convert(ConvertArgs),

    /// Convert a spreadsheet into one XML file per row.
    Split(SplitArgs),

    /// Validate XML files against the record schema.
    Validate(ValidateArgs),

    /// Report spreadsheet headers that the template never references.
    Headers(HeadersArgs),
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Path to the input spreadsheet (.csv, .xls or .xlsx).
    #[arg(value_name = "SPREADSHEET")]
    pub spreadsheet: PathBuf,

    /// XML template to render per row (default: the bundled MODS template).
    #[arg(long = "template", value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Write the container document here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SplitArgs {
    /// Path to the input spreadsheet (.csv, .xls or .xlsx).
    #[arg(value_name = "SPREADSHEET")]
    pub spreadsheet: PathBuf,

    /// XML template to render per row (default: the bundled MODS template).
    #[arg(long = "template", value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Directory for the per-row record files.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// XML files to check.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct HeadersArgs {
    /// Path to the input spreadsheet (.csv, .xls or .xlsx).
    #[arg(value_name = "SPREADSHEET")]
    pub spreadsheet: PathBuf,

    /// XML template to compare against (default: the bundled MODS template).
    #[arg(long = "template", value_name = "PATH")]
    pub template: Option<PathBuf>,
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
