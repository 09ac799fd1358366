//! CLI module for the exercise labeler
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::*;

/// Exercise video labeler
///
/// Converts hand-edited exercise segment tables into frame-indexed labels,
/// syncs them with the label API and drives report generation.
#[derive(Parser, Debug)]
#[command(name = "labeler")]
#[command(about = "Exercise video labeler - segment tables to frame labels")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (default: config/labeler.toml or labeler.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Scratch directory for downloads and reports
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert between timestamps and frame indices
    #[command(subcommand)]
    Convert(ConvertCommand),
    /// Write the labeled, frame-indexed export of a table
    Export(ExportArgs),
    /// Replace the remote labels of a video result with a table
    Push(PushArgs),
    /// Download a video result and its remote labels into a table
    Pull(PullArgs),
    /// Push labels, then generate and upload the PDF report
    Report(ReportArgs),
    /// Inspect or write the configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}
