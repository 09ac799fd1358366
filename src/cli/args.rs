//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Conversions between `HH:MM:SS` and frame indices
#[derive(Subcommand, Debug)]
pub enum ConvertCommand {
    /// Timestamp to frame index
    ToFrame {
        /// Timestamp (HH:MM:SS)
        #[arg(short, long)]
        time: String,
        /// Frames per second
        #[arg(long)]
        fps: f64,
    },
    /// Frame index to timestamp
    ToTime {
        /// Frame index
        #[arg(short, long)]
        frame: u64,
        /// Frames per second
        #[arg(long)]
        fps: f64,
    },
}

/// Where the frame rate comes from
#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    /// Video whose frame rate is probed
    #[arg(long, conflicts_with = "fps")]
    pub video: Option<PathBuf>,

    /// Frame rate to use instead of probing a video
    #[arg(long)]
    pub fps: Option<f64>,
}

/// Identifies a video result on the server
#[derive(Args, Debug, Clone, Copy)]
pub struct VideoResultArgs {
    /// Owner of the video result
    #[arg(long)]
    pub user_id: i64,

    /// Video result id
    #[arg(long)]
    pub video_result_id: i64,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Segment table (CSV)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Labeled output (default: named after the video or the table)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub rate: RateArgs,
}

/// Arguments for the push command
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Segment table (CSV)
    #[arg(short, long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub target: VideoResultArgs,

    #[command(flatten)]
    pub rate: RateArgs,
}

/// Arguments for the pull command
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub target: VideoResultArgs,

    #[command(flatten)]
    pub rate: RateArgs,

    /// Table to write (default: <video_result_id>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Segment table (CSV)
    #[arg(short, long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub target: VideoResultArgs,

    #[command(flatten)]
    pub rate: RateArgs,
}

/// Configuration commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the resolved configuration, secrets masked
    Show,
    /// Write the resolved configuration to a file
    Init {
        /// Destination (default: labeler.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
