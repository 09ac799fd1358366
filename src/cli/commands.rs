//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::adapters::TomlConfigAdapter;
use crate::app::export_interactor::default_export_name;
use crate::app::AppContainer;
use crate::cli::args::{
    ConfigCommand, ConvertCommand, ExportArgs, PullArgs, PushArgs, RateArgs, ReportArgs,
    VideoResultArgs,
};
use crate::config_initialization::AppSettings;
use crate::domain::model::{to_frame, to_timestamp, FrameRate, VideoResultKey};
use crate::ports::ConfigPort;

/// Execute a convert subcommand
pub fn convert(command: ConvertCommand) -> Result<()> {
    match command {
        ConvertCommand::ToFrame { time, fps } => {
            let frame = to_frame(&time, fps)
                .with_context(|| format!("Cannot convert '{}' at {} fps", time, fps))?;
            println!("{}", frame);
        }
        ConvertCommand::ToTime { frame, fps } => {
            let time = to_timestamp(frame, fps)
                .with_context(|| format!("Cannot convert frame {} at {} fps", frame, fps))?;
            println!("{}", time);
        }
    }
    Ok(())
}

/// Execute the export command
pub async fn export(container: &dyn AppContainer, args: ExportArgs) -> Result<()> {
    let interactor = container.export_interactor();
    let rate = resolve_rate(container, &args.rate)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.rate.video.as_deref()));

    let table = interactor
        .import_table(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let labels = interactor
        .export_labels(&table, rate, &output)
        .await
        .context("Failed to export labels")?;

    info!("Export completed: {} labels", labels.len());
    println!("{}", output.display());
    Ok(())
}

/// Execute the push command
pub async fn push(container: &dyn AppContainer, args: PushArgs) -> Result<()> {
    let key = video_result_key(args.target)?;
    let rate = resolve_rate(container, &args.rate)?;

    let table = container
        .export_interactor()
        .import_table(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let labels = table.to_label_set(rate).context("Failed to convert table")?;

    let report = container
        .sync_interactor()
        .sync(key, &labels)
        .await
        .with_context(|| format!("Failed to push labels for {}", key))?;

    println!(
        "deleted {}, created {}, updated {}, failed {}",
        report.deleted,
        report.created,
        report.updated,
        report.errors.len()
    );
    if !report.is_success() {
        bail!(
            "{} label(s) could not be exported:\n{}",
            report.errors.len(),
            report.error_message()
        );
    }
    Ok(())
}

/// Execute the pull command
pub async fn pull(container: &dyn AppContainer, settings: &AppSettings, args: PullArgs) -> Result<()> {
    let key = video_result_key(args.target)?;

    let pulled = container
        .pull_interactor()
        .pull(key, args.rate.video.as_deref(), &settings.work_dir)
        .await
        .with_context(|| format!("Failed to pull {}", key))?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.csv", key.video_result_id)));
    container
        .export_interactor()
        .save_table(&output, &pulled.table)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        video = %pulled.video_path.display(),
        fps = pulled.rate.fps(),
        rows = pulled.table.len(),
        "Pull completed"
    );
    println!("{}", output.display());
    Ok(())
}

/// Execute the report command
pub async fn report(container: &dyn AppContainer, args: ReportArgs) -> Result<()> {
    let key = video_result_key(args.target)?;
    let rate = resolve_rate(container, &args.rate)?;
    let interactor = container.report_interactor()?;

    let table = container
        .export_interactor()
        .import_table(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let outcome = interactor
        .generate(key, &table, rate)
        .await
        .with_context(|| format!("Failed to generate report for {}", key))?;

    info!(pdf = %outcome.pdf_path.display(), "Report completed");
    println!("{}", outcome.object_key);
    Ok(())
}

/// Execute a config subcommand
pub async fn config(config: &TomlConfigAdapter, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            match config.loaded_from() {
                Some(path) => println!("# loaded from {}", path.display()),
                None => println!("# defaults (no configuration file)"),
            }
            for key in config.get_all_config_keys().await? {
                let value = config.get_config(&key).await?.unwrap_or_default();
                println!("{} = {}", key, TomlConfigAdapter::display_value(&key, &value));
            }
        }
        ConfigCommand::Init { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from("labeler.toml"));
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            config
                .save_config(&path.to_string_lossy())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            warn!("Secrets were written in plain text to {}", path.display());
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Frame rate from `--fps`, or probed from `--video`
fn resolve_rate(container: &dyn AppContainer, rate: &RateArgs) -> Result<FrameRate> {
    match (&rate.video, rate.fps) {
        (_, Some(fps)) => Ok(FrameRate::new(fps)?),
        (Some(video), None) => container
            .probe_port()
            .probe_frame_rate(video)
            .with_context(|| format!("Failed to read frame rate of {}", video.display())),
        (None, None) => bail!("either --video or --fps is required"),
    }
}

fn video_result_key(target: VideoResultArgs) -> Result<VideoResultKey> {
    Ok(VideoResultKey::new(target.user_id, target.video_result_id)?)
}

/// Labeled export name: after the video when given, else next to the table
fn default_output(input: &Path, video: Option<&Path>) -> PathBuf {
    match video {
        Some(video) => PathBuf::from(default_export_name(video)),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "labels".to_string());
            input.with_file_name(format!("{}_labeled.csv", stem))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_names() {
        assert_eq!(
            default_output(Path::new("tables/session.csv"), Some(Path::new("/v/clip_3.mp4"))),
            PathBuf::from("clip_3.csv")
        );
        assert_eq!(
            default_output(Path::new("tables/session.csv"), None),
            PathBuf::from("tables/session_labeled.csv")
        );
    }
}
