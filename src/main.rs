//! Exercise labeler
//!
//! Turns hand-edited exercise segment tables into frame-indexed labels and
//! keeps them in sync with the label API.
//!
//! # Usage
//!
//! ```bash
//! labeler convert to-frame --time 00:00:10 --fps 30
//! labeler export --input session.csv --video session.mp4
//! labeler push --input session.csv --user-id 7 --video-result-id 42 --fps 30
//! labeler pull --user-id 7 --video-result-id 42
//! labeler report --input session.csv --user-id 7 --video-result-id 42 --video full_video.ts
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use exercise_labeler::app::DefaultAppContainer;
use exercise_labeler::cli::{commands, Cli, Commands};
use exercise_labeler::config_initialization::initialize_configuration_hierarchy;
use exercise_labeler::domain::model::FrameRate;
use exercise_labeler::ports::LogLevel;

/// Main entry point for the labeler CLI
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Conversions need neither configuration nor adapters
    if let Commands::Convert(command) = cli.command {
        return commands::convert(command);
    }

    let (config, settings) = initialize_configuration_hierarchy(&cli).await?;
    init_logging(&settings.log_level, cli.json_logs);
    debug!("Configuration loaded from {:?}", config.loaded_from());

    if let Commands::Config(command) = cli.command {
        return commands::config(&config, command).await;
    }

    let fixed_rate = match &cli.command {
        Commands::Pull(args) => args.rate.fps.map(FrameRate::new).transpose()?,
        _ => None,
    };
    let container = DefaultAppContainer::new(&settings, fixed_rate)?;

    // Execute the requested command
    match cli.command {
        Commands::Export(args) => {
            info!("Executing export command");
            commands::export(&container, args).await?;
        }
        Commands::Push(args) => {
            info!("Executing push command");
            commands::push(&container, args).await?;
        }
        Commands::Pull(args) => {
            info!("Executing pull command");
            commands::pull(&container, &settings, args).await?;
        }
        Commands::Report(args) => {
            info!("Executing report command");
            commands::report(&container, args).await?;
        }
        Commands::Convert(_) | Commands::Config(_) => {}
    }

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_logging(level: &LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_filter();
        EnvFilter::new(format!("exercise_labeler={0},labeler={0}", level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
