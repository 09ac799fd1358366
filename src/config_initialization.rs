//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::{ApiSettings, StorageSettings, TomlConfigAdapter};
use crate::cli::Cli;
use crate::domain::errors::DomainError;
use crate::ports::{ConfigPort, LogLevel};

/// Resolved settings every adapter is built from
#[derive(Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub api_username: String,
    pub api_password: String,
    pub storage_url: String,
    pub bucket: String,
    pub storage_token: Option<String>,
    pub work_dir: PathBuf,
    pub report_command: String,
    pub request_timeout: Duration,
    pub log_level: LogLevel,
}

impl AppSettings {
    /// Read the settings out of a validated configuration
    pub async fn from_config(config: &dyn ConfigPort) -> Result<Self, DomainError> {
        let text = |value: Option<String>| value.unwrap_or_default();

        let timeout_secs: u64 = config
            .get_config_or_default("request_timeout_secs", "30")
            .await?
            .parse()
            .map_err(|e| DomainError::Config(format!("Invalid request_timeout_secs: {}", e)))?;
        let log_level = LogLevel::parse(&config.get_config_or_default("log_level", "info").await?)?;
        let work_dir = config
            .get_config("work_dir")
            .await?
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("exercise_labeler"));

        Ok(Self {
            api_url: text(config.get_config("api_url").await?),
            api_username: text(config.get_config("api_username").await?),
            api_password: text(config.get_config("api_password").await?),
            storage_url: text(config.get_config("storage_url").await?),
            bucket: text(config.get_config("bucket").await?),
            storage_token: config
                .get_config("storage_token")
                .await?
                .filter(|token| !token.is_empty()),
            work_dir,
            report_command: text(config.get_config("report_command").await?),
            request_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            username: self.api_username.clone(),
            password: self.api_password.clone(),
            timeout: self.request_timeout,
        }
    }

    pub fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            base_url: self.storage_url.clone(),
            bucket: self.bucket.clone(),
            token: self.storage_token.clone(),
            timeout: self.request_timeout,
        }
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(cli: &Cli) -> Result<(TomlConfigAdapter, AppSettings)> {
    // Step 1: Load defaults
    let config = TomlConfigAdapter::new()?;

    // Step 2: Load the config file, if any
    load_config_file(&config, cli.config.as_deref()).await?;

    // Step 3: Override with environment variables
    let env_overrides = config.apply_env_overrides()?;
    if env_overrides > 0 {
        debug!("Applied {} environment variable overrides", env_overrides);
    }

    // Step 4: Override with CLI arguments
    apply_cli_configuration_overrides(&config, cli).await?;

    config
        .validate_config()
        .await
        .context("Invalid configuration")?;
    let settings = AppSettings::from_config(&config).await?;

    info!(
        api_url = %settings.api_url,
        storage_url = %settings.storage_url,
        work_dir = %settings.work_dir.display(),
        "Configuration resolved"
    );
    Ok((config, settings))
}

/// Load configuration from an explicit path or the default location
async fn load_config_file(config: &TomlConfigAdapter, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = TomlConfigAdapter::get_default_config_path();
            if !default.exists() {
                debug!("No configuration file found, using defaults");
                return Ok(());
            }
            default
        }
    };

    config
        .load_config(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(())
}

/// Apply CLI argument overrides to configuration
async fn apply_cli_configuration_overrides(config: &TomlConfigAdapter, cli: &Cli) -> Result<()> {
    let mut cli_overrides = 0;

    if let Some(level) = &cli.log_level {
        config.set_config("log_level", level).await?;
        cli_overrides += 1;
    }
    if let Some(work_dir) = &cli.work_dir {
        config
            .set_config("work_dir", &work_dir.to_string_lossy())
            .await?;
        cli_overrides += 1;
    }

    if cli_overrides > 0 {
        debug!("Applied {} CLI configuration overrides", cli_overrides);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_then_cli_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labeler.toml");
        std::fs::write(
            &path,
            "[labeler]\napi_url = \"http://api.test\"\nlog_level = \"warn\"\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "labeler",
            "--config",
            path.to_str().unwrap(),
            "--log-level",
            "debug",
            "convert",
            "to-frame",
            "--time",
            "00:00:01",
            "--fps",
            "30",
        ]);
        let (config, settings) = initialize_configuration_hierarchy(&cli).await.unwrap();

        assert_eq!(settings.api_url, "http://api.test");
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(config.loaded_from(), Some(path));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_fails() {
        let cli = Cli::parse_from([
            "labeler",
            "--config",
            "/nonexistent/labeler.toml",
            "convert",
            "to-time",
            "--frame",
            "30",
            "--fps",
            "30",
        ]);
        assert!(initialize_configuration_hierarchy(&cli).await.is_err());
    }
}
