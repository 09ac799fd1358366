// Ports - Interface definitions (contracts)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::domain::model::*;
use async_trait::async_trait;

/// Bearer token issued by the label API
#[derive(Clone, PartialEq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Port for the remote label store
#[async_trait]
pub trait LabelApiPort: Send + Sync {
    /// Log in and obtain a bearer token
    async fn authenticate(&self) -> Result<AuthToken, DomainError>;

    /// Fetch a video result; `NotFound` when it does not exist
    async fn get_video_result(
        &self,
        token: &AuthToken,
        video_result_id: i64,
    ) -> Result<VideoResult, DomainError>;

    /// List labels of a video result, optionally filtered by name
    async fn list_labels(
        &self,
        token: &AuthToken,
        video_result_id: i64,
        name: Option<&str>,
    ) -> Result<Vec<RemoteLabel>, DomainError>;

    /// Create a label, returning the new id when the server reports one
    async fn create_label(
        &self,
        token: &AuthToken,
        label: &RemoteLabel,
    ) -> Result<Option<i64>, DomainError>;

    /// Replace an existing label
    async fn update_label(
        &self,
        token: &AuthToken,
        label_id: i64,
        label: &RemoteLabel,
    ) -> Result<(), DomainError>;

    /// Delete a label
    async fn delete_label(&self, token: &AuthToken, label_id: i64) -> Result<(), DomainError>;
}

/// Port for the object storage bucket
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Download an object into a local file, returning the byte count
    async fn get_object(&self, key: &str, destination: &Path) -> Result<u64, DomainError>;

    /// Upload a local file as an object
    async fn put_object(&self, key: &str, source: &Path) -> Result<(), DomainError>;
}

/// Port for label table files
pub trait TableFilePort: Send + Sync {
    /// Read an editable table
    fn read_table(&self, path: &Path) -> Result<LabelTable, DomainError>;

    /// Write an editable table
    fn write_table(&self, path: &Path, table: &LabelTable) -> Result<(), DomainError>;

    /// Write labeled records in frame units
    fn write_labels(&self, path: &Path, labels: &LabelSet) -> Result<(), DomainError>;
}

/// Port for reading video properties
pub trait VideoProbePort: Send + Sync {
    /// Frame rate of the primary video stream
    fn probe_frame_rate(&self, path: &Path) -> Result<FrameRate, DomainError>;
}

/// Port for the external PDF report generator
#[async_trait]
pub trait ReportGeneratorPort: Send + Sync {
    /// Produce a report for the staged artifacts and return the PDF path
    async fn generate(
        &self,
        work_dir: &Path,
        video_result_id: i64,
        output_dir: &Path,
    ) -> Result<PathBuf, DomainError>;
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Get configuration value with default
    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Save configuration to file
    async fn save_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;

    /// Get all configuration keys
    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError>;
}

/// Port for logging and observability
#[async_trait]
pub trait LogPort: Send + Sync {
    /// Log info message
    async fn info(&self, message: &str);

    /// Log warning message
    async fn warn(&self, message: &str);

    /// Log error message
    async fn error(&self, message: &str);

    /// Log debug message
    async fn debug(&self, message: &str);

    /// Log structured event
    async fn log_event(&self, event: &LogEvent);
}

/// Log event with structured data
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Log level enumeration
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
