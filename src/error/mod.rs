//! Error handling module for the labeler

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for library entry points
#[derive(Error, Debug)]
pub enum LabelerError {
    /// Domain rule or port failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Label table file could not be read or written
    #[error("Label table error in {path}: {message}")]
    TableFile { path: String, message: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpeg(#[from] ffmpeg_next::Error),
}

impl From<LabelerError> for DomainError {
    fn from(err: LabelerError) -> Self {
        match err {
            LabelerError::Domain(inner) => inner,
            LabelerError::TableFile { path, message } => {
                DomainError::Format(format!("{}: {}", path, message))
            }
            LabelerError::ConfigParse(e) => DomainError::Config(e.to_string()),
            LabelerError::Csv(e) => DomainError::Format(e.to_string()),
            LabelerError::Io(e) => DomainError::FsFail(e.to_string()),
            LabelerError::FFmpeg(e) => DomainError::Probe(e.to_string()),
        }
    }
}

/// Result type alias for labeler operations
pub type LabelerResult<T> = std::result::Result<T, LabelerError>;
