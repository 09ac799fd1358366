// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Malformed timestamp or field value
    Format(String),
    /// Table cell that cannot be read as a position
    Unparseable { row: usize, column: usize, value: String },
    /// Remote resource missing
    NotFound(String),
    /// Remote API rejected a single label operation
    Api { status: Option<u16>, message: String },
    /// Authentication or network failure
    Transport(String),
    /// Object storage failure
    Storage(String),
    /// Video could not be probed
    Probe(String),
    /// External report generation failed
    Report(String),
    /// File system operation failed
    FsFail(String),
    /// Invalid configuration
    Config(String),
}

impl DomainError {
    /// Whether the error must abort a batch instead of being collected per row
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Transport(_))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::Format(msg) => write!(f, "Invalid format: {}", msg),
            DomainError::Unparseable { row, column, value } => write!(
                f,
                "Cannot read '{}' at row {}, column {} as a video position",
                value, row, column
            ),
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::Api {
                status: Some(status),
                message,
            } => write!(f, "API error ({}): {}", status, message),
            DomainError::Api {
                status: None,
                message,
            } => write!(f, "API error: {}", message),
            DomainError::Transport(msg) => write!(f, "Transport error: {}", msg),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
            DomainError::Probe(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::Report(msg) => write!(f, "Report generation failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
