//! Exercise labeler library
//!
//! Converts exercise segment tables between wall-clock timestamps and frame
//! indices, derives per-segment label ids and reconciles them with a remote
//! label store.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{
    to_frame, to_timestamp, FrameRate, LabelRecord, LabelSet, LabelTable, SegmentRow, Timestamp,
    VideoResultKey,
};
pub use error::{LabelerError, LabelerResult};
