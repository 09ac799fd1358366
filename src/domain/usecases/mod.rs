// Domain use cases - Outcomes of label reconciliation

use crate::domain::errors::DomainError;

/// What happened to a single record during a sync
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created,
    Updated,
    Failed(String),
}

impl RowOutcome {
    /// Per-row failure message, naming the label and the underlying API error
    pub fn failure(label: &str, error: &DomainError) -> Self {
        RowOutcome::Failed(format!("{}: {}", label, error))
    }
}

/// Summary of one create-or-update reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Failed(message) => self.errors.push(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// All per-row errors joined into one message; empty on full success
    pub fn error_message(&self) -> String {
        self.errors.join("\n")
    }
}
