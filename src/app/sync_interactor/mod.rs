// Sync interactor - Reconciles a local label set with the remote label store

use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::remote_label_for;
use crate::domain::usecases::*;
use crate::ports::*;

/// Interactor for the create-or-update label export
pub struct SyncInteractor {
    api_port: Arc<dyn LabelApiPort>,
    log_port: Arc<dyn LogPort>,
}

impl SyncInteractor {
    /// Create new sync interactor with injected ports
    pub fn new(api_port: Arc<dyn LabelApiPort>, log_port: Arc<dyn LogPort>) -> Self {
        Self { api_port, log_port }
    }

    /// Replace the remote labels of a video result with `labels`.
    ///
    /// Network and auth failures abort the whole call, as does a missing video result.
    /// Per-row API failures are collected in the returned report and the
    /// remaining rows are still sent.
    pub async fn sync(&self, key: VideoResultKey, labels: &LabelSet) -> Result<SyncReport, DomainError> {
        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "Starting label sync")
                    .with("user_id", key.user_id)
                    .with("video_result_id", key.video_result_id)
                    .with("labels", labels.len()),
            )
            .await;

        let token = self.api_port.authenticate().await?;
        self.api_port
            .get_video_result(&token, key.video_result_id)
            .await?;

        let mut report = SyncReport {
            deleted: self.delete_existing(&token, key).await?,
            ..SyncReport::default()
        };

        for record in labels {
            let outcome = self.send_record(&token, key, record).await?;
            if let RowOutcome::Failed(message) = &outcome {
                self.log_port.warn(message).await;
            }
            report.record(outcome);
        }

        self.log_port
            .log_event(
                &LogEvent::new(
                    if report.is_success() { LogLevel::Info } else { LogLevel::Warn },
                    "Label sync finished",
                )
                .with("video_result_id", key.video_result_id)
                .with("deleted", report.deleted)
                .with("created", report.created)
                .with("updated", report.updated)
                .with("failed", report.errors.len()),
            )
            .await;

        Ok(report)
    }

    /// Remove every remote label of the video result
    async fn delete_existing(&self, token: &AuthToken, key: VideoResultKey) -> Result<usize, DomainError> {
        let existing = self
            .api_port
            .list_labels(token, key.video_result_id, None)
            .await?;

        let mut deleted = 0;
        for label in existing {
            let Some(id) = label.id else {
                self.log_port
                    .warn(&format!("Remote label {} has no id, skipping delete", label.name))
                    .await;
                continue;
            };
            self.api_port.delete_label(token, id).await?;
            deleted += 1;
        }

        self.log_port
            .debug(&format!("Deleted {} remote labels", deleted))
            .await;
        Ok(deleted)
    }

    /// Create one record, falling back to an update of the label with the same name
    async fn send_record(
        &self,
        token: &AuthToken,
        key: VideoResultKey,
        record: &LabelRecord,
    ) -> Result<RowOutcome, DomainError> {
        let remote = remote_label_for(record, key);

        let create_error = match self.api_port.create_label(token, &remote).await {
            Ok(_) => return Ok(RowOutcome::Created),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };
        self.log_port
            .debug(&format!("Create of {} failed ({}), trying update", remote.name, create_error))
            .await;

        match self.update_by_name(token, key, &remote).await {
            Ok(()) => Ok(RowOutcome::Updated),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(RowOutcome::failure(&remote.name, &e)),
        }
    }

    async fn update_by_name(
        &self,
        token: &AuthToken,
        key: VideoResultKey,
        remote: &RemoteLabel,
    ) -> Result<(), DomainError> {
        let existing = self
            .api_port
            .list_labels(token, key.video_result_id, Some(&remote.name))
            .await?;
        let id = existing
            .iter()
            .find(|l| l.name == remote.name)
            .and_then(|l| l.id)
            .ok_or_else(|| DomainError::Api {
                status: None,
                message: format!("no existing label named {} to update", remote.name),
            })?;

        self.api_port.update_label(token, id, remote).await?;
        Ok(())
    }
}
