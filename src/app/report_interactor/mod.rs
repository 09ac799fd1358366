// Report interactor - Stages labels and recordings, runs the report generator, uploads the PDF

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::export_interactor::ExportInteractor;
use crate::app::pull_interactor::VIDEO_OBJECT;
use crate::app::sync_interactor::SyncInteractor;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::SyncReport;
use crate::ports::*;

/// Labeled export staged next to the recordings
pub const LABELS_FILE: &str = "full_video_labels.csv";
/// Pose estimation output stored with each video result
pub const POSE_OBJECT: &str = "pose_results.json";

/// What a finished report run produced
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub sync: SyncReport,
    pub pdf_path: PathBuf,
    pub object_key: String,
}

/// Interactor for the end-to-end report pipeline
pub struct ReportInteractor {
    sync_interactor: Arc<SyncInteractor>,
    export_interactor: Arc<ExportInteractor>,
    store_port: Arc<dyn ObjectStorePort>,
    report_port: Arc<dyn ReportGeneratorPort>,
    log_port: Arc<dyn LogPort>,
    work_dir: PathBuf,
}

impl ReportInteractor {
    /// Create new report interactor with injected ports
    pub fn new(
        sync_interactor: Arc<SyncInteractor>,
        export_interactor: Arc<ExportInteractor>,
        store_port: Arc<dyn ObjectStorePort>,
        report_port: Arc<dyn ReportGeneratorPort>,
        log_port: Arc<dyn LogPort>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            sync_interactor,
            export_interactor,
            store_port,
            report_port,
            log_port,
            work_dir,
        }
    }

    /// Run the pipeline for one video result
    pub async fn generate(
        &self,
        key: VideoResultKey,
        table: &LabelTable,
        rate: FrameRate,
    ) -> Result<ReportOutcome, DomainError> {
        let stage_dir = self.reset_stage(key)?;

        let labels = self
            .export_interactor
            .export_labels(table, rate, &stage_dir.join(LABELS_FILE))
            .await?;
        let sync = self.sync_interactor.sync(key, &labels).await?;
        if !sync.is_success() {
            return Err(DomainError::Report(format!(
                "label export failed:\n{}",
                sync.error_message()
            )));
        }

        for object in [VIDEO_OBJECT, POSE_OBJECT] {
            self.store_port
                .get_object(&key.object_key(object), &stage_dir.join(object))
                .await?;
        }

        self.log_port
            .info(&format!("Generating report for {}", key))
            .await;
        let pdf_path = self
            .report_port
            .generate(&self.work_dir, key.video_result_id, &self.work_dir)
            .await?;

        let object_key = key.object_key(&pdf_file_name(&pdf_path, key));
        self.store_port.put_object(&object_key, &pdf_path).await?;

        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "Report uploaded")
                    .with("pdf", pdf_path.display())
                    .with("object_key", &object_key),
            )
            .await;

        Ok(ReportOutcome {
            sync,
            pdf_path,
            object_key,
        })
    }

    /// Clear what a previous run left for this video result: its stage folder and its PDF.
    /// Nothing else under `work_dir` is touched.
    fn reset_stage(&self, key: VideoResultKey) -> Result<PathBuf, DomainError> {
        let stage_dir = self.work_dir.join(key.video_result_id.to_string());
        match std::fs::remove_dir_all(&stage_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DomainError::FsFail(format!(
                    "Failed to clear {}: {}",
                    stage_dir.display(),
                    e
                )))
            }
        }

        let stale_pdf = self.work_dir.join(format!("{}.pdf", key.video_result_id));
        match std::fs::remove_file(&stale_pdf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DomainError::FsFail(format!(
                    "Failed to remove {}: {}",
                    stale_pdf.display(),
                    e
                )))
            }
        }

        std::fs::create_dir_all(&stage_dir).map_err(|e| {
            DomainError::FsFail(format!("Failed to create {}: {}", stage_dir.display(), e))
        })?;
        Ok(stage_dir)
    }
}

fn pdf_file_name(pdf_path: &Path, key: VideoResultKey) -> String {
    pdf_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{}.pdf", key.video_result_id))
}
