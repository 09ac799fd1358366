// Export interactor - Label table files in and labeled records out

use std::path::Path;
use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Interactor for table import and CSV export
pub struct ExportInteractor {
    table_port: Arc<dyn TableFilePort>,
    log_port: Arc<dyn LogPort>,
}

impl ExportInteractor {
    /// Create new export interactor with injected ports
    pub fn new(table_port: Arc<dyn TableFilePort>, log_port: Arc<dyn LogPort>) -> Self {
        Self {
            table_port,
            log_port,
        }
    }

    /// Load an editable table, replacing nothing but what the file holds
    pub async fn import_table(&self, path: &Path) -> Result<LabelTable, DomainError> {
        let table = self.table_port.read_table(path)?;
        self.log_port
            .info(&format!("Imported {} rows from {}", table.len(), path.display()))
            .await;
        Ok(table)
    }

    /// Save an editable table
    pub async fn save_table(&self, path: &Path, table: &LabelTable) -> Result<(), DomainError> {
        self.table_port.write_table(path, table)?;
        self.log_port
            .info(&format!("Saved {} rows to {}", table.len(), path.display()))
            .await;
        Ok(())
    }

    /// Convert the table to frames, derive labels and write the labeled file
    pub async fn export_labels(
        &self,
        table: &LabelTable,
        rate: FrameRate,
        path: &Path,
    ) -> Result<LabelSet, DomainError> {
        let labels = table.to_label_set(rate)?;
        self.table_port.write_labels(path, &labels)?;

        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "Labels exported")
                    .with("path", path.display())
                    .with("labels", labels.len())
                    .with("fps", rate.fps()),
            )
            .await;
        Ok(labels)
    }
}

/// Default export file name: the video stem with a `.csv` extension
pub fn default_export_name(video: &Path) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "labels".to_string());
    format!("{}.csv", stem)
}
