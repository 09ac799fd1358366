// Pull interactor - Brings a video result and its remote labels into a local table

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Object name of the recorded video inside a video result folder
pub const VIDEO_OBJECT: &str = "full_video.ts";

/// Local state after a pull
#[derive(Debug, Clone)]
pub struct PulledVideo {
    pub video_path: PathBuf,
    pub rate: FrameRate,
    pub table: LabelTable,
}

/// Interactor for opening a video result from remote storage
pub struct PullInteractor {
    api_port: Arc<dyn LabelApiPort>,
    store_port: Arc<dyn ObjectStorePort>,
    probe_port: Arc<dyn VideoProbePort>,
    log_port: Arc<dyn LogPort>,
}

impl PullInteractor {
    /// Create new pull interactor with injected ports
    pub fn new(
        api_port: Arc<dyn LabelApiPort>,
        store_port: Arc<dyn ObjectStorePort>,
        probe_port: Arc<dyn VideoProbePort>,
        log_port: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            api_port,
            store_port,
            probe_port,
            log_port,
        }
    }

    /// Download the recorded video into `{work_dir}/{video_result_id}/`
    pub async fn download_video(&self, key: VideoResultKey, work_dir: &Path) -> Result<PathBuf, DomainError> {
        let destination = work_dir
            .join(key.video_result_id.to_string())
            .join(VIDEO_OBJECT);
        let bytes = self
            .store_port
            .get_object(&key.object_key(VIDEO_OBJECT), &destination)
            .await?;

        self.log_port
            .info(&format!("Downloaded {} ({} bytes) for {}", VIDEO_OBJECT, bytes, key))
            .await;
        Ok(destination)
    }

    /// Fetch the remote labels as an editable table, positions in `rate`
    pub async fn fetch_table(&self, key: VideoResultKey, rate: FrameRate) -> Result<LabelTable, DomainError> {
        let token = self.api_port.authenticate().await?;
        self.api_port
            .get_video_result(&token, key.video_result_id)
            .await?;

        let remote = self
            .api_port
            .list_labels(&token, key.video_result_id, None)
            .await?;
        let labels = LabelSet::from_records(remote.iter().map(RemoteLabel::to_record).collect());

        self.log_port
            .info(&format!("Fetched {} labels for {}", labels.len(), key))
            .await;
        Ok(labels.to_table(rate))
    }

    /// Open a video result: use or download the video, read its frame rate, fetch labels
    pub async fn pull(
        &self,
        key: VideoResultKey,
        local_video: Option<&Path>,
        work_dir: &Path,
    ) -> Result<PulledVideo, DomainError> {
        let video_path = match local_video {
            Some(path) => path.to_path_buf(),
            None => self.download_video(key, work_dir).await?,
        };
        let rate = self.probe_port.probe_frame_rate(&video_path)?;
        let table = self.fetch_table(key, rate).await?;

        Ok(PulledVideo {
            video_path,
            rate,
            table,
        })
    }
}
