// In-memory adapters - Label API and object store kept in process memory

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const TOKEN: &str = "in-memory-token";

#[derive(Default)]
struct ApiState {
    video_results: HashSet<i64>,
    labels: BTreeMap<i64, RemoteLabel>,
    next_id: i64,
    rejected_creates: HashSet<String>,
    rejected_updates: HashSet<String>,
    offline: bool,
    calls: Vec<String>,
}

/// Label API backed by a map; label names are unique per video result
#[derive(Default)]
pub struct InMemoryLabelApi {
    state: Mutex<ApiState>,
}

impl InMemoryLabelApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, ApiState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Transport("in-memory API lock poisoned".to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a video result so labels can be attached to it
    pub fn add_video_result(&self, video_result_id: i64) {
        self.lock().video_results.insert(video_result_id);
    }

    /// Store a label as if it had been created earlier
    pub fn seed_label(&self, label: RemoteLabel) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.labels.insert(id, RemoteLabel { id: Some(id), ..label });
        id
    }

    /// Make creates of this label name fail
    pub fn reject_create(&self, name: &str) {
        self.lock().rejected_creates.insert(name.to_string());
    }

    /// Make updates of this label name fail
    pub fn reject_update(&self, name: &str) {
        self.lock().rejected_updates.insert(name.to_string());
    }

    /// Simulate a network outage
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Labels of a video result in id order
    pub fn labels(&self, video_result_id: i64) -> Vec<RemoteLabel> {
        self.lock()
            .labels
            .values()
            .filter(|l| l.video_result_id == video_result_id)
            .cloned()
            .collect()
    }

    /// Names of the operations performed, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn enter(&self, token: Option<&AuthToken>, call: String) -> Result<MutexGuard<'_, ApiState>, DomainError> {
        let mut state = self.state()?;
        if state.offline {
            return Err(DomainError::Transport("connection refused".to_string()));
        }
        if let Some(token) = token {
            if token.as_str() != TOKEN {
                return Err(DomainError::Transport("Not authorized (401)".to_string()));
            }
        }
        state.calls.push(call);
        Ok(state)
    }
}

#[async_trait]
impl LabelApiPort for InMemoryLabelApi {
    async fn authenticate(&self) -> Result<AuthToken, DomainError> {
        self.enter(None, "login".to_string())?;
        Ok(AuthToken::new(TOKEN))
    }

    async fn get_video_result(
        &self,
        token: &AuthToken,
        video_result_id: i64,
    ) -> Result<VideoResult, DomainError> {
        let state = self.enter(Some(token), format!("get_video_result {}", video_result_id))?;
        if !state.video_results.contains(&video_result_id) {
            return Err(DomainError::NotFound(format!(
                "Video result {} does not exist",
                video_result_id
            )));
        }
        Ok(VideoResult {
            id: video_result_id,
            user_id: None,
        })
    }

    async fn list_labels(
        &self,
        token: &AuthToken,
        video_result_id: i64,
        name: Option<&str>,
    ) -> Result<Vec<RemoteLabel>, DomainError> {
        let state = self.enter(Some(token), format!("list {}", video_result_id))?;
        Ok(state
            .labels
            .values()
            .filter(|l| l.video_result_id == video_result_id)
            .filter(|l| name.map_or(true, |n| l.name == n))
            .cloned()
            .collect())
    }

    async fn create_label(
        &self,
        token: &AuthToken,
        label: &RemoteLabel,
    ) -> Result<Option<i64>, DomainError> {
        let mut state = self.enter(Some(token), format!("create {}", label.name))?;
        if state.rejected_creates.contains(&label.name) {
            return Err(DomainError::Api {
                status: Some(422),
                message: format!("create of {} rejected", label.name),
            });
        }
        let duplicate = state
            .labels
            .values()
            .any(|l| l.video_result_id == label.video_result_id && l.name == label.name);
        if duplicate {
            return Err(DomainError::Api {
                status: Some(409),
                message: format!("label {} already exists", label.name),
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        let stored = RemoteLabel {
            id: Some(id),
            ..label.clone()
        };
        state.labels.insert(id, stored);
        Ok(Some(id))
    }

    async fn update_label(
        &self,
        token: &AuthToken,
        label_id: i64,
        label: &RemoteLabel,
    ) -> Result<(), DomainError> {
        let mut state = self.enter(Some(token), format!("update {}", label.name))?;
        if state.rejected_updates.contains(&label.name) {
            return Err(DomainError::Api {
                status: Some(422),
                message: format!("update of {} rejected", label.name),
            });
        }
        if !state.labels.contains_key(&label_id) {
            return Err(DomainError::NotFound(format!("Label {} does not exist", label_id)));
        }

        let stored = RemoteLabel {
            id: Some(label_id),
            ..label.clone()
        };
        state.labels.insert(label_id, stored);
        Ok(())
    }

    async fn delete_label(&self, token: &AuthToken, label_id: i64) -> Result<(), DomainError> {
        let mut state = self.enter(Some(token), format!("delete {}", label_id))?;
        state
            .labels
            .remove(&label_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Label {} does not exist", label_id)))
    }
}

/// Object store backed by a map of keys to bytes
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects().insert(key.to_string(), bytes.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStorePort for InMemoryObjectStore {
    async fn get_object(&self, key: &str, destination: &Path) -> Result<u64, DomainError> {
        let bytes = self
            .get(key)
            .ok_or_else(|| DomainError::NotFound(format!("Object {} does not exist", key)))?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::FsFail(e.to_string()))?;
        }
        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|e| DomainError::FsFail(e.to_string()))?;
        Ok(bytes.len() as u64)
    }

    async fn put_object(&self, key: &str, source: &Path) -> Result<(), DomainError> {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| DomainError::FsFail(e.to_string()))?;
        self.insert(key, &bytes);
        Ok(())
    }
}
