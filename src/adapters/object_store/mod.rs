// Object store adapter - Bucket objects over plain HTTP GET/PUT

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

/// Connection settings for the bucket endpoint
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub base_url: String,
    pub bucket: String,
    pub token: Option<String>,
    /// Connect timeout, and the longest wait for any single download chunk
    pub timeout: Duration,
}

/// reqwest-based object storage adapter
pub struct HttpObjectStoreAdapter {
    client: Client,
    settings: StorageSettings,
}

impl HttpObjectStoreAdapter {
    /// Create new object store adapter
    pub fn new(settings: StorageSettings) -> Result<Self, DomainError> {
        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .build()
            .map_err(|e| DomainError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.bucket.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }

    fn with_token(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStorePort for HttpObjectStoreAdapter {
    async fn get_object(&self, key: &str, destination: &Path) -> Result<u64, DomainError> {
        let url = self.object_url(key);
        debug!(%url, "Downloading object");

        let mut response = self
            .with_token(self.client.get(&url))
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("Download of {} failed: {}", key, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(DomainError::NotFound(format!("Object {} does not exist", key)))
            }
            status => {
                return Err(DomainError::Storage(format!(
                    "Download of {} failed with status: {}",
                    key, status
                )))
            }
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::FsFail(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let write_err =
            |e: std::io::Error| DomainError::FsFail(format!("Failed to write {}: {}", destination.display(), e));
        let mut file = tokio::fs::File::create(destination).await.map_err(write_err)?;

        let mut written = 0u64;
        loop {
            let chunk = tokio::time::timeout(self.settings.timeout, response.chunk())
                .await
                .map_err(|_| {
                    DomainError::Transport(format!(
                        "Download of {} stalled for {:?}",
                        key, self.settings.timeout
                    ))
                })?
                .map_err(|e| DomainError::Transport(format!("Failed to read download: {}", e)))?;
            let Some(chunk) = chunk else { break };
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        info!(key, path = %destination.display(), bytes = written, "Object downloaded");
        Ok(written)
    }

    async fn put_object(&self, key: &str, source: &Path) -> Result<(), DomainError> {
        let body = tokio::fs::read(source)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to read {}: {}", source.display(), e)))?;
        let url = self.object_url(key);
        debug!(%url, bytes = body.len(), "Uploading object");

        let response = self
            .with_token(self.client.put(&url))
            .timeout(self.settings.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("Upload of {} failed: {}", key, e)))?;

        if !response.status().is_success() {
            return Err(DomainError::Storage(format!(
                "Upload of {} failed with status: {}",
                key,
                response.status()
            )));
        }

        info!(key, "Object uploaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn settings(base_url: String) -> StorageSettings {
        StorageSettings {
            base_url,
            bucket: "labels".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Serve one chunked response per connection: the body in `chunks` pieces, or a 404
    /// when the path does not end with `found`.
    async fn serve(found: &'static str, chunk: Vec<u8>, chunks: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else { return };
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or_default().to_string();

                if !path.ends_with(found) {
                    let _ = stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                    continue;
                }
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n",
                    )
                    .await;
                for _ in 0..chunks {
                    let _ = stream.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await;
                    let _ = stream.write_all(&chunk).await;
                    let _ = stream.write_all(b"\r\n").await;
                    let _ = stream.flush().await;
                }
                let _ = stream.write_all(b"0\r\n\r\n").await;
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_object_url() {
        let store = HttpObjectStoreAdapter::new(StorageSettings {
            base_url: "https://storage.local/".to_string(),
            bucket: "/labels/".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        assert_eq!(
            store.object_url("7/42/full_video.ts"),
            "https://storage.local/labels/7/42/full_video.ts"
        );
    }

    #[tokio::test]
    async fn test_download_streams_every_chunk_to_disk() {
        let chunk: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
        let base_url = serve("full_video.ts", chunk.clone(), 8).await;
        let store = HttpObjectStoreAdapter::new(settings(base_url)).unwrap();
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("42").join("full_video.ts");

        let written = store
            .get_object("7/42/full_video.ts", &destination)
            .await
            .unwrap();

        assert_eq!(written, 8 * 64 * 1024);
        let on_disk = std::fs::read(&destination).unwrap();
        assert_eq!(on_disk.len() as u64, written);
        assert_eq!(&on_disk[..chunk.len()], &chunk[..]);
        assert_eq!(&on_disk[on_disk.len() - chunk.len()..], &chunk[..]);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let base_url = serve("full_video.ts", b"ts".to_vec(), 1).await;
        let store = HttpObjectStoreAdapter::new(settings(base_url)).unwrap();
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("pose_results.json");

        let err = store
            .get_object("7/42/pose_results.json", &destination)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound(ref m) if m.contains("7/42/pose_results.json")));
        assert!(!destination.exists());
    }
}
