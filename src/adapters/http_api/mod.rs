// HTTP label API adapter - Label CRUD over the remote REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Connection settings for the label API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// reqwest-based label API adapter
pub struct HttpLabelApiAdapter {
    client: Client,
    settings: ApiSettings,
}

impl HttpLabelApiAdapter {
    /// Create new HTTP adapter
    pub fn new(settings: ApiSettings) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| DomainError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        request.bearer_auth(token.as_str())
    }

    async fn send(request: RequestBuilder) -> Result<Response, DomainError> {
        request
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))
    }

    /// Map a non-success response to the error taxonomy
    async fn check(response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = error_detail(&response.text().await.unwrap_or_default());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DomainError::Transport(
                format!("Not authorized ({}): {}", status.as_u16(), body),
            )),
            StatusCode::NOT_FOUND => Err(DomainError::NotFound(body)),
            _ => Err(DomainError::Api {
                status: Some(status.as_u16()),
                message: body,
            }),
        }
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, DomainError> {
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Transport(format!("Malformed API response: {}", e)))
    }
}

/// The `detail` field of a JSON error body, or the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned())
        .map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Id of a created label, read leniently from the response body
fn created_id(body: &[u8]) -> Option<i64> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("id")?
        .as_i64()
}

#[async_trait]
impl LabelApiPort for HttpLabelApiAdapter {
    async fn authenticate(&self) -> Result<AuthToken, DomainError> {
        debug!(url = %self.settings.base_url, user = %self.settings.username, "Logging in");

        let request = self.client.post(self.url("auth/login")).json(&LoginRequest {
            username: &self.settings.username,
            password: &self.settings.password,
        });
        let response = Self::check(Self::send(request).await?)
            .await
            .map_err(|e| DomainError::Transport(format!("Login failed: {}", e)))?;
        let login: LoginResponse = Self::json(response).await?;

        Ok(AuthToken::new(login.access_token))
    }

    async fn get_video_result(
        &self,
        token: &AuthToken,
        video_result_id: i64,
    ) -> Result<VideoResult, DomainError> {
        let request = self.authorized(
            self.client
                .get(self.url(&format!("video_result/{}", video_result_id))),
            token,
        );
        let response = Self::check(Self::send(request).await?)
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => {
                    DomainError::NotFound(format!("Video result {} does not exist", video_result_id))
                }
                other => other,
            })?;

        Self::json(response).await
    }

    async fn list_labels(
        &self,
        token: &AuthToken,
        video_result_id: i64,
        name: Option<&str>,
    ) -> Result<Vec<RemoteLabel>, DomainError> {
        let mut query = vec![("video_result_id", video_result_id.to_string())];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }

        let request = self.authorized(self.client.get(self.url("video_label/")).query(&query), token);
        let response = Self::check(Self::send(request).await?).await?;
        Self::json(response).await
    }

    async fn create_label(
        &self,
        token: &AuthToken,
        label: &RemoteLabel,
    ) -> Result<Option<i64>, DomainError> {
        let request = self.authorized(self.client.post(self.url("video_label/")).json(label), token);
        let response = Self::check(Self::send(request).await?).await?;

        // A 2xx means the label exists; the body only tells us its id, if anything
        let body = response.bytes().await.unwrap_or_default();
        let id = created_id(&body);
        if id.is_none() {
            debug!(label = %label.name, "Create response carried no label id");
        }
        Ok(id)
    }

    async fn update_label(
        &self,
        token: &AuthToken,
        label_id: i64,
        label: &RemoteLabel,
    ) -> Result<(), DomainError> {
        let request = self.authorized(
            self.client
                .put(self.url(&format!("video_label/{}", label_id)))
                .json(label),
            token,
        );
        Self::check(Self::send(request).await?).await?;
        Ok(())
    }

    async fn delete_label(&self, token: &AuthToken, label_id: i64) -> Result<(), DomainError> {
        let request = self.authorized(
            self.client
                .delete(self.url(&format!("video_label/{}", label_id))),
            token,
        );
        Self::check(Self::send(request).await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TracingLogAdapter;
    use crate::app::SyncInteractor;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail": "Label exists"}"#), "Label exists");
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["body"]}]}"#),
            r#"[{"loc":["body"]}]"#
        );
        assert_eq!(error_detail(" bad gateway \n"), "bad gateway");
    }

    fn adapter(base_url: &str) -> HttpLabelApiAdapter {
        HttpLabelApiAdapter::new(ApiSettings {
            base_url: base_url.to_string(),
            username: "annotator".to_string(),
            password: "secret".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(
            adapter("http://api.local/").url("video_label/"),
            "http://api.local/video_label/"
        );
        assert_eq!(
            adapter("http://api.local").url("auth/login"),
            "http://api.local/auth/login"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_transport_error() {
        // Port 9 (discard) is closed on test machines
        let err = adapter("http://127.0.0.1:9").authenticate().await.unwrap_err();
        assert!(matches!(err, DomainError::Transport(_)));
        assert!(err.is_fatal());
    }

    /// Canned reply for requests whose line starts with `prefix`
    struct Route {
        prefix: &'static str,
        status: u16,
        body: &'static str,
    }

    const fn route(prefix: &'static str, status: u16, body: &'static str) -> Route {
        Route { prefix, status, body }
    }

    /// Read one HTTP/1.1 request, returning its request line
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        head.lines().next().unwrap_or_default().to_string()
    }

    /// Serve `routes` on a local port; returns the base URL and the request lines seen
    async fn serve(routes: Vec<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let line = read_request(&mut socket).await;
                log.lock().unwrap().push(line.clone());
                let (status, body) = routes
                    .iter()
                    .find(|r| line.starts_with(r.prefix))
                    .map(|r| (r.status, r.body))
                    .unwrap_or((404, r#"{"detail": "Not Found"}"#));
                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base_url, seen)
    }

    const LOGIN: Route = route("POST /auth/login", 200, r#"{"access_token": "abc"}"#);
    const VIDEO: Route = route("GET /video_result/42", 200, r#"{"id": 42}"#);

    fn label(name: &str) -> RemoteLabel {
        RemoteLabel {
            id: None,
            video_result_id: 42,
            user_id: 7,
            name: name.to_string(),
            start_frame: 0,
            end_frame: 30,
            exercise: "squat".to_string(),
            view: Orientation::Front,
            min_reps: 0,
            reps: 0,
            rules: String::new(),
            reps_to_judge: String::new(),
            notes: String::new(),
            is_valid: Validity::Valid,
        }
    }

    #[tokio::test]
    async fn test_create_accepts_partial_response_body() {
        let (base_url, _) = serve(vec![
            LOGIN,
            route("POST /video_label/", 201, r#"{"id": 5}"#),
            route("PUT /video_label/5", 200, "null"),
        ])
        .await;
        let api = adapter(&base_url);
        let token = api.authenticate().await.unwrap();

        assert_eq!(api.create_label(&token, &label("squat_1")).await.unwrap(), Some(5));
        api.update_label(&token, 5, &label("squat_1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_with_empty_body_still_succeeds() {
        let (base_url, _) = serve(vec![LOGIN, route("POST /video_label/", 201, "")]).await;
        let api = adapter(&base_url);
        let token = api.authenticate().await.unwrap();

        assert_eq!(api.create_label(&token, &label("squat_1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (base_url, _) = serve(vec![
            LOGIN,
            route("POST /video_label/", 409, r#"{"detail": "Label exists"}"#),
            route("PUT /video_label/8", 404, r#"{"detail": "gone"}"#),
        ])
        .await;
        let api = adapter(&base_url);
        let token = api.authenticate().await.unwrap();

        let err = api.create_label(&token, &label("squat_1")).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::Api {
                status: Some(409),
                message: "Label exists".to_string()
            }
        );
        assert!(!err.is_fatal());
        let err = api.update_label(&token, 8, &label("squat_1")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        let err = api.get_video_result(&token, 42).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(ref m) if m.contains("42")));
    }

    #[tokio::test]
    async fn test_rejected_login_is_fatal() {
        let (base_url, _) = serve(vec![route("POST /auth/login", 401, r#"{"detail": "bad"}"#)]).await;
        let err = adapter(&base_url).authenticate().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_sync_over_http_sends_every_row() {
        let (base_url, seen) = serve(vec![
            LOGIN,
            VIDEO,
            route(
                "GET /video_label/",
                200,
                r#"[{"id": 1, "video_result_id": 42, "name": "old_1", "start_frame": 0, "end_frame": 9, "is_valid": true}]"#,
            ),
            route("DELETE /video_label/1", 200, "{}"),
            route("POST /video_label/", 201, r#"{"id": 5}"#),
        ])
        .await;

        let api: Arc<dyn LabelApiPort> = Arc::new(adapter(&base_url));
        let sync = SyncInteractor::new(api, Arc::new(TracingLogAdapter::default()));
        let labels = LabelSet::from_records(vec![
            label("squat_1").to_record(),
            label("squat_2").to_record(),
        ]);

        let report = sync
            .sync(VideoResultKey::new(7, 42).unwrap(), &labels)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.deleted, 1);
        assert_eq!(report.created, 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().filter(|l| l.starts_with("POST /video_label/")).count(), 2);
    }
}
