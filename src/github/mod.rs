use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::Client as HttpClient;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ActivityConfig;

pub mod types;

#[derive(Debug, Error)]
pub enum ActivityError {
    /// The events API answered with a non-2xx status.
    #[error("GitHub API responded with {status}")]
    RemoteService { status: u16 },
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API returned a body that is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of a user's public event feed, most recent first.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn public_events(&self, handle: &str) -> Result<Value, ActivityError>;
}

#[derive(Clone)]
pub struct GithubClient {
    http: HttpClient,
    api_base: Url,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(cfg: &ActivityConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // reqwest keeps no response cache; this covers proxies between us and the API
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut builder = HttpClient::builder()
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers);
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            api_base: cfg.api_base.clone(),
            token: cfg.token.clone(),
        })
    }

    /// `{base}/users/{handle}/events/public`, with the handle encoded as a single segment.
    pub fn events_url(&self, handle: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["users", handle, "events", "public"]);
        }
        url
    }
}

#[async_trait]
impl EventSource for GithubClient {
    async fn public_events(&self, handle: &str) -> Result<Value, ActivityError> {
        let mut request = self.http.get(self.events_url(handle));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActivityError::RemoteService { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued responses and records which handles were asked for.
    #[derive(Debug, Default)]
    pub struct MockSource {
        responses: Mutex<VecDeque<Result<Value, ActivityError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, resp: Result<Value, ActivityError>) {
            self.responses.lock().unwrap().push_back(resp);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventSource for MockSource {
        async fn public_events(&self, handle: &str) -> Result<Value, ActivityError> {
            self.calls.lock().unwrap().push(handle.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Value::Array(Vec::new())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Upstream {
        seen: Arc<Mutex<Vec<(String, AxumHeaders)>>>,
    }

    async fn events(
        State(up): State<Upstream>,
        Path(handle): Path<String>,
        headers: AxumHeaders,
    ) -> Result<Json<Value>, StatusCode> {
        up.seen.lock().unwrap().push((handle.clone(), headers));
        match handle.as_str() {
            "limited" => Err(StatusCode::FORBIDDEN),
            "garbled" => Ok(Json(json!("still json, just not a list"))),
            _ => Ok(Json(json!([{ "type": "PushEvent", "repo": { "name": "bry-ly/demo" } }]))),
        }
    }

    async fn spawn_upstream() -> (SocketAddr, Upstream) {
        let up = Upstream::default();
        let app = Router::new()
            .route("/users/{handle}/events/public", get(events))
            .route("/broken/users/{handle}/events/public", get(|| async { "<html>" }))
            .with_state(up.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (addr, up)
    }

    fn config(base: String, token: Option<&str>) -> ActivityConfig {
        let mut cfg = ActivityConfig::from_lookup(|_| None).unwrap();
        cfg.api_base = Url::parse(&base).unwrap();
        cfg.token = token.map(str::to_string);
        cfg
    }

    #[test]
    fn events_url_encodes_handle() {
        let client = GithubClient::new(&config("https://api.github.com".into(), None)).unwrap();
        assert_eq!(
            client.events_url("bry-ly").as_str(),
            "https://api.github.com/users/bry-ly/events/public"
        );
        assert_eq!(
            client.events_url("a/b c").as_str(),
            "https://api.github.com/users/a%2Fb%20c/events/public"
        );

        let nested = GithubClient::new(&config("https://ghe.example.com/api/v3/".into(), None)).unwrap();
        assert_eq!(
            nested.events_url("me").as_str(),
            "https://ghe.example.com/api/v3/users/me/events/public"
        );
    }

    #[tokio::test]
    async fn sends_expected_headers_without_token() {
        let (addr, up) = spawn_upstream().await;
        let client = GithubClient::new(&config(format!("http://{addr}"), None)).unwrap();

        let body = client.public_events("bry-ly").await.unwrap();
        assert!(body.is_array());

        let seen = up.seen.lock().unwrap();
        let (handle, headers) = &seen[0];
        assert_eq!(handle, "bry-ly");
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["user-agent"], "minimalist-portfolio");
        assert_eq!(headers["cache-control"], "no-cache");
        assert!(headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_configured() {
        let (addr, up) = spawn_upstream().await;
        let client = GithubClient::new(&config(format!("http://{addr}"), Some("s3cret"))).unwrap();

        client.public_events("bry-ly").await.unwrap();

        let seen = up.seen.lock().unwrap();
        assert_eq!(seen[0].1["authorization"], "Bearer s3cret");
        assert_eq!(seen[0].1["user-agent"], "minimalist-portfolio");
    }

    #[tokio::test]
    async fn non_success_status_is_remote_service_error() {
        let (addr, _up) = spawn_upstream().await;
        let client = GithubClient::new(&config(format!("http://{addr}"), None)).unwrap();

        let err = client.public_events("limited").await.unwrap_err();
        assert!(matches!(err, ActivityError::RemoteService { status: 403 }));
        assert_eq!(err.to_string(), "GitHub API responded with 403");
    }

    #[tokio::test]
    async fn wrong_shape_is_passed_through_but_non_json_is_an_error() {
        let (addr, _up) = spawn_upstream().await;
        let client = GithubClient::new(&config(format!("http://{addr}"), None)).unwrap();
        let body = client.public_events("garbled").await.unwrap();
        assert!(body.is_string());

        let broken = GithubClient::new(&config(format!("http://{addr}/broken"), None)).unwrap();
        let err = broken.public_events("bry-ly").await.unwrap_err();
        assert!(matches!(err, ActivityError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_api_is_an_http_error_and_lands_in_errors() {
        // bind then drop, so nothing is listening on the port
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = GithubClient::new(&config(format!("http://{addr}"), None)).unwrap();

        let err = client.public_events("bry-ly").await.unwrap_err();
        assert!(matches!(err, ActivityError::Http(_)));

        let fetcher = crate::activity::ActivityFetcher::new(Some("bry-ly".into()), Arc::new(client));
        let env = fetcher.envelope().await;
        assert_eq!(env.data.github, None);
        let errors = env.errors.unwrap();
        assert!(!errors["github"].trim().is_empty());
    }
}
