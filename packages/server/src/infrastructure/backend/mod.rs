//! Playback backend implementations
//!
//! - `relay`: browser bridges behind the local WebSocket relay
//! - `ytmdesktop`: the video platform desktop player's companion HTTP API
//! - `cider`: the desktop music app's RPC HTTP API

pub mod cider;
pub mod relay;
pub mod ytmdesktop;

use std::{sync::Arc, time::Duration};

use crate::domain::{BackendProvider, PlaybackBackend, PlaybackError, Platform, RelayHub};

pub use cider::CiderBackend;
pub use relay::RelayBackend;
pub use ytmdesktop::YtmDesktopBackend;

/// Fixed timeout for every backend HTTP call
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn http_client() -> Result<reqwest::Client, PlaybackError> {
    reqwest::Client::builder()
        .user_agent(concat!("encore/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| PlaybackError::Http(e.to_string()))
}

/// Connection details for an HTTP backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoint {
    pub base_url: String,
    pub token: Option<String>,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builds the backend for each platform.
///
/// HTTP backends are created once so their cached snapshot survives a
/// switch away and back. Relay backends are cheap views over the hub.
pub struct DefaultBackendProvider {
    hub: Arc<RelayHub>,
    request_timeout: Duration,
    youtube: Arc<YtmDesktopBackend>,
    cider: Arc<CiderBackend>,
}

impl DefaultBackendProvider {
    pub fn new(
        hub: Arc<RelayHub>,
        request_timeout: Duration,
        youtube: HttpEndpoint,
        cider: HttpEndpoint,
    ) -> Result<Self, PlaybackError> {
        let client = http_client()?;
        Ok(Self {
            hub,
            request_timeout,
            youtube: Arc::new(YtmDesktopBackend::new(client.clone(), youtube)),
            cider: Arc::new(CiderBackend::new(client, cider)),
        })
    }
}

impl BackendProvider for DefaultBackendProvider {
    fn backend_for(&self, platform: &Platform) -> Arc<dyn PlaybackBackend> {
        match platform {
            Platform::Relay(client_type) => Arc::new(RelayBackend::new(
                self.hub.clone(),
                client_type.clone(),
                self.request_timeout,
            )),
            Platform::YtmDesktop => self.youtube.clone(),
            Platform::Cider => self.cider.clone(),
        }
    }
}

/// Map a non-success response to `PlaybackError::Http`.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, PlaybackError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlaybackError::Http(format!("{}: {}", status.as_u16(), body)))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Answers each request with the next body in `bodies`, repeating the last one.
#[cfg(test)]
pub(crate) fn sequenced(bodies: Vec<serde_json::Value>) -> axum::routing::MethodRouter {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let served = Arc::new(AtomicUsize::new(0));
    axum::routing::get(move || {
        let served = served.clone();
        let bodies = bodies.clone();
        async move {
            let n = served.fetch_add(1, Ordering::SeqCst).min(bodies.len() - 1);
            axum::Json(bodies[n].clone())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalizes_base_url_and_blank_token() {
        // テスト項目: 末尾のスラッシュと空のトークンが取り除かれる
        // given (前提条件):
        let endpoint = HttpEndpoint::new("http://127.0.0.1:9863/", Some("  ".to_string()));

        // when (操作):
        let url = endpoint.url("/api/v1/state");

        // then (期待する結果):
        assert_eq!(url, "http://127.0.0.1:9863/api/v1/state");
        assert_eq!(endpoint.token, None);
    }
}
