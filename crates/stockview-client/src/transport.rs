//! HTTP transport to the analysis service
//!
//! The controller only depends on [`AnalysisTransport`], so tests can swap the
//! network for a mock. [`HttpTransport`] is the reqwest-backed implementation.

use crate::api::HttpReply;
use crate::config::ClientConfig;
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Service routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `POST /analyze`
    Analyze,
    /// `POST /chat`
    Chat,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Analyze => "analyze",
            Route::Chat => "chat",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Sends one JSON POST and returns the reply, whatever its status
///
/// Only network-level failures are errors here; status and body validation
/// belong to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn post_json(&self, route: Route, body: Value) -> Result<HttpReply>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport; fails if the configuration is invalid
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn post_json(&self, route: Route, body: Value) -> Result<HttpReply> {
        let url = self.config.endpoint(route)?;
        debug!("Sending POST {}", url);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Received HTTP {} for {}", status.as_u16(), route);

        Ok(HttpReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request text
    async fn serve_once(status_line: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0_u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn transport_for(base: &str) -> HttpTransport {
        let config = ClientConfig::builder().api_base(base).build().unwrap();
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Analyze.path(), "analyze");
        assert_eq!(Route::Chat.to_string(), "/chat");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig {
            api_base: "nope".to_string(),
            ..ClientConfig::default()
        };
        assert!(HttpTransport::new(config).is_err());
    }

    #[tokio::test]
    async fn test_posts_json_and_returns_reply() {
        let (base, server) = serve_once("200 OK", r##"{"status":"success","data":"# AAPL"}"##).await;

        let transport = transport_for(&base);
        let body = serde_json::json!({"stock_symbol": "AAPL", "analysis_type": "Complete Analysis"});
        let reply = transport.post_json(Route::Analyze, body).await.unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.status_text, "OK");
        assert!(reply.body.contains("# AAPL"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /analyze HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.contains("\"stock_symbol\":\"AAPL\""));
    }

    #[tokio::test]
    async fn test_non_2xx_is_not_a_transport_error() {
        let (base, server) = serve_once("503 Service Unavailable", "not json").await;

        let transport = transport_for(&base);
        let reply = transport
            .post_json(Route::Analyze, serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(reply.status, 503);
        assert_eq!(reply.status_line(), "503 Service Unavailable");
        assert_eq!(reply.body, "not json");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = transport_for(&base);
        let err = transport
            .post_json(Route::Chat, serde_json::json!({"user_question": "hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)));
    }
}
