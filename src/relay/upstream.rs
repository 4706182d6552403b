//! Outbound fetch capability.
//!
//! # Responsibilities
//! - Issue a single GET to a validated target
//! - Never follow redirects; a 3xx comes back to the gate as-is
//! - Hand the body back as a stream, not a buffer
//!
//! # Design Decisions
//! - The gate owns the deadline and wraps `fetch` in `tokio::time::timeout`;
//!   dropping the future on expiry aborts the request and frees the connection
//! - No transparent decompression, so the declared content-length describes
//!   the bytes actually relayed

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while reaching the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response headers within the deadline.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(#[source] BoxError),

    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl UpstreamError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        UpstreamError::Transport(err.into())
    }
}

/// Status, headers and a streaming body from the upstream.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Something that can GET a URL without following redirects.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError>;
}

/// `reqwest`-backed upstream used in production.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Build a client with redirects disabled and the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn fetch(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = Body::from_stream(response.bytes_stream());

        Ok(UpstreamResponse { status, headers, body })
    }
}
