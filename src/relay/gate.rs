//! The validating relay.

use std::sync::Arc;
use std::time::Instant;

use axum::response::Response;
use tokio::time::timeout;

use crate::observability::metrics;
use crate::relay::envelope;
use crate::relay::error::RelayError;
use crate::relay::policy::RelayPolicy;
use crate::relay::target::{resolve_target, TargetDescriptor};
use crate::relay::upstream::{Upstream, UpstreamError, UpstreamResponse};

/// Validates a target, fetches it and streams it back.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct RelayGate {
    policy: Arc<RelayPolicy>,
    upstream: Arc<dyn Upstream>,
}

impl RelayGate {
    pub fn new(policy: RelayPolicy, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            policy: Arc::new(policy),
            upstream,
        }
    }

    pub fn policy(&self) -> &RelayPolicy {
        &self.policy
    }

    /// Run the full gate for a raw request query string.
    pub async fn relay(&self, query: Option<&str>) -> Result<Response, RelayError> {
        let target = resolve_target(query, &self.policy)?;
        self.forward(&target).await
    }

    /// Fetch an already validated target and check what comes back.
    pub async fn forward(&self, target: &TargetDescriptor) -> Result<Response, RelayError> {
        let policy = &*self.policy;

        tracing::debug!(
            host = %target.host(),
            path = %target.url().path(),
            timeout = ?policy.fetch_timeout,
            "Fetching upstream"
        );

        let started = Instant::now();
        let upstream = match timeout(policy.fetch_timeout, self.upstream.fetch(target.url())).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(RelayError::FetchFailed(e)),
            Err(_) => {
                return Err(RelayError::FetchFailed(UpstreamError::Timeout(policy.fetch_timeout)))
            }
        };
        metrics::record_upstream_fetch(upstream.status.as_u16(), started);

        let UpstreamResponse { status, headers, body } = upstream;

        if status.is_redirection() {
            tracing::warn!(
                status = %status,
                location = ?headers.get(axum::http::header::LOCATION),
                "Upstream attempted a redirect"
            );
            return Err(RelayError::RedirectBlocked);
        }

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status));
        }

        if !envelope::has_content_type(&headers, &policy.required_content_type) {
            return Err(RelayError::UnsupportedMediaType);
        }

        let declared = envelope::declared_length(&headers).ok_or(RelayError::InvalidContentLength)?;
        if declared > policy.max_payload_bytes {
            return Err(RelayError::PayloadTooLarge {
                declared,
                max: policy.max_payload_bytes,
            });
        }

        metrics::record_declared_bytes(declared);

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = envelope::response_headers(target, declared, &headers, policy);
        Ok(response)
    }
}

impl std::fmt::Debug for RelayGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayGate").field("policy", &self.policy).finish_non_exhaustive()
    }
}
