//! Relay rejection taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::relay::upstream::UpstreamError;

/// Coarse classification of a rejection, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing client input.
    ClientInput,
    /// Target is outside the allowlist.
    PolicyViolation,
    /// Upstream could not be reached or answered unusably.
    UpstreamUnavailable,
    /// Upstream answered, but the payload breaks content rules.
    PayloadPolicy,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientInput => "client_input",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::PayloadPolicy => "payload_policy",
        }
    }
}

/// Every way the relay can refuse a request.
///
/// The `Display` text is the exact plain-text body sent to the client; it
/// never includes upstream content or internal error detail.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing url parameter")]
    MissingParameter,

    #[error("Invalid url parameter")]
    InvalidParameter(#[source] url::ParseError),

    #[error("Only https URLs are allowed")]
    InsecureScheme,

    #[error("Host not allowed")]
    HostNotAllowed,

    #[error("Project or dataset not allowed")]
    OutOfScope,

    #[error("Failed to fetch upstream PDF")]
    FetchFailed(#[source] UpstreamError),

    #[error("Upstream redirects are not allowed")]
    RedirectBlocked,

    #[error("Upstream error: {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    #[error("Upstream resource is not a PDF")]
    UnsupportedMediaType,

    #[error("Missing or invalid upstream content length")]
    InvalidContentLength,

    #[error("Upstream PDF exceeds maximum allowed size")]
    PayloadTooLarge { declared: u64, max: u64 },
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingParameter
            | RelayError::InvalidParameter(_)
            | RelayError::InsecureScheme => StatusCode::BAD_REQUEST,
            RelayError::HostNotAllowed | RelayError::OutOfScope => StatusCode::FORBIDDEN,
            RelayError::FetchFailed(_)
            | RelayError::RedirectBlocked
            | RelayError::UpstreamStatus(_)
            | RelayError::InvalidContentLength => StatusCode::BAD_GATEWAY,
            RelayError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::MissingParameter
            | RelayError::InvalidParameter(_)
            | RelayError::InsecureScheme => ErrorKind::ClientInput,
            RelayError::HostNotAllowed | RelayError::OutOfScope => ErrorKind::PolicyViolation,
            RelayError::FetchFailed(_)
            | RelayError::RedirectBlocked
            | RelayError::UpstreamStatus(_) => ErrorKind::UpstreamUnavailable,
            RelayError::UnsupportedMediaType
            | RelayError::InvalidContentLength
            | RelayError::PayloadTooLarge { .. } => ErrorKind::PayloadPolicy,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
