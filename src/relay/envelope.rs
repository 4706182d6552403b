//! Upstream header checks and the client-facing header envelope.
//!
//! Only the headers built here reach the client. Upstream headers other than
//! `cache-control` are dropped.

use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
};
use axum::http::{HeaderMap, HeaderValue};

use crate::relay::policy::RelayPolicy;
use crate::relay::target::TargetDescriptor;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Case-insensitive substring check of the upstream content-type.
///
/// A header that is missing or not visible ASCII never matches.
pub fn has_content_type(headers: &HeaderMap, required: &str) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains(&required.to_ascii_lowercase()))
        .unwrap_or(false)
}

/// The declared upstream length, if present, numeric and strictly positive.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|len| *len > 0)
}

/// Headers sent with a successful relay.
pub fn response_headers(
    target: &TargetDescriptor,
    content_length: u64,
    upstream: &HeaderMap,
    policy: &RelayPolicy,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&policy.required_content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(PDF_CONTENT_TYPE)),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));

    let disposition = format!("inline; filename=\"{}\"", sanitize_filename(target.raw_filename()));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("inline")),
    );

    let cache_control = upstream.get(CACHE_CONTROL).cloned().unwrap_or_else(|| {
        HeaderValue::from_str(&policy.default_cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600"))
    });
    headers.insert(CACHE_CONTROL, cache_control);

    headers
}
