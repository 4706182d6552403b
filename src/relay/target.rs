//! Target URL extraction and validation.
//!
//! Everything here runs before any network access. A target that leaves this
//! module as a [`TargetDescriptor`] is on an allowlisted host and inside this
//! deployment's project/dataset scope.

use url::Url;

use crate::relay::error::RelayError;
use crate::relay::policy::RelayPolicy;

/// Name of the query parameter carrying the target.
pub const TARGET_PARAM: &str = "url";

/// Name used when the target path has no final segment.
pub const FALLBACK_FILENAME: &str = "document.pdf";

/// A validated upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    url: Url,
}

impl TargetDescriptor {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Non-empty path segments, still percent-encoded.
    pub fn segments(&self) -> Vec<&str> {
        self.url.path().split('/').filter(|s| !s.is_empty()).collect()
    }

    /// The final path segment, or [`FALLBACK_FILENAME`] when the path ends
    /// with a slash.
    pub fn raw_filename(&self) -> &str {
        match self.url.path().rsplit('/').next() {
            Some(last) if !last.is_empty() => last,
            _ => FALLBACK_FILENAME,
        }
    }
}

/// Pull the first `url` parameter out of a raw query string.
///
/// An empty value is treated the same as an absent one.
pub fn extract_target_param(query: Option<&str>) -> Result<String, RelayError> {
    let query = query.unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or(RelayError::MissingParameter)
}

/// Parse and validate a raw target against `policy`.
///
/// Checks run in order and stop at the first failure: absolute URL, `https`
/// scheme, exact host allowlist, project/dataset path scope.
pub fn validate_target(raw: &str, policy: &RelayPolicy) -> Result<TargetDescriptor, RelayError> {
    let url = Url::parse(raw).map_err(RelayError::InvalidParameter)?;

    if url.scheme() != "https" {
        return Err(RelayError::InsecureScheme);
    }

    match url.host_str() {
        Some(host) if policy.is_host_allowed(host) => {}
        _ => return Err(RelayError::HostNotAllowed),
    }

    if !policy.is_path_in_scope(url.path()) {
        return Err(RelayError::OutOfScope);
    }

    Ok(TargetDescriptor { url })
}

/// Both steps in one call: query string in, validated target out.
pub fn resolve_target(query: Option<&str>, policy: &RelayPolicy) -> Result<TargetDescriptor, RelayError> {
    let raw = extract_target_param(query)?;
    validate_target(&raw, policy)
}
