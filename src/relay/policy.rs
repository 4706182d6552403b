//! Immutable relay policy.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::{RelayConfig, TimeoutConfig};

/// What the relay may fetch and how much of it.
///
/// Built once at startup from configuration and shared read-only across
/// requests. Tests construct alternate policies directly.
#[derive(Debug, Clone)]
pub struct RelayPolicy {
    pub allowed_hosts: HashSet<String>,
    pub asset_kind: String,
    pub project_id: String,
    pub dataset: String,
    pub max_payload_bytes: u64,
    pub fetch_timeout: Duration,
    /// Lowercase substring the upstream content-type must contain.
    pub required_content_type: String,
    pub default_cache_control: String,
}

impl RelayPolicy {
    pub fn from_config(relay: &RelayConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            allowed_hosts: relay.allowed_hosts.iter().cloned().collect(),
            asset_kind: relay.asset_kind.clone(),
            project_id: relay.project_id.clone(),
            dataset: relay.dataset.clone(),
            max_payload_bytes: relay.max_payload_bytes,
            fetch_timeout: Duration::from_secs(timeouts.upstream_secs),
            required_content_type: relay.required_content_type.to_ascii_lowercase(),
            default_cache_control: relay.default_cache_control.clone(),
        }
    }

    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }

    /// Whether `path` addresses an asset owned by this deployment.
    ///
    /// Requires at least four non-empty segments:
    /// `/{asset_kind}/{project_id}/{dataset}/{name...}`.
    pub fn is_path_in_scope(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 4 {
            return false;
        }

        segments[0] == self.asset_kind
            && segments[1] == self.project_id
            && segments[2] == self.dataset
    }
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default(), &TimeoutConfig::default())
    }
}
