//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Hosts serving CMS file assets.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 2] = ["cdn.sanity.io", "assets.sanity.io"];

/// 20 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Root configuration for the relay service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayServiceConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Relay policy: what may be fetched and how it is served.
    pub relay: RelayConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrently served requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Relay policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Path the relay endpoint is mounted on.
    pub route: String,

    /// Hosts a target URL may point at (exact hostname match).
    pub allowed_hosts: Vec<String>,

    /// First path segment of an acceptable asset URL.
    pub asset_kind: String,

    /// CMS project id; second path segment.
    pub project_id: String,

    /// CMS dataset; third path segment.
    pub dataset: String,

    /// Largest declared upstream content length that is relayed.
    pub max_payload_bytes: u64,

    /// Substring the upstream content-type must contain.
    pub required_content_type: String,

    /// Cache-Control sent when upstream provides none.
    pub default_cache_control: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            route: "/api/pdf".to_string(),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            asset_kind: "files".to_string(),
            project_id: "qnuj1c4o".to_string(),
            dataset: "production".to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            required_content_type: "application/pdf".to_string(),
            default_cache_control: "public, max-age=3600".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream fetch timeout (until response headers) in seconds.
    pub upstream_secs: u64,

    /// Overall handler deadline in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 15,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
