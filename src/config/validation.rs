//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, payload cap > 0)
//! - Reject allowlist entries that are not bare hostnames
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::RelayServiceConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &RelayServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    let relay = &config.relay;
    if !relay.route.starts_with('/') {
        errors.push(ValidationError::new("relay.route", "must start with '/'"));
    }
    if relay.allowed_hosts.is_empty() {
        errors.push(ValidationError::new("relay.allowed_hosts", "must list at least one host"));
    }
    for host in &relay.allowed_hosts {
        if !is_bare_hostname(host) {
            errors.push(ValidationError::new(
                "relay.allowed_hosts",
                format!("'{}' is not a lowercase hostname", host),
            ));
        }
    }
    for (field, value) in [
        ("relay.asset_kind", &relay.asset_kind),
        ("relay.project_id", &relay.project_id),
        ("relay.dataset", &relay.dataset),
        ("relay.required_content_type", &relay.required_content_type),
        ("relay.default_cache_control", &relay.default_cache_control),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        } else if value.contains('/') && field != "relay.required_content_type" {
            errors.push(ValidationError::new(field, "must not contain '/'"));
        }
    }
    if relay.max_payload_bytes == 0 {
        errors.push(ValidationError::new("relay.max_payload_bytes", "must be greater than 0"));
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }
    if timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than timeouts.upstream_secs",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_bare_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        && !host.starts_with('.')
        && !host.ends_with('.')
}
