//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, multiplier >= 1.0)
//! - Validate addresses and endpoint URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AppConfig, NetworkConfig};

/// A single semantic problem in the configuration.
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

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new("server.max_body_size", "must be > 0"));
    }

    for (id, network) in &config.networks {
        errors.extend(validate_network(&format!("networks.{}", id), id, network));
    }

    let gateway = &config.gateway;
    if gateway.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.rpc_timeout_secs", "must be > 0"));
    }
    if gateway.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.confirmation_timeout_secs", "must be > 0"));
    }
    if gateway.confirmation_blocks == 0 {
        errors.push(ValidationError::new("gateway.confirmation_blocks", "must be >= 1"));
    }
    if gateway.poll_base_ms == 0 || gateway.poll_max_ms < gateway.poll_base_ms {
        errors.push(ValidationError::new(
            "gateway.poll_base_ms",
            "must be > 0 and not exceed gateway.poll_max_ms",
        ));
    }
    if !gateway.gas_price_multiplier.is_finite() || gateway.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::new("gateway.gas_price_multiplier", "must be >= 1.0"));
    }
    if gateway.fallback_fee.is_zero() {
        errors.push(ValidationError::new("gateway.fallback_fee", "must be > 0"));
    }

    if config.vault.master_key_env.trim().is_empty() {
        errors.push(ValidationError::new("vault.master_key_env", "must not be empty"));
    }

    if let Some(path) = &config.ledger.persistence_path {
        if path.trim().is_empty() {
            errors.push(ValidationError::new("ledger.persistence_path", "must not be empty when set"));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one network entry. Shared with runtime registration of custom networks.
pub fn validate_network(field: &str, id: &str, network: &NetworkConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if id.trim().is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        errors.push(ValidationError::new(
            field,
            "network id must be non-empty and contain only [A-Za-z0-9_-]",
        ));
    }
    if let Err(e) = network.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            format!("{}.rpc_url", field),
            format!("invalid URL '{}': {}", network.rpc_url, e),
        ));
    }
    for (i, failover) in network.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                format!("{}.failover_urls[{}]", field, i),
                format!("invalid URL '{}'", failover),
            ));
        }
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::new(format!("{}.chain_id", field), "must be > 0"));
    }
    if network.native_symbol.trim().is_empty() {
        errors.push(ValidationError::new(format!("{}.native_symbol", field), "must not be empty"));
    }

    errors
}
