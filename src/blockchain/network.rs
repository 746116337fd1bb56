//! Network registry: network id → endpoint configuration.
//!
//! Built once from the deployment config (built-in table merged with
//! `[networks.*]` overrides) and shared via `Arc`. Custom networks registered
//! at runtime live alongside the configured ones but may not shadow them.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::blockchain::types::{GatewayError, GatewayResult};
use crate::config::schema::{builtin_networks, NetworkConfig};
use crate::config::validation::validate_network;

/// Errors raised by registry lookups and registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("network '{0}' already exists")]
    DuplicateNetwork(String),

    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),
}

#[derive(Debug, Clone)]
struct Entry {
    config: NetworkConfig,
    custom: bool,
}

/// Public description of a network. Endpoint URLs are omitted since they
/// often embed provider API keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkView {
    pub id: String,
    pub chain_id: u64,
    pub native_symbol: String,
    pub is_testnet: bool,
    pub custom: bool,
}

/// Thread-safe lookup table of configured networks.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    networks: DashMap<String, Entry>,
}

fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

impl NetworkRegistry {
    /// Build the registry from the built-in table plus deployment overrides.
    pub fn from_config(overrides: &BTreeMap<String, NetworkConfig>) -> Self {
        let registry = Self::default();
        for (id, config) in builtin_networks().into_iter().chain(overrides.clone()) {
            registry.networks.insert(
                normalize(&id),
                Entry {
                    config,
                    custom: false,
                },
            );
        }
        registry
    }

    /// Build a registry containing exactly the given networks.
    pub fn with_networks(networks: impl IntoIterator<Item = (String, NetworkConfig)>) -> Self {
        let registry = Self::default();
        for (id, config) in networks {
            registry.networks.insert(
                normalize(&id),
                Entry {
                    config,
                    custom: false,
                },
            );
        }
        registry
    }

    /// Resolve a network id to its endpoint configuration.
    pub fn resolve(&self, id: &str) -> GatewayResult<NetworkConfig> {
        self.networks
            .get(&normalize(id))
            .map(|entry| entry.config.clone())
            .ok_or_else(|| GatewayError::UnsupportedNetwork(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.networks.contains_key(&normalize(id))
    }

    /// Register a user-supplied network.
    pub fn register_custom(&self, id: &str, config: NetworkConfig) -> Result<NetworkView, RegistryError> {
        let key = normalize(id);
        let errors = validate_network(&format!("networks.{}", key), &key, &config);
        if !errors.is_empty() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(RegistryError::InvalidNetwork(joined.join(", ")));
        }

        match self.networks.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::DuplicateNetwork(key)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::info!(
                    network = %key,
                    chain_id = config.chain_id,
                    native_symbol = %config.native_symbol,
                    "Custom network registered"
                );
                let view = view_of(&key, &config, true);
                slot.insert(Entry {
                    config,
                    custom: true,
                });
                Ok(view)
            }
        }
    }

    /// Re-register networks saved by a previous run. Entries that no longer
    /// validate or now collide with a configured network are skipped.
    pub fn restore_custom(&self, networks: impl IntoIterator<Item = (String, NetworkConfig)>) -> usize {
        let mut restored = 0;
        for (id, config) in networks {
            match self.register_custom(&id, config) {
                Ok(_) => restored += 1,
                Err(e) => tracing::warn!(network = %id, error = %e, "Skipping saved custom network"),
            }
        }
        restored
    }

    /// All networks, ordered by id.
    pub fn list(&self) -> Vec<NetworkView> {
        let mut views: Vec<NetworkView> = self
            .networks
            .iter()
            .map(|r| view_of(r.key(), &r.value().config, r.value().custom))
            .collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }

    /// Pick the network a mass send in `symbol` runs on.
    ///
    /// With a hint, the hinted network must carry the symbol. Without one the
    /// symbol is matched against network ids first, then against native
    /// symbols; more than one candidate is ambiguous.
    pub fn resolve_asset(&self, symbol: &str, hint: Option<&str>) -> Result<NetworkView, RegistryError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(RegistryError::UnsupportedAsset("asset symbol is empty".to_string()));
        }

        if let Some(network_id) = hint {
            let key = normalize(network_id);
            let entry = self.networks.get(&key).ok_or_else(|| {
                RegistryError::UnsupportedAsset(format!("network '{}' is not configured", network_id))
            })?;
            if !entry.config.native_symbol.eq_ignore_ascii_case(symbol) {
                return Err(RegistryError::UnsupportedAsset(format!(
                    "network '{}' carries {}, not {}",
                    key, entry.config.native_symbol, symbol
                )));
            }
            return Ok(view_of(&key, &entry.config, entry.custom));
        }

        if let Some(entry) = self.networks.get(&normalize(symbol)) {
            return Ok(view_of(entry.key(), &entry.config, entry.custom));
        }

        let mut matches: Vec<NetworkView> = self
            .networks
            .iter()
            .filter(|r| r.value().config.native_symbol.eq_ignore_ascii_case(symbol))
            .map(|r| view_of(r.key(), &r.value().config, r.value().custom))
            .collect();

        match matches.len() {
            0 => Err(RegistryError::UnsupportedAsset(format!(
                "no configured network carries {}",
                symbol
            ))),
            1 => Ok(matches.remove(0)),
            _ => {
                let mut ids: Vec<String> = matches.into_iter().map(|v| v.id).collect();
                ids.sort();
                Err(RegistryError::UnsupportedAsset(format!(
                    "{} is native to several networks ({}); specify one",
                    symbol,
                    ids.join(", ")
                )))
            }
        }
    }
}

fn view_of(id: &str, config: &NetworkConfig, custom: bool) -> NetworkView {
    NetworkView {
        id: id.to_string(),
        chain_id: config.chain_id,
        native_symbol: config.native_symbol.clone(),
        is_testnet: config.is_testnet,
        custom,
    }
}
