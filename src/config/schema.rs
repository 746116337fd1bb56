//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.
//! Amounts are written as native-unit decimal strings (`"0.001"`).

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::blockchain::units::{self, serde_native};

/// Root configuration for the multisend service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Network overrides and additions, keyed by network id.
    ///
    /// Entries are merged over the built-in table; an entry with a built-in id
    /// replaces that network for this deployment.
    pub networks: BTreeMap<String, NetworkConfig>,

    /// RPC gateway behaviour.
    pub gateway: GatewayConfig,

    /// Mass-send policy.
    pub mass_send: MassSendConfig,

    /// Key vault settings.
    pub vault: VaultConfig,

    /// Ledger persistence.
    pub ledger: LedgerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds. Mass sends wait for inclusion, so keep this generous.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 600,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Endpoint configuration for one EVM network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID used for EIP-155 signing.
    pub chain_id: u64,

    /// Symbol of the native asset (e.g., "ETH", "POL").
    pub native_symbol: String,

    /// Whether the network is a test network.
    #[serde(default)]
    pub is_testnet: bool,
}

impl NetworkConfig {
    pub fn new(rpc_url: &str, chain_id: u64, native_symbol: &str, is_testnet: bool) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            failover_urls: Vec::new(),
            chain_id,
            native_symbol: native_symbol.to_string(),
            is_testnet,
        }
    }
}

/// Public endpoints shipped with the service. Rate limited; override them per
/// deployment through `[networks.<id>]`.
pub fn builtin_networks() -> BTreeMap<String, NetworkConfig> {
    let mut networks = BTreeMap::new();
    networks.insert(
        "ethereum".to_string(),
        NetworkConfig::new("https://eth.llamarpc.com", 1, "ETH", false),
    );
    networks.insert(
        "sepolia".to_string(),
        NetworkConfig::new("https://ethereum-sepolia-rpc.publicnode.com", 11155111, "SepoliaETH", true),
    );
    networks.insert(
        "holesky".to_string(),
        NetworkConfig::new("https://ethereum-holesky-rpc.publicnode.com", 17000, "HoleskyETH", true),
    );
    networks.insert(
        "polygon".to_string(),
        NetworkConfig::new("https://polygon-rpc.com", 137, "POL", false),
    );
    networks.insert(
        "amoy".to_string(),
        NetworkConfig::new("https://rpc-amoy.polygon.technology", 80002, "AmoyPOL", true),
    );
    networks.insert(
        "bsc".to_string(),
        NetworkConfig::new("https://bsc-dataseed.bnbchain.org", 56, "BNB", false),
    );
    networks.insert(
        "bsc-testnet".to_string(),
        NetworkConfig::new("https://data-seed-prebsc-1-s1.bnbchain.org:8545", 97, "tBNB", true),
    );
    networks
}

/// RPC gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum time to wait for a broadcast transfer to be included.
    pub confirmation_timeout_secs: u64,

    /// Number of block confirmations that count as settled (1 = inclusion).
    pub confirmation_blocks: u32,

    /// First receipt poll delay in milliseconds (doubles up to `poll_max_ms`).
    pub poll_base_ms: u64,

    /// Ceiling for the receipt poll delay in milliseconds.
    pub poll_max_ms: u64,

    /// Gas price multiplier (1.0 = market, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Fee assumed when fee market data is unavailable.
    #[serde(with = "serde_native")]
    pub fallback_fee: U256,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 180,
            confirmation_blocks: 1,
            poll_base_ms: 500,
            poll_max_ms: 4_000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            fallback_fee: milli_native(),
        }
    }
}

/// Mass-send amount policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MassSendConfig {
    /// Wallets with a balance at or below this are skipped.
    #[serde(with = "serde_native")]
    pub dust_threshold: U256,

    /// Buffer left behind in each wallet to absorb fee-estimate drift.
    #[serde(with = "serde_native")]
    pub safety_reserve: U256,
}

impl Default for MassSendConfig {
    fn default() -> Self {
        Self {
            dust_threshold: milli_native(),
            safety_reserve: milli_native(),
        }
    }
}

/// 0.001 native units.
fn milli_native() -> U256 {
    U256::from(10u64).pow(U256::from(units::NATIVE_DECIMALS - 3))
}

/// Key vault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Environment variable holding the 32-byte hex master key.
    pub master_key_env: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            master_key_env: crate::vault::cipher::MASTER_KEY_ENV_VAR.to_string(),
        }
    }
}

/// Ledger persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON snapshot file. `None` keeps the ledger in memory only.
    pub persistence_path: Option<String>,

    /// Delay between a change and the snapshot write, in milliseconds.
    pub snapshot_debounce_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            persistence_path: None,
            snapshot_debounce_ms: 250,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "evm_multisend=debug,tower_http=debug".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.networks.is_empty());
        assert_eq!(config.gateway.rpc_timeout_secs, 10);
        assert_eq!(config.gateway.confirmation_blocks, 1);
        assert_eq!(units::format_native(config.mass_send.dust_threshold), "0.001");
        assert_eq!(units::format_native(config.mass_send.safety_reserve), "0.001");
        assert_eq!(units::format_native(config.gateway.fallback_fee), "0.001");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [mass_send]
            dust_threshold = "0.01"

            [networks.anvil]
            rpc_url = "http://localhost:8545"
            chain_id = 31337
            native_symbol = "ETH"
            is_testnet = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_secs, 600);
        assert_eq!(units::format_native(config.mass_send.dust_threshold), "0.01");
        assert_eq!(units::format_native(config.mass_send.safety_reserve), "0.001");
        assert_eq!(config.networks["anvil"].chain_id, 31337);
        assert!(config.networks["anvil"].failover_urls.is_empty());
    }

    #[test]
    fn test_builtin_networks_have_unique_chain_ids() {
        let networks = builtin_networks();
        let mut ids: Vec<u64> = networks.values().map(|n| n.chain_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), networks.len());
    }
}
