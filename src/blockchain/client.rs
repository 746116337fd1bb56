//! JSON-RPC client for one network, with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to the primary and failover JSON-RPC endpoints
//! - Query chain state (block number, balances, nonces, receipts, gas)
//! - Broadcast signed raw transactions
//! - Handle timeouts and network errors gracefully

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainId, GatewayError, GatewayResult};
use crate::config::NetworkConfig;
use crate::observability::metrics;

/// RPC client wrapper with failover support.
#[derive(Clone)]
pub struct RpcClient {
    /// Network id this client serves (for logs and metrics).
    network: String,
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Endpoint configuration.
    config: NetworkConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a new client for a network.
    ///
    /// Fails only when the primary URL does not parse; an unreachable node is
    /// reported on first use instead.
    pub fn new(network: &str, config: NetworkConfig, rpc_timeout_secs: u64) -> GatewayResult<Self> {
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            GatewayError::Network(format!("invalid RPC URL for {}: {}", network, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(network = %network, url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::debug!(
            network = %network,
            chain_id = config.chain_id,
            endpoints = providers.len(),
            "RPC client initialized"
        );

        Ok(Self {
            network: network.to_string(),
            providers,
            config,
            timeout_duration: Duration::from_secs(rpc_timeout_secs),
        })
    }

    fn record(&self, method: &'static str, ok: bool) {
        metrics::record_rpc_request(&self.network, method, ok);
    }

    fn exhausted(&self, what: &str) -> GatewayError {
        GatewayError::Network(format!(
            "all {} RPC endpoint(s) for {} failed to {}",
            self.providers.len(),
            self.network,
            what
        ))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> GatewayResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(GatewayError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> GatewayResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_chain_id()).await {
                Ok(Ok(result)) => {
                    self.record("eth_chainId", true);
                    return Ok(ChainId(result));
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error, trying next provider"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout, trying next provider"),
            }
        }
        self.record("eth_chainId", false);
        Err(self.exhausted("get chain id"))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> GatewayResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_block_number()).await {
                Ok(Ok(result)) => {
                    self.record("eth_blockNumber", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_blockNumber", false);
        Err(self.exhausted("get block number"))
    }

    /// Get the balance of an address at the latest block.
    pub async fn get_balance(&self, address: Address) -> GatewayResult<U256> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_balance(address)).await {
                Ok(Ok(result)) => {
                    self.record("eth_getBalance", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_getBalance", false);
        Err(self.exhausted("get balance"))
    }

    /// Get the pending transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> GatewayResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_count(address).pending()).await {
                Ok(Ok(result)) => {
                    self.record("eth_getTransactionCount", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_getTransactionCount", false);
        Err(self.exhausted("get transaction count"))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> GatewayResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_receipt(tx_hash)).await {
                Ok(Ok(result)) => {
                    self.record("eth_getTransactionReceipt", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_getTransactionReceipt", false);
        Err(self.exhausted("get receipt"))
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> GatewayResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_gas_price()).await {
                Ok(Ok(result)) => {
                    self.record("eth_gasPrice", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::warn!(network = %self.network, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_gasPrice", false);
        Err(self.exhausted("get gas price"))
    }

    /// Estimate the gas limit for a transaction.
    pub async fn estimate_gas(&self, tx: TransactionRequest) -> GatewayResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.estimate_gas(tx.clone())).await {
                Ok(Ok(result)) => {
                    self.record("eth_estimateGas", true);
                    return Ok(result);
                }
                Ok(Err(e)) => tracing::debug!(network = %self.network, provider_idx = i, error = %e, "Gas estimation failed"),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_estimateGas", false);
        Err(self.exhausted("estimate gas"))
    }

    /// Broadcast a signed, EIP-2718 encoded transaction.
    ///
    /// A JSON-RPC error response is the node refusing the transaction and is
    /// returned as [`GatewayError::TransferRejected`] without trying further
    /// endpoints; transport failures and timeouts fall through to the next one.
    pub async fn send_raw_transaction(&self, encoded: &[u8]) -> GatewayResult<TxHash> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(encoded)).await {
                Ok(Ok(pending)) => {
                    self.record("eth_sendRawTransaction", true);
                    return Ok(*pending.tx_hash());
                }
                Ok(Err(RpcError::ErrorResp(payload))) => {
                    self.record("eth_sendRawTransaction", false);
                    return Err(GatewayError::TransferRejected(payload.message.to_string()));
                }
                Ok(Err(e)) => log_transport_error(&self.network, i, &e),
                Err(_) => tracing::warn!(network = %self.network, provider_idx = i, "RPC timeout"),
            }
        }
        self.record("eth_sendRawTransaction", false);
        Err(self.exhausted("broadcast transaction"))
    }

    /// Network id this client serves.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Get the endpoint configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Chain ID used for signing.
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }
}

fn log_transport_error(network: &str, provider_idx: usize, error: &RpcError<TransportErrorKind>) {
    tracing::warn!(network = %network, provider_idx = provider_idx, error = %error, "RPC error");
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("network", &self.network)
            .field("chain_id", &self.config.chain_id)
            .field("endpoints", &self.providers.len())
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> NetworkConfig {
        NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337, // Anvil default
            native_symbol: "ETH".to_string(),
            is_testnet: true,
        }
    }

    #[test]
    fn test_client_creation() {
        // Creation never touches the network
        let client = RpcClient::new("anvil", test_config(), 1).unwrap();
        assert_eq!(client.chain_id(), 31337);
        assert_eq!(client.network(), "anvil");
    }

    #[test]
    fn test_invalid_primary_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        assert!(matches!(
            RpcClient::new("anvil", config, 1),
            Err(GatewayError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausted() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        config.failover_urls.push("::invalid::".to_string());

        let client = RpcClient::new("anvil", config, 1).unwrap();
        assert_eq!(client.providers.len(), 2);

        // Both endpoints refuse connections
        let err = client.get_balance(Address::ZERO).await.unwrap_err();
        assert!(err.to_string().contains("all 2 RPC endpoint(s) for anvil failed"));
    }
}
