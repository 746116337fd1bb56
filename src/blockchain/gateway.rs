//! Chain gateway: the boundary between transfer logic and EVM nodes.
//!
//! Everything above this module talks to chains through [`ChainGateway`], so
//! batch logic can be exercised against a scripted implementation.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::blockchain::client::RpcClient;
use crate::blockchain::network::NetworkRegistry;
use crate::blockchain::signer::TransferSigner;
use crate::blockchain::transaction::{adjusted_gas_price, transfer_gas_limit, TransferBuilder};
use crate::blockchain::types::{FeeEstimate, GatewayResult, SubmittedTransfer};
use crate::config::GatewayConfig;
use crate::vault::RawKey;

/// Balance, fee and submission primitives keyed by network id.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Latest balance of `address`, in wei.
    async fn get_balance(&self, network: &str, address: Address) -> GatewayResult<U256>;

    /// Fee for sending `amount` from `from` to `to`.
    ///
    /// Only an unknown network is an error; RPC trouble yields a fallback
    /// estimate.
    async fn estimate_fee(
        &self,
        network: &str,
        from: Address,
        to: Address,
        amount: U256,
    ) -> GatewayResult<FeeEstimate>;

    /// Sign, broadcast and wait for inclusion of a native transfer.
    async fn submit_transfer(
        &self,
        network: &str,
        key: &RawKey,
        to: Address,
        amount: U256,
    ) -> GatewayResult<SubmittedTransfer>;
}

/// [`ChainGateway`] over JSON-RPC nodes from the [`NetworkRegistry`].
pub struct RpcGateway {
    registry: Arc<NetworkRegistry>,
    config: GatewayConfig,
    /// Lazily created clients, one per network id.
    clients: DashMap<String, RpcClient>,
}

impl RpcGateway {
    pub fn new(registry: Arc<NetworkRegistry>, config: GatewayConfig) -> Self {
        Self {
            registry,
            config,
            clients: DashMap::new(),
        }
    }

    /// Client for a network, created on first use.
    pub fn client(&self, network: &str) -> GatewayResult<RpcClient> {
        let key = network.trim().to_ascii_lowercase();
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let config = self.registry.resolve(&key)?;
        let client = RpcClient::new(&key, config, self.config.rpc_timeout_secs)?;
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn get_balance(&self, network: &str, address: Address) -> GatewayResult<U256> {
        let client = self.client(network)?;
        client.get_balance(address).await
    }

    async fn estimate_fee(
        &self,
        network: &str,
        from: Address,
        to: Address,
        amount: U256,
    ) -> GatewayResult<FeeEstimate> {
        let client = self.client(network)?;

        let gas_price = match client.get_gas_price().await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(
                    network = %network,
                    error = %e,
                    "Gas price unavailable, using fallback fee"
                );
                return Ok(FeeEstimate::fallback(self.config.fallback_fee));
            }
        };

        let gas_limit = transfer_gas_limit(&client, from, to, amount).await;
        let price = adjusted_gas_price(gas_price, self.config.gas_price_multiplier);
        Ok(FeeEstimate::market(U256::from(gas_limit) * U256::from(price)))
    }

    async fn submit_transfer(
        &self,
        network: &str,
        key: &RawKey,
        to: Address,
        amount: U256,
    ) -> GatewayResult<SubmittedTransfer> {
        let client = self.client(network)?;
        // A custom network may be registered with the wrong chain id
        client.verify_chain_id().await?;
        let signer = TransferSigner::new(key, client.chain_id())?;
        TransferBuilder::new(&client, signer, &self.config)
            .send(to, amount)
            .await
    }
}

impl std::fmt::Debug for RpcGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcGateway")
            .field("config", &self.config)
            .field("clients", &self.clients.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::GatewayError;
    use crate::config::NetworkConfig;

    fn gateway() -> RpcGateway {
        let registry = NetworkRegistry::with_networks(vec![(
            "anvil".to_string(),
            NetworkConfig::new("http://127.0.0.1:1", 31337, "ETH", true),
        )]);
        let config = GatewayConfig {
            rpc_timeout_secs: 1,
            ..GatewayConfig::default()
        };
        RpcGateway::new(Arc::new(registry), config)
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let gw = gateway();
        let err = gw.get_balance("goerli", Address::ZERO).await.unwrap_err();
        assert_eq!(err, GatewayError::UnsupportedNetwork("goerli".to_string()));

        let err = gw
            .estimate_fee("goerli", Address::ZERO, Address::ZERO, U256::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::UnsupportedNetwork("goerli".to_string()));
    }

    #[tokio::test]
    async fn test_fee_falls_back_when_unreachable() {
        let gw = gateway();
        let fee = gw
            .estimate_fee("anvil", Address::ZERO, Address::repeat_byte(1), U256::from(1))
            .await
            .unwrap();
        assert!(fee.is_fallback);
        assert_eq!(fee.amount, gw.config().fallback_fee);
    }

    #[tokio::test]
    async fn test_balance_unreachable_is_network_error() {
        let gw = gateway();
        let err = gw.get_balance("ANVIL", Address::ZERO).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));
    }

    #[test]
    fn test_clients_are_cached() {
        let gw = gateway();
        gw.client("anvil").unwrap();
        gw.client("Anvil").unwrap();
        assert_eq!(gw.clients.len(), 1);
    }
}
