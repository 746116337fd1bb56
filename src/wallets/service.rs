//! Wallet import, listing, deletion and balance refresh.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::units::serde_native_opt;
use crate::blockchain::{ChainGateway, NetworkRegistry};
use crate::ledger::{LedgerError, MemoryLedger, OperationLedger, WalletRecord};
use crate::vault::{KeyVault, RawKey, VaultError};

#[derive(Clone, Deserialize)]
pub struct ImportWalletRequest {
    #[serde(default)]
    pub display_name: String,
    pub private_key: String,
    pub network: String,
}

impl std::fmt::Debug for ImportWalletRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportWalletRequest")
            .field("display_name", &self.display_name)
            .field("private_key", &"[REDACTED]")
            .field("network", &self.network)
            .finish()
    }
}

/// A wallet as shown to its owner. Carries no key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    pub id: Uuid,
    pub display_name: String,
    pub address: Address,
    pub network: String,
    #[serde(with = "serde_native_opt")]
    pub cached_balance: Option<U256>,
    pub created_at: DateTime<Utc>,
}

impl From<&WalletRecord> for WalletView {
    fn from(wallet: &WalletRecord) -> Self {
        Self {
            id: wallet.id,
            display_name: wallet.display_name.clone(),
            address: wallet.address,
            network: wallet.network.clone(),
            cached_balance: wallet.cached_balance,
            created_at: wallet.created_at,
        }
    }
}

/// Result of refreshing one wallet. On error the cached balance is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRefresh {
    pub wallet_id: Uuid,
    pub network: String,
    #[serde(with = "serde_native_opt")]
    pub balance: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid private key: {0}")]
    InvalidKey(VaultError),

    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("wallet {address} is already imported on {network}")]
    DuplicateWallet { address: String, network: String },

    #[error("wallet {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for WalletError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicateWallet { address, network } => WalletError::DuplicateWallet { address, network },
            LedgerError::WalletNotFound(id) => WalletError::NotFound(id),
            other => WalletError::Ledger(other),
        }
    }
}

pub struct WalletService {
    ledger: MemoryLedger,
    vault: Arc<KeyVault>,
    gateway: Arc<dyn ChainGateway>,
    registry: Arc<NetworkRegistry>,
}

impl WalletService {
    pub fn new(
        ledger: MemoryLedger,
        vault: Arc<KeyVault>,
        gateway: Arc<dyn ChainGateway>,
        registry: Arc<NetworkRegistry>,
    ) -> Self {
        Self {
            ledger,
            vault,
            gateway,
            registry,
        }
    }

    /// Validate, encrypt and store a private key.
    pub async fn import_wallet(&self, owner_id: &str, request: ImportWalletRequest) -> Result<WalletView, WalletError> {
        let key = RawKey::parse(&request.private_key).map_err(WalletError::InvalidKey)?;
        let address = key.address().map_err(WalletError::InvalidKey)?;

        let network = request.network.trim().to_ascii_lowercase();
        if !self.registry.contains(&network) {
            return Err(WalletError::UnsupportedNetwork(request.network));
        }

        let encrypted_key = self.vault.encrypt_key(&key)?;
        let display_name = match request.display_name.trim() {
            "" => address.to_string(),
            name => name.to_string(),
        };

        let wallet = self.ledger.insert_wallet(WalletRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            display_name,
            address,
            encrypted_key,
            network,
            cached_balance: None,
            created_at: Utc::now(),
        })?;

        tracing::info!(
            wallet_id = %wallet.id,
            address = %wallet.address,
            network = %wallet.network,
            "Wallet imported"
        );
        Ok(WalletView::from(&wallet))
    }

    pub async fn list_wallets(&self, owner_id: &str) -> Result<Vec<WalletView>, WalletError> {
        let wallets = self.ledger.list_wallets_for_owner(owner_id).await?;
        Ok(wallets.iter().map(WalletView::from).collect())
    }

    /// Delete a wallet. Its transfer history stays, detached from it.
    pub async fn delete_wallet(&self, owner_id: &str, id: Uuid) -> Result<WalletView, WalletError> {
        let wallet = self.ledger.delete_wallet(owner_id, id)?;
        tracing::info!(wallet_id = %id, "Wallet deleted");
        Ok(WalletView::from(&wallet))
    }

    /// Fetch live balances one wallet at a time and update the cache.
    pub async fn refresh_balances(&self, owner_id: &str) -> Result<Vec<BalanceRefresh>, WalletError> {
        let wallets = self.ledger.list_wallets_for_owner(owner_id).await?;
        let mut refreshed = Vec::with_capacity(wallets.len());

        for wallet in wallets {
            let entry = match self.gateway.get_balance(&wallet.network, wallet.address).await {
                Ok(balance) => {
                    self.ledger.update_cached_balance(wallet.id, balance)?;
                    BalanceRefresh {
                        wallet_id: wallet.id,
                        network: wallet.network,
                        balance: Some(balance),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(wallet_id = %wallet.id, network = %wallet.network, error = %e, "Balance refresh failed");
                    BalanceRefresh {
                        wallet_id: wallet.id,
                        network: wallet.network,
                        balance: wallet.cached_balance,
                        error: Some(e.to_string()),
                    }
                }
            };
            refreshed.push(entry);
        }

        Ok(refreshed)
    }
}
