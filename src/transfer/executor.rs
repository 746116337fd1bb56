//! Single-transfer execution against a [`ChainGateway`].

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::units::serde_native;
use crate::blockchain::ChainGateway;
use crate::transfer::address::validate_address;
use crate::vault::RawKey;

/// Result of one transfer attempt. Never an error: failures are data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    Confirmed {
        hash: TxHash,
        #[serde(with = "serde_native")]
        fee_actual: U256,
    },
    Failed {
        reason: String,
    },
}

impl TransferOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        TransferOutcome::Failed { reason: reason.into() }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransferOutcome::Confirmed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransferOutcome::Confirmed { .. } => "confirmed",
            TransferOutcome::Failed { .. } => "failed",
        }
    }
}

/// Validates the destination, submits, and folds every error into an outcome.
#[derive(Clone)]
pub struct TransferExecutor {
    gateway: Arc<dyn ChainGateway>,
}

impl TransferExecutor {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self { gateway }
    }

    /// Send `amount` wei from the key's address to `to` on `network`.
    ///
    /// An invalid destination fails without any gateway call.
    pub async fn execute(&self, key: &RawKey, to: &str, amount: U256, network: &str) -> TransferOutcome {
        let destination = match validate_address(to) {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(network = %network, to = %to, error = %e, "Rejected transfer destination");
                return TransferOutcome::failed(format!("invalid address: {}", e));
            }
        };

        match self.gateway.submit_transfer(network, key, destination, amount).await {
            Ok(submitted) => {
                tracing::info!(
                    network = %network,
                    to = %destination,
                    tx_hash = %submitted.hash,
                    "Transfer confirmed"
                );
                TransferOutcome::Confirmed {
                    hash: submitted.hash,
                    fee_actual: submitted.fee_actual,
                }
            }
            Err(e) => {
                tracing::warn!(network = %network, to = %destination, error = %e, "Transfer failed");
                TransferOutcome::failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for TransferExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferExecutor").finish_non_exhaustive()
    }
}
