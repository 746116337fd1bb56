//! Chain-specific types and error definitions.

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::units;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during gateway operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// RPC connection or request failed on every configured endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// No endpoint is configured for the requested network id.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The node refused the transaction (bad destination, insufficient funds, revert).
    #[error("transfer rejected: {0}")]
    TransferRejected(String),

    /// The transaction was broadcast but not included before the deadline.
    #[error("transfer {tx_hash} not included after {timeout_secs} seconds")]
    TransferTimeout { tx_hash: TxHash, timeout_secs: u64 },

    /// Gas price exceeded maximum allowed.
    #[error("gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// The signing key could not be turned into a signer.
    #[error("signing error: {0}")]
    Signing(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Fee estimate for a prospective transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeEstimate {
    /// Estimated fee in wei.
    #[serde(with = "units::serde_native")]
    pub amount: U256,
    /// True when the estimate is the configured fallback, not market data.
    pub is_fallback: bool,
}

impl FeeEstimate {
    pub fn market(amount: U256) -> Self {
        Self {
            amount,
            is_fallback: false,
        }
    }

    pub fn fallback(amount: U256) -> Self {
        Self {
            amount,
            is_fallback: true,
        }
    }
}

/// A transfer that the network has included in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmittedTransfer {
    pub hash: TxHash,
    /// `gas_used * effective_gas_price` from the receipt.
    #[serde(with = "units::serde_native")]
    pub fee_actual: U256,
    pub block_number: Option<u64>,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was reverted on-chain.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(11155111u64);
        assert_eq!(chain_id.0, 11155111);
        assert_eq!(u64::from(chain_id), 11155111);
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::UnsupportedNetwork("goerli".to_string());
        assert_eq!(err.to_string(), "unsupported network: goerli");

        let err = GatewayError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));

        let err = GatewayError::TransferTimeout {
            tx_hash: TxHash::ZERO,
            timeout_secs: 120,
        };
        assert!(err.to_string().contains("120 seconds"));
    }

    #[test]
    fn test_fee_estimate_constructors() {
        assert!(!FeeEstimate::market(U256::from(1)).is_fallback);
        assert!(FeeEstimate::fallback(U256::from(1)).is_fallback);
    }
}
