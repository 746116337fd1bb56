//! Mass-send request, result and error types.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::units::serde_native;
use crate::ledger::{LedgerError, OperationStatus};
use crate::transfer::{AddressError, TransferOutcome};

/// Drain the selected wallets into one destination.
#[derive(Debug, Clone, Deserialize)]
pub struct MassSendRequest {
    pub destination_address: String,
    /// Native asset symbol, e.g. `SepoliaETH`, or a network id.
    pub asset_symbol: String,
    pub wallet_ids: Vec<Uuid>,
    /// Network to run on when the symbol alone is ambiguous.
    #[serde(default)]
    pub network: Option<String>,
}

/// Why a wallet was not attempted. Skips are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Balance at or below the dust threshold.
    Dust,
    /// Nothing left after fee and safety reserve.
    Unsendable,
    /// Shutdown began before this wallet was reached.
    Aborted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Dust => "dust",
            SkipReason::Unsendable => "unsendable",
            SkipReason::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWallet {
    pub wallet_id: Uuid,
    pub reason: SkipReason,
}

/// Outcome for one attempted wallet.
///
/// `amount` is the computed send; it is zero when the wallet failed before a
/// transfer record existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerWalletResult {
    pub wallet_id: Uuid,
    #[serde(flatten)]
    pub outcome: TransferOutcome,
    #[serde(with = "serde_native")]
    pub amount: U256,
}

impl PerWalletResult {
    pub fn failed(wallet_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            wallet_id,
            outcome: TransferOutcome::failed(reason),
            amount: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MassSendSummary {
    pub operation_id: Uuid,
    pub status: OperationStatus,
    pub network: String,
    /// Sum of confirmed sends.
    #[serde(with = "serde_native")]
    pub total_amount: U256,
    /// Number of distinct wallets in the request, whatever happened to them.
    pub wallets_processed: usize,
    pub per_wallet_results: Vec<PerWalletResult>,
    pub skipped: Vec<SkippedWallet>,
}

/// Errors that stop a mass send before any wallet is touched.
#[derive(Debug, Error)]
pub enum MassSendError {
    #[error("no wallets selected")]
    NoWalletsSelected,

    #[error("invalid destination address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
