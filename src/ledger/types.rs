//! Ledger record types.

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::units::{serde_native, serde_native_opt};
use crate::config::NetworkConfig;

/// A stored wallet. The address is derived once at import and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub display_name: String,
    pub address: Address,
    /// `iv:authTag:ciphertext`, see [`crate::vault::KeyVault`].
    pub encrypted_key: String,
    pub network: String,
    /// Last balance seen by a balance refresh.
    #[serde(default, with = "serde_native_opt")]
    pub cached_balance: Option<U256>,
    pub created_at: DateTime<Utc>,
}

/// A network registered at runtime. Custom networks are shared by every
/// owner of the deployment; `registered_by` records who added it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomNetworkRecord {
    pub id: String,
    pub config: NetworkConfig,
    pub registered_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferKind {
    Single,
    BatchMember,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Single => "single",
            TransferKind::BatchMember => "batch_member",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Confirmed => "confirmed",
            OperationStatus::Failed => "failed",
        }
    }
}

/// One native transfer, single or part of a mass send.
///
/// Created `PENDING`, settled exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: TransferKind,
    pub operation_id: Option<Uuid>,
    /// Cleared when the source wallet is deleted.
    pub source_wallet_id: Option<Uuid>,
    pub destination_address: Address,
    #[serde(with = "serde_native")]
    pub amount: U256,
    pub network: String,
    pub submitted_hash: Option<TxHash>,
    pub status: TransferStatus,
    #[serde(default, with = "serde_native_opt")]
    pub fee_used: Option<U256>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Aggregate record of one mass send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassSendOperation {
    pub id: Uuid,
    pub owner_id: String,
    pub destination_address: Address,
    pub network: String,
    #[serde(with = "serde_native")]
    pub total_amount_sent: U256,
    pub wallets_count: usize,
    pub status: OperationStatus,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

/// Input for [`crate::ledger::OperationLedger::create_operation`].
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub owner_id: String,
    pub destination_address: Address,
    pub network: String,
    pub wallets_count: usize,
}

/// Input for [`crate::ledger::OperationLedger::create_transfer_record`].
#[derive(Debug, Clone)]
pub struct NewTransferRecord {
    pub owner_id: String,
    pub kind: TransferKind,
    pub operation_id: Option<Uuid>,
    pub source_wallet_id: Option<Uuid>,
    pub destination_address: Address,
    pub amount: U256,
    pub network: String,
}

/// Terminal state of a transfer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSettlement {
    Confirmed { hash: TxHash, fee: U256 },
    Failed { reason: String },
}

impl TransferSettlement {
    pub fn status(&self) -> TransferStatus {
        match self {
            TransferSettlement::Confirmed { .. } => TransferStatus::Confirmed,
            TransferSettlement::Failed { .. } => TransferStatus::Failed,
        }
    }

    /// Whether `record` already carries exactly this settlement.
    pub fn matches(&self, record: &TransferRecord) -> bool {
        match self {
            TransferSettlement::Confirmed { hash, fee } => {
                record.status == TransferStatus::Confirmed
                    && record.submitted_hash == Some(*hash)
                    && record.fee_used == Some(*fee)
            }
            TransferSettlement::Failed { reason } => {
                record.status == TransferStatus::Failed && record.failure_reason.as_deref() == Some(reason.as_str())
            }
        }
    }
}

/// Terminal state of a mass-send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFinalization {
    pub status: OperationStatus,
    pub total_amount_sent: U256,
}
