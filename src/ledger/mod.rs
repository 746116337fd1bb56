//! Operation ledger: persistence for wallets, transfers and mass sends.
//!
//! # Data Flow
//! ```text
//! MassSendOrchestrator / SingleTransferService
//!     → OperationLedger (create → settle / finalize exactly once)
//!     → memory.rs (DashMap tables, marked dirty on every change)
//!     → saver.rs (debounced JSON snapshot on disk, final flush at shutdown)
//! ```
//!
//! # Design Decisions
//! - Records are upserted independently by id; no multi-record transactions
//! - Settling a record twice with the same outcome is a no-op, with a different
//!   outcome an error
//! - Deleting a wallet keeps its transfer history

pub mod memory;
pub mod saver;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryLedger;
pub use saver::spawn_snapshot_saver;
pub use types::{
    CustomNetworkRecord, MassSendOperation, NewOperation, NewTransferRecord, OperationFinalization, OperationStatus,
    TransferKind, TransferRecord, TransferSettlement, TransferStatus, WalletRecord,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("operation {0} not found")]
    OperationNotFound(Uuid),

    #[error("transfer record {0} not found")]
    TransferNotFound(Uuid),

    #[error("wallet {0} not found")]
    WalletNotFound(Uuid),

    #[error("wallet {address} is already imported on {network}")]
    DuplicateWallet { address: String, network: String },

    #[error("transfer record {0} is already settled differently")]
    AlreadySettled(Uuid),

    #[error("operation {0} is already finalized differently")]
    AlreadyFinalized(Uuid),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Storage used by the transfer and mass-send flows.
#[async_trait]
pub trait OperationLedger: Send + Sync {
    /// Create a `PENDING` operation with a zero total.
    async fn create_operation(&self, new: NewOperation) -> LedgerResult<MassSendOperation>;

    /// Finalize an operation.
    async fn update_operation(&self, id: Uuid, finalization: OperationFinalization) -> LedgerResult<MassSendOperation>;

    async fn get_operation(&self, id: Uuid) -> LedgerResult<Option<MassSendOperation>>;

    /// Create a `PENDING` transfer record.
    async fn create_transfer_record(&self, new: NewTransferRecord) -> LedgerResult<TransferRecord>;

    /// Settle a transfer record.
    async fn update_transfer_record(&self, id: Uuid, settlement: TransferSettlement) -> LedgerResult<TransferRecord>;

    /// Members of an operation, in creation order.
    async fn list_transfer_records(&self, operation_id: Uuid) -> LedgerResult<Vec<TransferRecord>>;

    /// Wallets of one owner, in import order.
    async fn list_wallets_for_owner(&self, owner_id: &str) -> LedgerResult<Vec<WalletRecord>>;
}
