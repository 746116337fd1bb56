//! One transfer from one stored wallet, recorded as a `SINGLE` ledger entry.

use alloy::primitives::U256;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::units::serde_native;
use crate::ledger::{LedgerError, NewTransferRecord, OperationLedger, TransferKind, TransferRecord, TransferSettlement};
use crate::observability::metrics;
use crate::transfer::address::{validate_address, AddressError};
use crate::transfer::executor::{TransferExecutor, TransferOutcome};
use crate::vault::{KeyVault, VaultError};

#[derive(Debug, Clone, Deserialize)]
pub struct SingleTransferRequest {
    pub wallet_id: Uuid,
    pub destination_address: String,
    #[serde(with = "serde_native")]
    pub amount: U256,
}

#[derive(Debug, Error)]
pub enum SingleTransferError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("wallet {0} not found")]
    WalletNotFound(Uuid),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("decrypted key does not match wallet {0}")]
    AddressMismatch(Uuid),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct SingleTransferService {
    ledger: Arc<dyn OperationLedger>,
    vault: Arc<KeyVault>,
    executor: TransferExecutor,
}

impl SingleTransferService {
    pub fn new(ledger: Arc<dyn OperationLedger>, vault: Arc<KeyVault>, executor: TransferExecutor) -> Self {
        Self { ledger, vault, executor }
    }

    /// Send `amount` from one of the owner's wallets and return the settled record.
    ///
    /// A failed transfer is not an error: the record comes back `FAILED` with
    /// its reason.
    pub async fn send(&self, owner_id: &str, request: SingleTransferRequest) -> Result<TransferRecord, SingleTransferError> {
        let destination = validate_address(&request.destination_address)?;
        if request.amount.is_zero() {
            return Err(SingleTransferError::InvalidAmount("amount must be greater than zero".to_string()));
        }

        let wallet = self
            .ledger
            .list_wallets_for_owner(owner_id)
            .await?
            .into_iter()
            .find(|w| w.id == request.wallet_id)
            .ok_or(SingleTransferError::WalletNotFound(request.wallet_id))?;

        let key = self.vault.decrypt(&wallet.encrypted_key)?;
        if key.address()? != wallet.address {
            tracing::error!(wallet_id = %wallet.id, "Decrypted key does not match stored address");
            return Err(SingleTransferError::AddressMismatch(wallet.id));
        }

        let record = self
            .ledger
            .create_transfer_record(NewTransferRecord {
                owner_id: owner_id.to_string(),
                kind: TransferKind::Single,
                operation_id: None,
                source_wallet_id: Some(wallet.id),
                destination_address: destination,
                amount: request.amount,
                network: wallet.network.clone(),
            })
            .await?;

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(&key, &destination.to_string(), request.amount, &wallet.network)
            .await;
        metrics::record_transfer(TransferKind::Single.as_str(), outcome.label(), started);

        let settlement = match outcome {
            TransferOutcome::Confirmed { hash, fee_actual } => TransferSettlement::Confirmed { hash, fee: fee_actual },
            TransferOutcome::Failed { reason } => TransferSettlement::Failed { reason },
        };
        let settled = self.ledger.update_transfer_record(record.id, settlement).await?;

        tracing::info!(
            transfer_id = %settled.id,
            wallet_id = %wallet.id,
            network = %wallet.network,
            status = ?settled.status,
            "Single transfer settled"
        );
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{FeeEstimate, GatewayError, GatewayResult, SubmittedTransfer};
    use crate::blockchain::ChainGateway;
    use crate::ledger::{MemoryLedger, TransferStatus, WalletRecord};
    use crate::vault::{derive_address, RawKey};
    use alloy::primitives::{Address, TxHash};
    use async_trait::async_trait;
    use chrono::Utc;

    const MASTER: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEST: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    struct FixedGateway(GatewayResult<SubmittedTransfer>);

    #[async_trait]
    impl ChainGateway for FixedGateway {
        async fn get_balance(&self, _: &str, _: Address) -> GatewayResult<U256> {
            Ok(U256::ZERO)
        }

        async fn estimate_fee(&self, _: &str, _: Address, _: Address, _: U256) -> GatewayResult<FeeEstimate> {
            Ok(FeeEstimate::market(U256::ZERO))
        }

        async fn submit_transfer(&self, _: &str, _: &RawKey, _: Address, _: U256) -> GatewayResult<SubmittedTransfer> {
            self.0.clone()
        }
    }

    fn setup(result: GatewayResult<SubmittedTransfer>) -> (SingleTransferService, MemoryLedger, Uuid) {
        let ledger = MemoryLedger::new(None);
        let vault = Arc::new(KeyVault::from_hex(MASTER).unwrap());
        let wallet = ledger
            .insert_wallet(WalletRecord {
                id: Uuid::new_v4(),
                owner_id: "alice".to_string(),
                display_name: "hot".to_string(),
                address: derive_address(KEY).unwrap(),
                encrypted_key: vault.encrypt(KEY).unwrap(),
                network: "sepolia".to_string(),
                cached_balance: None,
                created_at: Utc::now(),
            })
            .unwrap();

        let service = SingleTransferService::new(
            Arc::new(ledger.clone()),
            vault,
            TransferExecutor::new(Arc::new(FixedGateway(result))),
        );
        (service, ledger, wallet.id)
    }

    fn request(wallet_id: Uuid, to: &str, amount: u64) -> SingleTransferRequest {
        SingleTransferRequest {
            wallet_id,
            destination_address: to.to_string(),
            amount: U256::from(amount),
        }
    }

    #[tokio::test]
    async fn test_confirmed_transfer_settles_record() {
        let (service, ledger, wallet_id) = setup(Ok(SubmittedTransfer {
            hash: TxHash::repeat_byte(7),
            fee_actual: U256::from(21_000u64),
            block_number: Some(1),
        }));

        let record = service.send("alice", request(wallet_id, DEST, 1_000)).await.unwrap();

        assert_eq!(record.kind, TransferKind::Single);
        assert_eq!(record.status, TransferStatus::Confirmed);
        assert_eq!(record.submitted_hash, Some(TxHash::repeat_byte(7)));
        assert_eq!(record.fee_used, Some(U256::from(21_000u64)));
        assert!(record.operation_id.is_none());
        assert_eq!(ledger.transfers_for_owner("alice").len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_transfer_returns_failed_record() {
        let (service, _, wallet_id) = setup(Err(GatewayError::TransferRejected("nonce too low".to_string())));

        let record = service.send("alice", request(wallet_id, DEST, 1_000)).await.unwrap();

        assert_eq!(record.status, TransferStatus::Failed);
        assert!(record.failure_reason.unwrap().contains("nonce too low"));
    }

    #[tokio::test]
    async fn test_validation_precedes_lookup() {
        let (service, ledger, wallet_id) = setup(Err(GatewayError::Network("unused".to_string())));

        assert!(matches!(
            service.send("alice", request(wallet_id, "0x1234", 1)).await,
            Err(SingleTransferError::InvalidAddress(_))
        ));
        assert!(matches!(
            service.send("alice", request(wallet_id, DEST, 0)).await,
            Err(SingleTransferError::InvalidAmount(_))
        ));
        assert!(matches!(
            service.send("bob", request(wallet_id, DEST, 1)).await,
            Err(SingleTransferError::WalletNotFound(_))
        ));
        assert!(ledger.transfers_for_owner("alice").is_empty());
    }
}
