//! Mass-send orchestration: drain many wallets into one destination.
//!
//! # Responsibilities
//! - Reject malformed requests before any side effect
//! - Walk the selected wallets one at a time, isolating failures per wallet
//! - Keep the ledger in step: one operation, one record per attempted send
//! - Aggregate a consistent summary whatever happens to individual wallets

use alloy::primitives::{Address, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::blockchain::{ChainGateway, NetworkRegistry};
use crate::config::MassSendConfig;
use crate::ledger::{
    NewOperation, NewTransferRecord, OperationFinalization, OperationLedger, OperationStatus, TransferKind,
    TransferSettlement, WalletRecord,
};
use crate::lifecycle::Shutdown;
use crate::mass_send::types::*;
use crate::observability::metrics;
use crate::transfer::{validate_address, TransferExecutor, TransferOutcome};
use crate::vault::KeyVault;

/// Per-run context shared by every wallet of one operation.
struct Run<'a> {
    operation_id: Uuid,
    owner_id: &'a str,
    network: &'a str,
    destination: Address,
}

/// What happened to one wallet.
enum WalletStep {
    Attempted(PerWalletResult),
    Skipped(SkipReason),
}

pub struct MassSendOrchestrator {
    gateway: Arc<dyn ChainGateway>,
    ledger: Arc<dyn OperationLedger>,
    vault: Arc<KeyVault>,
    executor: TransferExecutor,
    registry: Arc<NetworkRegistry>,
    config: MassSendConfig,
    shutdown: Shutdown,
}

impl MassSendOrchestrator {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        ledger: Arc<dyn OperationLedger>,
        vault: Arc<KeyVault>,
        registry: Arc<NetworkRegistry>,
        config: MassSendConfig,
        shutdown: Shutdown,
    ) -> Self {
        let executor = TransferExecutor::new(gateway.clone());
        Self {
            gateway,
            ledger,
            vault,
            executor,
            registry,
            config,
            shutdown,
        }
    }

    /// Run a mass send for `owner_id`.
    ///
    /// Errors are returned only for bad input or a ledger failure before the
    /// operation exists. From then on every problem is folded into the summary.
    pub async fn run(&self, owner_id: &str, request: MassSendRequest) -> Result<MassSendSummary, MassSendError> {
        // Dedupe, keeping first-occurrence order
        let mut seen = HashSet::new();
        let wallet_ids: Vec<Uuid> = request.wallet_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if wallet_ids.is_empty() {
            return Err(MassSendError::NoWalletsSelected);
        }

        let destination = validate_address(&request.destination_address)?;
        let network = self
            .registry
            .resolve_asset(&request.asset_symbol, request.network.as_deref())
            .map_err(|e| MassSendError::UnsupportedAsset(e.to_string()))?;

        let wallets: HashMap<Uuid, WalletRecord> = self
            .ledger
            .list_wallets_for_owner(owner_id)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let operation = self
            .ledger
            .create_operation(NewOperation {
                owner_id: owner_id.to_string(),
                destination_address: destination,
                network: network.id.clone(),
                wallets_count: wallet_ids.len(),
            })
            .await?;

        tracing::info!(
            operation_id = %operation.id,
            network = %network.id,
            destination = %destination,
            wallets = wallet_ids.len(),
            "Mass send started"
        );

        let run = Run {
            operation_id: operation.id,
            owner_id,
            network: &network.id,
            destination,
        };

        let mut total = U256::ZERO;
        let mut any_confirmed = false;
        let mut per_wallet_results = Vec::new();
        let mut skipped = Vec::new();

        for wallet_id in &wallet_ids {
            let step = if self.shutdown.is_triggered() {
                WalletStep::Skipped(SkipReason::Aborted)
            } else {
                self.process_wallet(&run, *wallet_id, wallets.get(wallet_id)).await
            };

            match step {
                WalletStep::Attempted(result) => {
                    if result.outcome.is_confirmed() {
                        any_confirmed = true;
                        total += result.amount;
                    }
                    per_wallet_results.push(result);
                }
                WalletStep::Skipped(reason) => {
                    tracing::info!(
                        operation_id = %run.operation_id,
                        wallet_id = %wallet_id,
                        reason = reason.as_str(),
                        "Wallet skipped"
                    );
                    metrics::record_wallet_skipped(reason.as_str());
                    skipped.push(SkippedWallet {
                        wallet_id: *wallet_id,
                        reason,
                    });
                }
            }
        }

        let status = if any_confirmed {
            OperationStatus::Confirmed
        } else {
            OperationStatus::Failed
        };

        let finalization = OperationFinalization {
            status,
            total_amount_sent: total,
        };
        if let Err(e) = self.ledger.update_operation(operation.id, finalization).await {
            tracing::error!(operation_id = %operation.id, error = %e, "Failed to finalize operation");
        }
        metrics::record_operation(status.as_str());

        tracing::info!(
            operation_id = %operation.id,
            status = status.as_str(),
            attempted = per_wallet_results.len(),
            skipped = skipped.len(),
            "Mass send finished"
        );

        Ok(MassSendSummary {
            operation_id: operation.id,
            status,
            network: network.id,
            total_amount: total,
            wallets_processed: wallet_ids.len(),
            per_wallet_results,
            skipped,
        })
    }

    async fn process_wallet(&self, run: &Run<'_>, wallet_id: Uuid, wallet: Option<&WalletRecord>) -> WalletStep {
        let Some(wallet) = wallet else {
            tracing::warn!(operation_id = %run.operation_id, wallet_id = %wallet_id, "Wallet not found");
            return WalletStep::Attempted(PerWalletResult::failed(wallet_id, "wallet not found"));
        };
        if !wallet.network.eq_ignore_ascii_case(run.network) {
            tracing::warn!(
                operation_id = %run.operation_id,
                wallet_id = %wallet_id,
                wallet_network = %wallet.network,
                "Wallet is on another network"
            );
            return WalletStep::Attempted(PerWalletResult::failed(
                wallet_id,
                format!("wallet is on {}, not {}", wallet.network, run.network),
            ));
        }

        let balance = match self.gateway.get_balance(run.network, wallet.address).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(operation_id = %run.operation_id, wallet_id = %wallet_id, error = %e, "Balance fetch failed");
                return WalletStep::Attempted(PerWalletResult::failed(wallet_id, format!("balance unavailable: {}", e)));
            }
        };
        if balance <= self.config.dust_threshold {
            return WalletStep::Skipped(SkipReason::Dust);
        }

        let key = match self.vault.decrypt(&wallet.encrypted_key) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(operation_id = %run.operation_id, wallet_id = %wallet_id, error = %e, "Key decryption failed");
                return WalletStep::Attempted(PerWalletResult::failed(wallet_id, e.to_string()));
            }
        };
        match key.address() {
            Ok(address) if address == wallet.address => {}
            Ok(_) => {
                tracing::error!(operation_id = %run.operation_id, wallet_id = %wallet_id, "Decrypted key does not match stored address");
                return WalletStep::Attempted(PerWalletResult::failed(
                    wallet_id,
                    "decrypted key does not match wallet address",
                ));
            }
            Err(e) => {
                return WalletStep::Attempted(PerWalletResult::failed(wallet_id, e.to_string()));
            }
        }

        let fee = match self
            .gateway
            .estimate_fee(run.network, wallet.address, run.destination, balance)
            .await
        {
            Ok(fee) => fee,
            Err(e) => {
                tracing::warn!(operation_id = %run.operation_id, wallet_id = %wallet_id, error = %e, "Fee estimation failed");
                return WalletStep::Attempted(PerWalletResult::failed(wallet_id, e.to_string()));
            }
        };
        if fee.is_fallback {
            tracing::debug!(operation_id = %run.operation_id, wallet_id = %wallet_id, "Using fallback fee");
        }

        let send = match balance
            .checked_sub(fee.amount)
            .and_then(|rest| rest.checked_sub(self.config.safety_reserve))
        {
            Some(send) if !send.is_zero() => send,
            _ => return WalletStep::Skipped(SkipReason::Unsendable),
        };

        let record = match self
            .ledger
            .create_transfer_record(NewTransferRecord {
                owner_id: run.owner_id.to_string(),
                kind: TransferKind::BatchMember,
                operation_id: Some(run.operation_id),
                source_wallet_id: Some(wallet_id),
                destination_address: run.destination,
                amount: send,
                network: run.network.to_string(),
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(operation_id = %run.operation_id, wallet_id = %wallet_id, error = %e, "Failed to create transfer record");
                return WalletStep::Attempted(PerWalletResult::failed(wallet_id, format!("ledger error: {}", e)));
            }
        };

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(&key, &run.destination.to_string(), send, run.network)
            .await;
        metrics::record_transfer(TransferKind::BatchMember.as_str(), outcome.label(), started);

        let settlement = match &outcome {
            TransferOutcome::Confirmed { hash, fee_actual } => TransferSettlement::Confirmed {
                hash: *hash,
                fee: *fee_actual,
            },
            TransferOutcome::Failed { reason } => TransferSettlement::Failed { reason: reason.clone() },
        };
        if let Err(e) = self.ledger.update_transfer_record(record.id, settlement).await {
            tracing::error!(
                operation_id = %run.operation_id,
                wallet_id = %wallet_id,
                transfer_id = %record.id,
                error = %e,
                "Failed to settle transfer record"
            );
        }

        WalletStep::Attempted(PerWalletResult {
            wallet_id,
            outcome,
            amount: send,
        })
    }
}
