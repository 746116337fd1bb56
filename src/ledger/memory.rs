//! In-memory ledger with optional JSON snapshot persistence.
//!
//! Mutations only mark the ledger dirty. Snapshots are written by
//! [`MemoryLedger::flush`], normally from the background saver in `saver.rs`.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::ledger::types::*;
use crate::ledger::{LedgerError, LedgerResult, OperationLedger};

/// A record plus its insertion sequence, used for stable listing order.
#[derive(Debug, Clone)]
struct Slot<T> {
    seq: u64,
    record: T,
}

/// On-disk layout: each table in insertion order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerSnapshot {
    wallets: Vec<WalletRecord>,
    operations: Vec<MassSendOperation>,
    transfers: Vec<TransferRecord>,
    #[serde(default)]
    networks: Vec<CustomNetworkRecord>,
}

type WalletKey = (String, String, Address);

fn wallet_key(wallet: &WalletRecord) -> WalletKey {
    (wallet.owner_id.clone(), wallet.network.clone(), wallet.address)
}

fn persistence_error(path: &str, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Persistence(format!("{}: {}", path, e))
}

/// A thread-safe ledger backed by `DashMap` tables.
///
/// Cloning is cheap and clones share state.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    wallets: Arc<DashMap<Uuid, Slot<WalletRecord>>>,
    /// (owner, network, address) → wallet id.
    wallet_index: Arc<DashMap<WalletKey, Uuid>>,
    operations: Arc<DashMap<Uuid, Slot<MassSendOperation>>>,
    transfers: Arc<DashMap<Uuid, Slot<TransferRecord>>>,
    networks: Arc<DashMap<String, Slot<CustomNetworkRecord>>>,
    seq: Arc<AtomicU64>,
    persistence_path: Option<String>,
    save_lock: Arc<Mutex<()>>,
    dirty: Arc<AtomicBool>,
    changed: Arc<Notify>,
}

impl MemoryLedger {
    /// Create an empty ledger. With a path, snapshots are written there.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from file if it exists, otherwise start empty at that path.
    pub fn load_from_file(path: &str) -> LedgerResult<Self> {
        let ledger = Self::new(Some(path.to_string()));
        if !Path::new(path).exists() {
            return Ok(ledger);
        }

        let file = File::open(path).map_err(|e| persistence_error(path, e))?;
        let snapshot: LedgerSnapshot =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| persistence_error(path, e))?;

        for wallet in snapshot.wallets {
            ledger.wallet_index.insert(wallet_key(&wallet), wallet.id);
            let seq = ledger.next_seq();
            ledger.wallets.insert(wallet.id, Slot { seq, record: wallet });
        }
        for operation in snapshot.operations {
            let seq = ledger.next_seq();
            ledger.operations.insert(operation.id, Slot { seq, record: operation });
        }
        for transfer in snapshot.transfers {
            let seq = ledger.next_seq();
            ledger.transfers.insert(transfer.id, Slot { seq, record: transfer });
        }
        for network in snapshot.networks {
            let seq = ledger.next_seq();
            ledger.networks.insert(network.id.clone(), Slot { seq, record: network });
        }

        tracing::info!(
            path = %path,
            wallets = ledger.wallets.len(),
            operations = ledger.operations.len(),
            transfers = ledger.transfers.len(),
            networks = ledger.networks.len(),
            "Loaded ledger snapshot"
        );
        Ok(ledger)
    }

    /// Write a snapshot to the persistence path, if one is set.
    ///
    /// The snapshot is taken while holding the save lock, so the last writer
    /// to finish always leaves the newest state on disk.
    pub fn save_to_file(&self) -> LedgerResult<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let _guard = self.save_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let snapshot = LedgerSnapshot {
            wallets: ordered(&self.wallets, |_| true),
            operations: ordered(&self.operations, |_| true),
            transfers: ordered(&self.transfers, |_| true),
            networks: ordered(&self.networks, |_| true),
        };

        let tmp_path = format!("{}.tmp", path);
        let file = File::create(&tmp_path).map_err(|e| persistence_error(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &snapshot).map_err(|e| persistence_error(&tmp_path, e))?;
        writer.flush().map_err(|e| persistence_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| persistence_error(path, e))?;

        tracing::debug!(path = %path, "Saved ledger snapshot");
        Ok(())
    }

    /// Write a snapshot if anything changed since the last one.
    ///
    /// File I/O runs on the blocking pool. On failure the ledger stays dirty
    /// so the next flush retries.
    pub async fn flush(&self) -> LedgerResult<()> {
        if self.persistence_path.is_none() || !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let ledger = self.clone();
        let result = tokio::task::spawn_blocking(move || ledger.save_to_file())
            .await
            .map_err(|e| LedgerError::Persistence(format!("snapshot task failed: {}", e)))
            .and_then(|saved| saved);

        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result
    }

    /// Whether there are changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Resolve when the ledger has changed since the last call.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    fn mark_dirty(&self) {
        if self.persistence_path.is_some() {
            self.dirty.store(true, Ordering::SeqCst);
            self.changed.notify_one();
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Store a new wallet. One wallet per (owner, network, address).
    pub fn insert_wallet(&self, wallet: WalletRecord) -> LedgerResult<WalletRecord> {
        match self.wallet_index.entry(wallet_key(&wallet)) {
            Entry::Occupied(_) => {
                return Err(LedgerError::DuplicateWallet {
                    address: wallet.address.to_string(),
                    network: wallet.network.clone(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(wallet.id);
            }
        }

        let seq = self.next_seq();
        self.wallets.insert(
            wallet.id,
            Slot {
                seq,
                record: wallet.clone(),
            },
        );
        self.mark_dirty();
        Ok(wallet)
    }

    /// Look up a wallet owned by `owner_id`.
    pub fn get_wallet(&self, owner_id: &str, id: Uuid) -> Option<WalletRecord> {
        self.wallets
            .get(&id)
            .filter(|slot| slot.record.owner_id == owner_id)
            .map(|slot| slot.record.clone())
    }

    /// Delete a wallet and detach it from its transfer history.
    pub fn delete_wallet(&self, owner_id: &str, id: Uuid) -> LedgerResult<WalletRecord> {
        let (_, slot) = self
            .wallets
            .remove_if(&id, |_, slot| slot.record.owner_id == owner_id)
            .ok_or(LedgerError::WalletNotFound(id))?;
        self.wallet_index.remove(&wallet_key(&slot.record));

        for mut transfer in self.transfers.iter_mut() {
            if transfer.record.source_wallet_id == Some(id) {
                transfer.record.source_wallet_id = None;
            }
        }

        self.mark_dirty();
        Ok(slot.record)
    }

    pub fn update_cached_balance(&self, id: Uuid, balance: U256) -> LedgerResult<()> {
        {
            let mut slot = self.wallets.get_mut(&id).ok_or(LedgerError::WalletNotFound(id))?;
            slot.record.cached_balance = Some(balance);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Every transfer of one owner, in creation order.
    pub fn transfers_for_owner(&self, owner_id: &str) -> Vec<TransferRecord> {
        ordered(&self.transfers, |t| t.owner_id == owner_id)
    }

    /// Remember a runtime-registered network so it survives restarts.
    pub fn insert_custom_network(&self, network: CustomNetworkRecord) {
        let seq = self.next_seq();
        self.networks.insert(network.id.clone(), Slot { seq, record: network });
        self.mark_dirty();
    }

    /// Runtime-registered networks, in registration order.
    pub fn custom_networks(&self) -> Vec<CustomNetworkRecord> {
        ordered(&self.networks, |_| true)
    }
}

/// Records matching `keep`, in insertion order.
fn ordered<K: Eq + Hash, T: Clone>(table: &DashMap<K, Slot<T>>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut slots: Vec<(u64, T)> = table
        .iter()
        .filter(|r| keep(&r.value().record))
        .map(|r| (r.value().seq, r.value().record.clone()))
        .collect();
    slots.sort_by_key(|(seq, _)| *seq);
    slots.into_iter().map(|(_, record)| record).collect()
}

#[async_trait]
impl OperationLedger for MemoryLedger {
    async fn create_operation(&self, new: NewOperation) -> LedgerResult<MassSendOperation> {
        let operation = MassSendOperation {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            destination_address: new.destination_address,
            network: new.network,
            total_amount_sent: U256::ZERO,
            wallets_count: new.wallets_count,
            status: OperationStatus::Pending,
            created_at: Utc::now(),
            finalized_at: None,
        };
        let seq = self.next_seq();
        self.operations.insert(
            operation.id,
            Slot {
                seq,
                record: operation.clone(),
            },
        );
        self.mark_dirty();
        Ok(operation)
    }

    async fn update_operation(&self, id: Uuid, finalization: OperationFinalization) -> LedgerResult<MassSendOperation> {
        if finalization.status == OperationStatus::Pending {
            return Err(LedgerError::InvalidTransition(format!(
                "operation {} cannot be finalized as PENDING",
                id
            )));
        }

        let operation = {
            let mut slot = self.operations.get_mut(&id).ok_or(LedgerError::OperationNotFound(id))?;
            let op = &mut slot.record;
            if op.status != OperationStatus::Pending {
                if op.status == finalization.status && op.total_amount_sent == finalization.total_amount_sent {
                    return Ok(op.clone());
                }
                return Err(LedgerError::AlreadyFinalized(id));
            }
            op.status = finalization.status;
            op.total_amount_sent = finalization.total_amount_sent;
            op.finalized_at = Some(Utc::now());
            op.clone()
        };
        self.mark_dirty();
        Ok(operation)
    }

    async fn get_operation(&self, id: Uuid) -> LedgerResult<Option<MassSendOperation>> {
        Ok(self.operations.get(&id).map(|slot| slot.record.clone()))
    }

    async fn create_transfer_record(&self, new: NewTransferRecord) -> LedgerResult<TransferRecord> {
        let record = TransferRecord {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            kind: new.kind,
            operation_id: new.operation_id,
            source_wallet_id: new.source_wallet_id,
            destination_address: new.destination_address,
            amount: new.amount,
            network: new.network,
            submitted_hash: None,
            status: TransferStatus::Pending,
            fee_used: None,
            failure_reason: None,
            created_at: Utc::now(),
            settled_at: None,
        };
        let seq = self.next_seq();
        self.transfers.insert(
            record.id,
            Slot {
                seq,
                record: record.clone(),
            },
        );
        self.mark_dirty();
        Ok(record)
    }

    async fn update_transfer_record(&self, id: Uuid, settlement: TransferSettlement) -> LedgerResult<TransferRecord> {
        let record = {
            let mut slot = self.transfers.get_mut(&id).ok_or(LedgerError::TransferNotFound(id))?;
            let record = &mut slot.record;
            if record.status != TransferStatus::Pending {
                if settlement.matches(record) {
                    return Ok(record.clone());
                }
                return Err(LedgerError::AlreadySettled(id));
            }

            record.status = settlement.status();
            match settlement {
                TransferSettlement::Confirmed { hash, fee } => {
                    record.submitted_hash = Some(hash);
                    record.fee_used = Some(fee);
                }
                TransferSettlement::Failed { reason } => {
                    record.failure_reason = Some(reason);
                }
            }
            record.settled_at = Some(Utc::now());
            record.clone()
        };
        self.mark_dirty();
        Ok(record)
    }

    async fn list_transfer_records(&self, operation_id: Uuid) -> LedgerResult<Vec<TransferRecord>> {
        Ok(ordered(&self.transfers, |t| t.operation_id == Some(operation_id)))
    }

    async fn list_wallets_for_owner(&self, owner_id: &str) -> LedgerResult<Vec<WalletRecord>> {
        Ok(ordered(&self.wallets, |w| w.owner_id == owner_id))
    }
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("wallets", &self.wallets.len())
            .field("operations", &self.operations.len())
            .field("transfers", &self.transfers.len())
            .field("networks", &self.networks.len())
            .field("persistence_path", &self.persistence_path)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
