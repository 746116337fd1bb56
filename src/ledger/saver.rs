//! Background snapshot writer for [`MemoryLedger`].

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::ledger::MemoryLedger;
use crate::lifecycle::Shutdown;

/// Spawn the task that writes ledger snapshots off the request path.
///
/// After a change it waits `debounce` so a burst of mutations lands in one
/// write. A final flush runs once shutdown is triggered.
pub fn spawn_snapshot_saver(ledger: MemoryLedger, debounce: Duration, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(debounce_ms = debounce.as_millis() as u64, "Ledger snapshot saver started");

        loop {
            tokio::select! {
                _ = ledger.changed() => {
                    tokio::select! {
                        _ = tokio::time::sleep(debounce) => {}
                        _ = shutdown.wait() => {}
                    }
                    if let Err(e) = ledger.flush().await {
                        tracing::error!(error = %e, "Failed to save ledger snapshot");
                    }
                }
                _ = shutdown.wait() => {
                    tracing::info!("Ledger snapshot saver shutting down");
                    break;
                }
            }
        }

        if let Err(e) = ledger.flush().await {
            tracing::error!(error = %e, "Failed to save ledger on shutdown");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{OperationLedger, WalletRecord};
    use alloy::primitives::Address;
    use chrono::Utc;
    use uuid::Uuid;

    fn wallet(byte: u8) -> WalletRecord {
        WalletRecord {
            id: Uuid::new_v4(),
            owner_id: "alice".to_string(),
            display_name: "hot".to_string(),
            address: Address::repeat_byte(byte),
            encrypted_key: "00:00:00".to_string(),
            network: "sepolia".to_string(),
            cached_balance: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_saver_writes_after_change_and_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let path = path.to_str().unwrap().to_string();

        let ledger = MemoryLedger::new(Some(path.clone()));
        let shutdown = Shutdown::new();
        let handle = spawn_snapshot_saver(ledger.clone(), Duration::from_millis(10), shutdown.clone());

        ledger.insert_wallet(wallet(1)).unwrap();
        let mut written = false;
        for _ in 0..200 {
            if !ledger.is_dirty() && std::path::Path::new(&path).exists() {
                written = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(written, "snapshot was not written after a change");

        // Changes made right before shutdown are still saved
        ledger.insert_wallet(wallet(2)).unwrap();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

        assert!(!ledger.is_dirty());
        let loaded = MemoryLedger::load_from_file(&path).unwrap();
        assert_eq!(loaded.list_wallets_for_owner("alice").await.unwrap().len(), 2);
    }
}
