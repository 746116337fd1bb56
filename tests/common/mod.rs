//! Shared fixtures for integration tests: a scripted chain gateway, a ledger
//! with injectable failures, and a harness wiring them into the orchestrator.

#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use evm_multisend::blockchain::units::parse_native;
use evm_multisend::blockchain::{ChainGateway, FeeEstimate, GatewayError, GatewayResult, NetworkRegistry, SubmittedTransfer};
use evm_multisend::config::{MassSendConfig, NetworkConfig};
use evm_multisend::ledger::{
    LedgerError, LedgerResult, MassSendOperation, MemoryLedger, NewOperation, NewTransferRecord,
    OperationFinalization, OperationLedger, TransferRecord, TransferSettlement, WalletRecord,
};
use evm_multisend::lifecycle::Shutdown;
use evm_multisend::mass_send::MassSendOrchestrator;
use evm_multisend::vault::{derive_address, KeyVault};

pub const MASTER_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Anvil development keys.
pub const KEYS: [&str; 4] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
];

pub const DESTINATION: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

pub const OWNER: &str = "alice";

/// Parse a native-unit amount, e.g. `native("0.5")`.
pub fn native(amount: &str) -> U256 {
    parse_native(amount).unwrap()
}

pub fn address_of(key: &str) -> Address {
    derive_address(key).unwrap()
}

pub fn registry() -> NetworkRegistry {
    NetworkRegistry::with_networks(vec![
        (
            "sepolia".to_string(),
            NetworkConfig::new("http://127.0.0.1:1", 11155111, "SepoliaETH", true),
        ),
        (
            "amoy".to_string(),
            NetworkConfig::new("http://127.0.0.1:1", 80002, "AmoyPOL", true),
        ),
    ])
}

/// Scripted [`ChainGateway`] that counts every call.
#[derive(Default)]
pub struct MockGateway {
    balances: Mutex<HashMap<Address, U256>>,
    balance_failures: Mutex<HashSet<Address>>,
    submit_failures: Mutex<HashSet<Address>>,
    fee: Mutex<U256>,
    fee_actual: Mutex<U256>,
    abort_on_submit: Mutex<Option<Shutdown>>,
    fallback_fee: Mutex<Option<U256>>,
    hold: Mutex<Option<Arc<Notify>>>,
    pub submitted: Mutex<Vec<(Address, Address, U256)>>,
    pub balance_calls: AtomicUsize,
    pub fee_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(fee: U256) -> Self {
        let gateway = Self::default();
        *gateway.fee.lock().unwrap() = fee;
        *gateway.fee_actual.lock().unwrap() = fee;
        gateway
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.lock().unwrap().insert(address, balance);
    }

    pub fn fail_balance(&self, address: Address) {
        self.balance_failures.lock().unwrap().insert(address);
    }

    pub fn reject_from(&self, address: Address) {
        self.submit_failures.lock().unwrap().insert(address);
    }

    /// Trigger `shutdown` during the next submission.
    pub fn abort_on_submit(&self, shutdown: Shutdown) {
        *self.abort_on_submit.lock().unwrap() = Some(shutdown);
    }

    /// Answer fee estimates with a fallback fee, as when gas pricing is unavailable.
    pub fn use_fallback_fee(&self, fee: U256) {
        *self.fallback_fee.lock().unwrap() = Some(fee);
    }

    /// Park every submission until the returned handle is notified.
    pub fn hold_submissions(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(release.clone());
        release
    }

    pub fn total_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
            + self.fee_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn get_balance(&self, _network: &str, address: Address) -> GatewayResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.balance_failures.lock().unwrap().contains(&address) {
            return Err(GatewayError::Network("all 1 RPC endpoint(s) failed".to_string()));
        }
        Ok(self.balances.lock().unwrap().get(&address).copied().unwrap_or_default())
    }

    async fn estimate_fee(&self, _network: &str, _from: Address, _to: Address, _amount: U256) -> GatewayResult<FeeEstimate> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fee) = *self.fallback_fee.lock().unwrap() {
            return Ok(FeeEstimate::fallback(fee));
        }
        Ok(FeeEstimate::market(*self.fee.lock().unwrap()))
    }

    async fn submit_transfer(
        &self,
        _network: &str,
        key: &evm_multisend::vault::RawKey,
        to: Address,
        amount: U256,
    ) -> GatewayResult<SubmittedTransfer> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.hold.lock().unwrap().clone();
        if let Some(release) = hold {
            release.notified().await;
        }
        if let Some(shutdown) = self.abort_on_submit.lock().unwrap().take() {
            shutdown.trigger();
        }

        let from = key.address().map_err(|e| GatewayError::Signing(e.to_string()))?;
        if self.submit_failures.lock().unwrap().contains(&from) {
            return Err(GatewayError::TransferRejected("insufficient funds for gas * price + value".to_string()));
        }

        self.submitted.lock().unwrap().push((from, to, amount));
        Ok(SubmittedTransfer {
            hash: TxHash::with_last_byte(n as u8 + 1),
            fee_actual: *self.fee_actual.lock().unwrap(),
            block_number: Some(100 + n as u64),
        })
    }
}

/// [`MemoryLedger`] wrapper with switchable write failures.
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub fail_create_operation: AtomicBool,
    pub fail_update_operation: AtomicBool,
    pub fail_create_transfer: AtomicBool,
    pub fail_update_transfer: AtomicBool,
}

fn unavailable(flag: &AtomicBool) -> LedgerResult<()> {
    if flag.load(Ordering::SeqCst) {
        Err(LedgerError::Unavailable("injected failure".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl OperationLedger for FlakyLedger {
    async fn create_operation(&self, new: NewOperation) -> LedgerResult<MassSendOperation> {
        unavailable(&self.fail_create_operation)?;
        self.inner.create_operation(new).await
    }

    async fn update_operation(&self, id: Uuid, finalization: OperationFinalization) -> LedgerResult<MassSendOperation> {
        unavailable(&self.fail_update_operation)?;
        self.inner.update_operation(id, finalization).await
    }

    async fn get_operation(&self, id: Uuid) -> LedgerResult<Option<MassSendOperation>> {
        self.inner.get_operation(id).await
    }

    async fn create_transfer_record(&self, new: NewTransferRecord) -> LedgerResult<TransferRecord> {
        unavailable(&self.fail_create_transfer)?;
        self.inner.create_transfer_record(new).await
    }

    async fn update_transfer_record(&self, id: Uuid, settlement: TransferSettlement) -> LedgerResult<TransferRecord> {
        unavailable(&self.fail_update_transfer)?;
        self.inner.update_transfer_record(id, settlement).await
    }

    async fn list_transfer_records(&self, operation_id: Uuid) -> LedgerResult<Vec<TransferRecord>> {
        self.inner.list_transfer_records(operation_id).await
    }

    async fn list_wallets_for_owner(&self, owner_id: &str) -> LedgerResult<Vec<WalletRecord>> {
        self.inner.list_wallets_for_owner(owner_id).await
    }
}

/// Orchestrator wired to a [`MockGateway`] and a [`FlakyLedger`].
pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub ledger: Arc<FlakyLedger>,
    pub vault: Arc<KeyVault>,
    pub shutdown: Shutdown,
    pub orchestrator: MassSendOrchestrator,
}

impl Harness {
    /// Fee 0.002, dust threshold and safety reserve 0.001.
    pub fn new() -> Self {
        Self::with_fee(native("0.002"))
    }

    pub fn with_fee(fee: U256) -> Self {
        let gateway = Arc::new(MockGateway::new(fee));
        let ledger = Arc::new(FlakyLedger::default());
        let vault = Arc::new(KeyVault::from_hex(MASTER_KEY).unwrap());
        let shutdown = Shutdown::new();
        let orchestrator = MassSendOrchestrator::new(
            gateway.clone(),
            ledger.clone(),
            vault.clone(),
            Arc::new(registry()),
            MassSendConfig::default(),
            shutdown.clone(),
        );
        Self {
            gateway,
            ledger,
            vault,
            shutdown,
            orchestrator,
        }
    }

    /// Store a wallet for `owner` and give it a live balance.
    pub fn wallet(&self, owner: &str, key: &str, network: &str, balance: &str) -> Uuid {
        let address = address_of(key);
        let encrypted_key = self.vault.encrypt(key).unwrap();
        self.gateway.set_balance(address, native(balance));
        self.store(owner, address, encrypted_key, network)
    }

    /// Store a wallet whose ciphertext fails authentication.
    pub fn corrupt_wallet(&self, owner: &str, key: &str, balance: &str) -> Uuid {
        let address = address_of(key);
        let encrypted_key = self.vault.encrypt(key).unwrap();
        let (head, last) = encrypted_key.split_at(encrypted_key.len() - 1);
        let flipped = if last == "0" { "1" } else { "0" };
        self.gateway.set_balance(address, native(balance));
        self.store(owner, address, format!("{}{}", head, flipped), "sepolia")
    }

    /// Store a wallet whose key decrypts to a different address.
    pub fn mismatched_wallet(&self, owner: &str, key: &str, claimed: Address, balance: &str) -> Uuid {
        let encrypted_key = self.vault.encrypt(key).unwrap();
        self.gateway.set_balance(claimed, native(balance));
        self.store(owner, claimed, encrypted_key, "sepolia")
    }

    fn store(&self, owner: &str, address: Address, encrypted_key: String, network: &str) -> Uuid {
        self.ledger
            .inner
            .insert_wallet(WalletRecord {
                id: Uuid::new_v4(),
                owner_id: owner.to_string(),
                display_name: format!("wallet {}", address),
                address,
                encrypted_key,
                network: network.to_string(),
                cached_balance: None,
                created_at: Utc::now(),
            })
            .unwrap()
            .id
    }
}
