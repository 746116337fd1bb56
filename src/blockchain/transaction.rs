//! Transfer building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build native transfers with nonce, gas price and gas limit from the chain
//! - Sign locally and broadcast the raw transaction
//! - Poll for the receipt with jittered exponential backoff until inclusion

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::blockchain::client::RpcClient;
use crate::blockchain::signer::TransferSigner;
use crate::blockchain::types::{ConfirmationStatus, GatewayError, GatewayResult, SubmittedTransfer};
use crate::config::GatewayConfig;
use crate::resilience::backoff::calculate_backoff;

/// Gas used by a plain value transfer to an externally owned account.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Gas price with the configured safety multiplier applied.
pub fn adjusted_gas_price(gas_price: u128, multiplier: f64) -> u128 {
    (gas_price as f64 * multiplier) as u128
}

/// Gas limit for a transfer: node estimate, or the plain-transfer constant.
pub async fn transfer_gas_limit(client: &RpcClient, from: Address, to: Address, value: U256) -> u64 {
    let probe = TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_value(value);

    match client.estimate_gas(probe).await {
        Ok(gas) => gas.max(NATIVE_TRANSFER_GAS),
        Err(e) => {
            tracing::debug!(error = %e, "Gas estimation unavailable, assuming plain transfer");
            NATIVE_TRANSFER_GAS
        }
    }
}

/// Builds, signs and tracks one transfer from one wallet.
pub struct TransferBuilder<'a> {
    client: &'a RpcClient,
    signer: TransferSigner,
    config: &'a GatewayConfig,
}

impl<'a> TransferBuilder<'a> {
    /// Create a new transfer builder.
    pub fn new(client: &'a RpcClient, signer: TransferSigner, config: &'a GatewayConfig) -> Self {
        Self {
            client,
            signer,
            config,
        }
    }

    /// Build a legacy transaction request with gas estimation.
    ///
    /// # Arguments
    /// * `to` - Destination address
    /// * `value` - Amount of native token to send, in wei
    pub async fn build(&self, to: Address, value: U256) -> GatewayResult<TransactionRequest> {
        let from = self.signer.address();

        // Pending nonce so a stuck earlier transfer is not replaced
        let nonce = self.client.get_transaction_count(from).await?;

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        // Check against max gas price
        if gas_price_gwei > self.config.max_gas_price_gwei as u128 {
            return Err(GatewayError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: self.config.max_gas_price_gwei,
            });
        }

        // Apply multiplier for safety margin
        let adjusted = adjusted_gas_price(gas_price, self.config.gas_price_multiplier);
        let gas_limit = transfer_gas_limit(self.client, from, to, value).await;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(adjusted)
            .with_chain_id(self.signer.chain_id())
            .with_gas_limit(gas_limit);

        Ok(tx)
    }

    /// Build, sign, broadcast and wait for inclusion.
    pub async fn send(&self, to: Address, value: U256) -> GatewayResult<SubmittedTransfer> {
        let tx = self.build(to, value).await?;
        let (_, encoded) = self.signer.sign(tx).await?;
        let tx_hash = self.client.send_raw_transaction(&encoded).await?;

        tracing::info!(
            network = %self.client.network(),
            from = %self.signer.address(),
            to = %to,
            tx_hash = %tx_hash,
            "Transfer broadcast"
        );

        self.wait_for_receipt(tx_hash).await
    }

    /// Wait for a transaction to reach the configured confirmation depth.
    ///
    /// Polls with exponential backoff between `poll_base_ms` and `poll_max_ms`
    /// until `confirmation_timeout_secs` elapses.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> GatewayResult<SubmittedTransfer> {
        let required = self.config.confirmation_blocks.max(1);
        let timeout_secs = self.config.confirmation_timeout_secs;
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let delay = calculate_backoff(attempt, self.config.poll_base_ms, self.config.poll_max_ms);
            if Instant::now() + delay > deadline {
                return Err(GatewayError::TransferTimeout { tx_hash, timeout_secs });
            }
            sleep(delay).await;

            // RPC hiccups while polling are not fatal; the deadline bounds us
            let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, attempt = attempt, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            let tip = match self.client.get_block_number().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                    continue;
                }
            };

            match confirmation_status(receipt.status(), receipt.block_number, tip, required) {
                ConfirmationStatus::Confirmed { block_number } => {
                    let fee_actual = U256::from(receipt.gas_used) * U256::from(receipt.effective_gas_price);
                    return Ok(SubmittedTransfer {
                        hash: tx_hash,
                        fee_actual,
                        block_number: Some(block_number),
                    });
                }
                ConfirmationStatus::Failed(reason) => {
                    return Err(GatewayError::TransferRejected(format!("{} ({})", reason, tx_hash)));
                }
                ConfirmationStatus::Confirming { current, required } => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        confirmations = current,
                        required = required,
                        "Waiting for confirmations"
                    );
                }
                ConfirmationStatus::Pending => {}
            }
        }
    }

    /// Get the sending address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Classify a receipt. The block containing the transaction counts as the
/// first confirmation.
pub fn confirmation_status(
    succeeded: bool,
    receipt_block: Option<u64>,
    tip: u64,
    required: u32,
) -> ConfirmationStatus {
    if !succeeded {
        return ConfirmationStatus::Failed("transaction reverted".to_string());
    }
    let Some(block_number) = receipt_block else {
        return ConfirmationStatus::Pending;
    };

    let confirmations = tip.saturating_sub(block_number).saturating_add(1) as u32;
    if confirmations >= required {
        ConfirmationStatus::Confirmed { block_number }
    } else {
        ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        }
    }
}
