//! Transaction signing with a decrypted wallet key.
//!
//! # Security
//! - Signers are built per transfer from a [`RawKey`] and dropped afterwards
//! - Keys are never logged or serialized

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{GatewayError, GatewayResult};
use crate::vault::RawKey;

/// Signs transactions for one wallet on one chain.
pub struct TransferSigner {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl TransferSigner {
    /// Create a signer from a decrypted key.
    pub fn new(key: &RawKey, chain_id: u64) -> GatewayResult<Self> {
        let signer = key
            .signer()
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        Ok(Self { signer, chain_id })
    }

    /// Get the signer's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this signer is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a fully populated transaction request.
    ///
    /// Returns the signed envelope and its EIP-2718 encoding for broadcast.
    pub async fn sign(&self, tx: TransactionRequest) -> GatewayResult<(TxEnvelope, Vec<u8>)> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = tx
            .build(&wallet)
            .await
            .map_err(|e| GatewayError::Signing(format!("transaction signing failed: {}", e)))?;
        let encoded = envelope.encoded_2718();
        Ok((envelope, encoded))
    }
}

impl std::fmt::Debug for TransferSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferSigner")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_signer() -> TransferSigner {
        TransferSigner::new(&RawKey::parse(TEST_PRIVATE_KEY).unwrap(), 31337).unwrap()
    }

    #[test]
    fn test_signer_address() {
        let signer = test_signer();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(signer.chain_id(), 31337);
    }

    #[tokio::test]
    async fn test_sign_legacy_transfer() {
        let signer = test_signer();
        let tx = TransactionRequest::default()
            .with_from(signer.address())
            .with_to(Address::repeat_byte(0x11))
            .with_value(U256::from(1_000u64))
            .with_nonce(0)
            .with_gas_price(1_000_000_000)
            .with_gas_limit(21_000)
            .with_chain_id(31337);

        let (envelope, encoded) = signer.sign(tx).await.unwrap();
        assert!(envelope.is_legacy());
        assert!(!encoded.is_empty());
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug_str = format!("{:?}", test_signer());
        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
