//! Raw private keys and address derivation.

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::vault::{VaultError, VaultResult};

/// Length of a secp256k1 private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// A decrypted private key, hex encoded without the `0x` prefix.
///
/// The buffer is wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RawKey(String);

impl RawKey {
    /// Validate and normalize a user-supplied hex key (with or without `0x`).
    pub fn parse(input: &str) -> VaultResult<Self> {
        let trimmed = input.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != PRIVATE_KEY_LEN * 2 {
            return Err(VaultError::InvalidKey(format!(
                "expected {} hex characters, got {}",
                PRIVATE_KEY_LEN * 2,
                hex_part.len()
            )));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VaultError::InvalidKey("key contains non-hex characters".to_string()));
        }

        Ok(Self(hex_part.to_ascii_lowercase()))
    }

    /// Hex form of the key, without prefix.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Build an alloy signer for this key.
    pub fn signer(&self) -> VaultResult<PrivateKeySigner> {
        let mut bytes = [0u8; PRIVATE_KEY_LEN];
        hex::decode_to_slice(&self.0, &mut bytes)
            .map_err(|e| VaultError::InvalidKey(e.to_string()))?;

        let signer = PrivateKeySigner::from_bytes(&B256::from(bytes))
            .map_err(|e| VaultError::InvalidKey(format!("not a valid secp256k1 scalar: {}", e)));
        bytes.zeroize();
        signer
    }

    /// Public address controlled by this key.
    pub fn address(&self) -> VaultResult<Address> {
        Ok(self.signer()?.address())
    }
}

impl std::fmt::Debug for RawKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawKey([REDACTED])")
    }
}

/// Derive the public address for a raw hex private key.
///
/// Fails with [`VaultError::InvalidKey`] unless the input is exactly 32 bytes
/// of hex, optionally `0x`-prefixed, and a valid secp256k1 scalar.
pub fn derive_address(raw_key: &str) -> VaultResult<Address> {
    RawKey::parse(raw_key)?.address()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil's first dev account. Publicly known, never holds real funds.
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_derive_address() {
        let address = derive_address(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(address.to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_derive_address_with_prefix() {
        let address = derive_address(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(address.to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_wrong_length_is_invalid() {
        let err = derive_address(&TEST_PRIVATE_KEY[..62]).unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey(_)));

        let err = derive_address(&format!("{}00", TEST_PRIVATE_KEY)).unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey(_)));
    }

    #[test]
    fn test_non_hex_is_invalid() {
        let bad = format!("zz{}", &TEST_PRIVATE_KEY[2..]);
        assert!(matches!(derive_address(&bad), Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_zero_scalar_is_invalid() {
        let zero = "0".repeat(64);
        assert!(matches!(derive_address(&zero), Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = RawKey::parse(TEST_PRIVATE_KEY).unwrap();
        let debug_str = format!("{:?}", key);
        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
