//! Symmetric encryption of private keys at rest.
//!
//! ## Format
//!
//! `hex(iv):hex(authTag):hex(ciphertext)` where
//! - **iv**: 12 random bytes per encryption (standard for AES-GCM)
//! - **authTag**: the 16-byte GCM tag
//! - **ciphertext**: AES-256-GCM encryption of the normalized hex key
//!
//! Encrypting the same key twice yields different strings; both decrypt to the
//! same [`RawKey`].

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::vault::keys::RawKey;
use crate::vault::{VaultError, VaultResult};

/// Size of the master key in bytes (256 bits for AES-256).
pub const MASTER_KEY_SIZE: usize = 32;

/// Size of the nonce for AES-GCM.
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag for AES-GCM.
pub const TAG_SIZE: usize = 16;

/// Default environment variable holding the hex master key.
pub const MASTER_KEY_ENV_VAR: &str = "MULTISEND_ENCRYPTION_KEY";

#[derive(Zeroize, ZeroizeOnDrop)]
struct MasterKey([u8; MASTER_KEY_SIZE]);

/// Encrypts and decrypts wallet keys with a single AES-256 master key.
pub struct KeyVault {
    master: MasterKey,
}

impl KeyVault {
    /// Create a vault from raw master key bytes.
    pub fn new(master_key: [u8; MASTER_KEY_SIZE]) -> Self {
        Self {
            master: MasterKey(master_key),
        }
    }

    /// Create a vault from a 64-character hex master key (optional `0x`).
    pub fn from_hex(master_hex: &str) -> VaultResult<Self> {
        let trimmed = master_hex.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let mut bytes = [0u8; MASTER_KEY_SIZE];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|e| {
            VaultError::MasterKey(format!(
                "expected {} bytes of hex: {}",
                MASTER_KEY_SIZE, e
            ))
        })?;

        let vault = Self::new(bytes);
        bytes.zeroize();
        Ok(vault)
    }

    /// Load the master key from the named environment variable.
    pub fn from_env(var_name: &str) -> VaultResult<Self> {
        let mut value = std::env::var(var_name).map_err(|_| {
            VaultError::MasterKey(format!("environment variable {} not set", var_name))
        })?;

        let vault = Self::from_hex(&value);
        value.zeroize();
        vault
    }

    fn cipher(&self) -> VaultResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.master.0).map_err(|e| VaultError::Crypto(e.to_string()))
    }

    /// Encrypt a raw private key into the `iv:authTag:ciphertext` format.
    ///
    /// The key is validated and normalized first, so malformed input fails with
    /// [`VaultError::InvalidKey`] rather than being stored.
    pub fn encrypt(&self, raw_key: &str) -> VaultResult<String> {
        let key = RawKey::parse(raw_key)?;
        self.encrypt_key(&key)
    }

    /// Encrypt an already-validated key.
    pub fn encrypt_key(&self, key: &RawKey) -> VaultResult<String> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let sealed = self
            .cipher()?
            .encrypt(Nonce::from_slice(&iv), key.expose().as_bytes())
            .map_err(|e| VaultError::Crypto(e.to_string()))?;

        // aes-gcm appends the tag to the ciphertext
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(iv),
            hex::encode(tag),
            hex::encode(ciphertext)
        ))
    }

    /// Decrypt an `iv:authTag:ciphertext` string back into the raw key.
    ///
    /// Any malformed segment, wrong length, or tag mismatch is a
    /// [`VaultError::Crypto`]; no partial plaintext is ever returned.
    pub fn decrypt(&self, encrypted: &str) -> VaultResult<RawKey> {
        let mut parts = encrypted.trim().split(':');
        let (iv_hex, tag_hex, ct_hex) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(iv), Some(tag), Some(ct), None) => (iv, tag, ct),
            _ => {
                return Err(VaultError::Crypto(
                    "expected format iv:authTag:ciphertext".to_string(),
                ))
            }
        };

        let iv = decode_segment("iv", iv_hex)?;
        let tag = decode_segment("authTag", tag_hex)?;
        let ciphertext = decode_segment("ciphertext", ct_hex)?;

        if iv.len() != IV_SIZE {
            return Err(VaultError::Crypto(format!(
                "iv must be {} bytes, got {}",
                IV_SIZE,
                iv.len()
            )));
        }
        if tag.len() != TAG_SIZE {
            return Err(VaultError::Crypto(format!(
                "authTag must be {} bytes, got {}",
                TAG_SIZE,
                tag.len()
            )));
        }

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let mut plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
            .map_err(|_| VaultError::Crypto("authentication tag mismatch".to_string()))?;

        let parsed = std::str::from_utf8(&plaintext)
            .map_err(|_| VaultError::Crypto("decrypted key is not valid UTF-8".to_string()))
            .and_then(|s| {
                RawKey::parse(s).map_err(|_| {
                    VaultError::Crypto("decrypted payload is not a private key".to_string())
                })
            });
        plaintext.zeroize();
        parsed
    }
}

fn decode_segment(name: &str, value: &str) -> VaultResult<Vec<u8>> {
    if value.is_empty() {
        return Err(VaultError::Crypto(format!("{} segment is empty", name)));
    }
    hex::decode(value).map_err(|e| VaultError::Crypto(format!("{} is not valid hex: {}", name, e)))
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault")
            .field("master", &"[REDACTED]")
            .finish()
    }
}
