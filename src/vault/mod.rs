//! Private-key custody at rest.
//!
//! # Data Flow
//! ```text
//! import:   raw hex key → keys.rs (validate, derive address)
//!                       → cipher.rs (AES-256-GCM) → "iv:authTag:ciphertext"
//! transfer: "iv:authTag:ciphertext" → cipher.rs → RawKey (zeroized on drop)
//!                       → keys.rs (signer) → blockchain::gateway
//! ```
//!
//! # Security Constraints
//! - The master key comes from an environment variable, never from config files
//! - Raw keys and the master key are zeroized on drop
//! - `Debug` output never contains key material
//! - No shared mutable state: the vault is safe to use from any task

pub mod cipher;
pub mod keys;

use thiserror::Error;

pub use cipher::KeyVault;
pub use keys::{derive_address, RawKey};

/// Errors raised while handling key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Encryption or decryption failed (tag mismatch, malformed ciphertext).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The supplied private key is not 32 bytes of valid hex.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The vault master key is missing or malformed.
    #[error("master key error: {0}")]
    MasterKey(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
