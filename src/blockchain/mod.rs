//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkRegistry (network id → RPC endpoints, chain id)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → signer.rs (local signing with a decrypted key)
//!     → transaction.rs (build, sign, broadcast, confirm)
//!     → gateway.rs (ChainGateway trait used by transfer logic)
//! ```
//!
//! # Security Constraints
//! - Keys arrive decrypted per transfer and are dropped right after signing
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when a node is unreachable

pub mod client;
pub mod gateway;
pub mod network;
pub mod signer;
pub mod transaction;
pub mod types;
pub mod units;

pub use client::RpcClient;
pub use gateway::{ChainGateway, RpcGateway};
pub use network::{NetworkRegistry, NetworkView, RegistryError};
pub use types::{ChainId, FeeEstimate, GatewayError, GatewayResult, SubmittedTransfer};
