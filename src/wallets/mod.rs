//! Wallet management for owners.

pub mod service;

pub use service::{BalanceRefresh, ImportWalletRequest, WalletError, WalletService, WalletView};
