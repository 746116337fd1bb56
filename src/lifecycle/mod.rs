//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     HTTP server stops accepting → running mass sends skip remaining wallets
//!     → ledger snapshot → exit
//! ```
//!
//! # Design Decisions
//! - A transfer already submitted is always waited for; only unstarted wallets are skipped
//! - Shutdown state is latched so checks after the signal still see it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
