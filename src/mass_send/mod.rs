//! Mass send: one destination, many source wallets.
//!
//! # Data Flow
//! ```text
//! MassSendRequest
//!     → orchestrator.rs (validate, create operation)
//!     → per wallet: balance → dust check → decrypt → fee → send amount
//!                   → BATCH_MEMBER record → TransferExecutor → settle
//!     → finalize operation → MassSendSummary
//! ```
//!
//! # Amount Policy
//! - Balance at or below `dust_threshold`: skipped as dust
//! - `send = balance - fee - safety_reserve`; zero or less: skipped as unsendable

pub mod orchestrator;
pub mod types;

pub use orchestrator::MassSendOrchestrator;
pub use types::{MassSendError, MassSendRequest, MassSendSummary, PerWalletResult, SkipReason, SkippedWallet};
