//! Native-token transfers.
//!
//! # Data Flow
//! ```text
//! destination string → address.rs (0x + 40 hex, EIP-55 when mixed case)
//!     → executor.rs (ChainGateway::submit_transfer, errors folded into outcomes)
//!     → single.rs (SINGLE ledger record around one execution)
//! ```

pub mod address;
pub mod executor;
pub mod single;

pub use address::{validate_address, AddressError};
pub use executor::{TransferExecutor, TransferOutcome};
pub use single::{SingleTransferError, SingleTransferRequest, SingleTransferService};
