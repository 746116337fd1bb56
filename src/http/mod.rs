//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, body limit)
//!     → extract.rs (x-owner-id → OwnerId)
//!     → handlers.rs (wallets, transfers, mass sends, operations, networks)
//!     → error.rs (service errors → status + JSON body)
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use extract::{OwnerId, X_OWNER_ID};
pub use server::{build_router, AppState, HttpServer};
