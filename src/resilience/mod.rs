//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Receipt polling (blockchain::transaction):
//!     → backoff.rs (exponential delay with jitter, capped)
//! ```
//!
//! Per-call deadlines live in `blockchain::client`; endpoint failover there
//! takes the place of retries.

pub mod backoff;
