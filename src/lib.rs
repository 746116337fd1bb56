//! EVM multi-wallet mass-send service library.
//!
//! # Architecture Overview
//!
//! ```text
//!   REST client ──▶ http ──▶ wallets / transfer::single / mass_send
//!                                 │            │              │
//!                                 ▼            ▼              ▼
//!                               vault    transfer::executor  ledger
//!                                              │
//!                                              ▼
//!                         blockchain::gateway ──▶ client ──▶ EVM JSON-RPC
//!                                  ▲
//!                         blockchain::network (registry from config)
//! ```
//!
//! Cross-cutting: `config`, `observability`, `lifecycle`, `resilience`.

// Core subsystems
pub mod blockchain;
pub mod ledger;
pub mod mass_send;
pub mod transfer;
pub mod vault;
pub mod wallets;

// Surfaces
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use mass_send::MassSendOrchestrator;
