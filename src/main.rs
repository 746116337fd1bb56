//! EVM multi-wallet mass-send service.
//!
//! Imports EVM private keys (encrypted at rest), tracks balances across
//! configured networks, and drains selected wallets into one destination
//! through a REST API.
//!
//! # Startup Order
//! 1. Configuration (`--config` or `MULTISEND_CONFIG`, else defaults)
//! 2. Logging and metrics
//! 3. Key vault master key from the environment
//! 4. Network registry, RPC gateway, ledger (custom networks restored from it)
//! 5. Ledger snapshot saver
//! 6. HTTP listener, last

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use evm_multisend::blockchain::{ChainGateway, NetworkRegistry, RpcGateway};
use evm_multisend::config;
use evm_multisend::http::{AppState, HttpServer};
use evm_multisend::ledger::{spawn_snapshot_saver, MemoryLedger};
use evm_multisend::lifecycle::{signals, Shutdown};
use evm_multisend::observability::{logging, metrics};
use evm_multisend::vault::KeyVault;

#[derive(Parser)]
#[command(name = "evm-multisend")]
#[command(about = "EVM multi-wallet mass-send service", version)]
struct Args {
    /// Path to the TOML configuration file (falls back to `MULTISEND_CONFIG`).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "evm-multisend starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let vault = Arc::new(KeyVault::from_env(&config.vault.master_key_env)?);

    let registry = Arc::new(NetworkRegistry::from_config(&config.networks));
    tracing::info!(networks = registry.list().len(), "Network registry loaded");

    let gateway: Arc<dyn ChainGateway> = Arc::new(RpcGateway::new(registry.clone(), config.gateway.clone()));

    let ledger = match &config.ledger.persistence_path {
        Some(path) => MemoryLedger::load_from_file(path)?,
        None => {
            tracing::warn!("No ledger persistence path configured; history is lost on restart");
            MemoryLedger::new(None)
        }
    };

    let restored = registry.restore_custom(
        ledger
            .custom_networks()
            .into_iter()
            .map(|network| (network.id, network.config)),
    );
    if restored > 0 {
        tracing::info!(networks = restored, "Restored custom networks");
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let saver = spawn_snapshot_saver(
        ledger.clone(),
        Duration::from_millis(config.ledger.snapshot_debounce_ms),
        shutdown.clone(),
    );

    let state = AppState::new(&config, registry, gateway, vault, ledger.clone(), shutdown.clone());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.server.request_timeout_secs,
        "Listening for connections"
    );

    HttpServer::new(&config, state).run(listener, shutdown.clone()).await?;

    shutdown.trigger();
    if let Err(e) = saver.await {
        tracing::error!(error = %e, "Ledger snapshot saver panicked");
    }
    // Records settled by tasks that outlived the saver
    if let Err(e) = ledger.flush().await {
        tracing::error!(error = %e, "Failed to save ledger on shutdown");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
