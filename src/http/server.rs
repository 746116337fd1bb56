//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve on a listener until shutdown is triggered

use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::{ChainGateway, NetworkRegistry};
use crate::config::AppConfig;
use crate::http::handlers;
use crate::ledger::{MemoryLedger, OperationLedger};
use crate::lifecycle::Shutdown;
use crate::mass_send::MassSendOrchestrator;
use crate::observability::metrics;
use crate::transfer::{SingleTransferService, TransferExecutor};
use crate::vault::KeyVault;
use crate::wallets::WalletService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NetworkRegistry>,
    pub ledger: MemoryLedger,
    pub wallets: Arc<WalletService>,
    pub transfers: Arc<SingleTransferService>,
    pub orchestrator: Arc<MassSendOrchestrator>,
}

impl AppState {
    /// Wire the services over shared infrastructure.
    pub fn new(
        config: &AppConfig,
        registry: Arc<NetworkRegistry>,
        gateway: Arc<dyn ChainGateway>,
        vault: Arc<KeyVault>,
        ledger: MemoryLedger,
        shutdown: Shutdown,
    ) -> Self {
        let shared_ledger: Arc<dyn OperationLedger> = Arc::new(ledger.clone());

        let wallets = WalletService::new(ledger.clone(), vault.clone(), gateway.clone(), registry.clone());
        let transfers = SingleTransferService::new(
            shared_ledger.clone(),
            vault.clone(),
            TransferExecutor::new(gateway.clone()),
        );
        let orchestrator = MassSendOrchestrator::new(
            gateway,
            shared_ledger,
            vault,
            registry.clone(),
            config.mass_send.clone(),
            shutdown,
        );

        Self {
            registry,
            ledger,
            wallets: Arc::new(wallets),
            transfers: Arc::new(transfers),
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// HTTP server for the multisend API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::get_status))
        .route("/networks", get(handlers::list_networks).post(handlers::register_network))
        .route("/wallets", get(handlers::list_wallets).post(handlers::import_wallet))
        .route("/wallets/refresh", post(handlers::refresh_balances))
        .route("/wallets/{id}", delete(handlers::delete_wallet))
        .route("/transfers", get(handlers::list_transfers).post(handlers::send_transfer))
        .route("/mass-send", post(handlers::mass_send))
        .route("/operations/{id}", get(handlers::get_operation))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.server.request_timeout_secs),
                )),
        )
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_http_request(&route, response.status().as_u16());
    response
}
