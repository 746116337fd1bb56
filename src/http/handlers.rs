//! Route handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::NetworkConfig;
use crate::http::error::ApiError;
use crate::http::extract::OwnerId;
use crate::http::server::AppState;
use crate::ledger::{CustomNetworkRecord, MassSendOperation, OperationLedger, TransferRecord};
use crate::mass_send::MassSendRequest;
use crate::transfer::SingleTransferRequest;
use crate::wallets::ImportWalletRequest;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNetworkRequest {
    pub id: String,
    #[serde(flatten)]
    pub config: NetworkConfig,
}

#[derive(Serialize)]
pub struct OperationDetails {
    #[serde(flatten)]
    pub operation: MassSendOperation,
    pub transfers: Vec<TransferRecord>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

pub async fn list_networks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list())
}

/// Register a custom network. Networks are shared by the whole deployment;
/// the caller is recorded as the one who added it.
pub async fn register_network(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<RegisterNetworkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let view = state.registry.register_custom(&request.id, request.config.clone())?;
    state.ledger.insert_custom_network(CustomNetworkRecord {
        id: view.id.clone(),
        config: request.config,
        registered_by: owner.0,
        created_at: Utc::now(),
    });
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_wallets(State(state): State<AppState>, owner: OwnerId) -> Result<impl IntoResponse, ApiError> {
    let wallets = state.wallets.list_wallets(owner.as_str()).await?;
    Ok(Json(wallets))
}

pub async fn import_wallet(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<ImportWalletRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let wallet = state.wallets.import_wallet(owner.as_str(), request).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn delete_wallet(
    State(state): State<AppState>,
    owner: OwnerId,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.wallets.delete_wallet(owner.as_str(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_balances(State(state): State<AppState>, owner: OwnerId) -> Result<impl IntoResponse, ApiError> {
    let refreshed = state.wallets.refresh_balances(owner.as_str()).await?;
    Ok(Json(refreshed))
}

/// Send one transfer. Runs in its own task, like a mass send, so the
/// record is always settled even if the client goes away.
pub async fn send_transfer(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<SingleTransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let transfers = state.transfers.clone();
    let owner_id = owner.0;
    let record = tokio::spawn(async move { transfers.send(&owner_id, request).await })
        .await
        .map_err(|e| ApiError::internal(format!("transfer task failed: {}", e)))??;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_transfers(State(state): State<AppState>, owner: OwnerId) -> impl IntoResponse {
    Json(state.ledger.transfers_for_owner(owner.as_str()))
}

/// Run a mass send to completion.
///
/// The batch runs in its own task so a client disconnect cannot stop it
/// between a submission and its ledger settlement.
pub async fn mass_send(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<MassSendRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let orchestrator = state.orchestrator.clone();
    let owner_id = owner.0;

    let summary = tokio::spawn(async move { orchestrator.run(&owner_id, request).await })
        .await
        .map_err(|e| ApiError::internal(format!("mass send task failed: {}", e)))??;

    Ok(Json(summary))
}

pub async fn get_operation(
    State(state): State<AppState>,
    owner: OwnerId,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let operation = state
        .ledger
        .get_operation(id)
        .await?
        .filter(|op| op.owner_id == owner.as_str())
        .ok_or_else(|| ApiError::not_found(format!("operation {} not found", id)))?;
    let transfers = state.ledger.list_transfer_records(id).await?;

    Ok(Json(OperationDetails { operation, transfers }))
}
