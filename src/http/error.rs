//! API error type and status mapping.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::blockchain::RegistryError;
use crate::ledger::LedgerError;
use crate::mass_send::MassSendError;
use crate::transfer::SingleTransferError;
use crate::wallets::WalletError;

/// An error returned to API clients as `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OperationNotFound(_) | LedgerError::TransferNotFound(_) | LedgerError::WalletNotFound(_) => {
                Self::not_found(e.to_string())
            }
            LedgerError::DuplicateWallet { .. } => Self::conflict(e.to_string()),
            _ => Self::internal(e.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DuplicateNetwork(_) => Self::conflict(e.to_string()),
            RegistryError::InvalidNetwork(_) | RegistryError::UnsupportedAsset(_) => Self::bad_request(e.to_string()),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::InvalidKey(_) | WalletError::UnsupportedNetwork(_) => Self::bad_request(e.to_string()),
            WalletError::DuplicateWallet { .. } => Self::conflict(e.to_string()),
            WalletError::NotFound(_) => Self::not_found(e.to_string()),
            WalletError::Vault(_) => Self::internal(e.to_string()),
            WalletError::Ledger(inner) => inner.into(),
        }
    }
}

impl From<SingleTransferError> for ApiError {
    fn from(e: SingleTransferError) -> Self {
        match e {
            SingleTransferError::InvalidAddress(_) | SingleTransferError::InvalidAmount(_) => {
                Self::bad_request(e.to_string())
            }
            SingleTransferError::WalletNotFound(_) => Self::not_found(e.to_string()),
            SingleTransferError::Vault(_) | SingleTransferError::AddressMismatch(_) => Self::internal(e.to_string()),
            SingleTransferError::Ledger(inner) => inner.into(),
        }
    }
}

impl From<MassSendError> for ApiError {
    fn from(e: MassSendError) -> Self {
        match e {
            MassSendError::NoWalletsSelected | MassSendError::InvalidAddress(_) | MassSendError::UnsupportedAsset(_) => {
                Self::bad_request(e.to_string())
            }
            MassSendError::Ledger(inner) => inner.into(),
        }
    }
}
