//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::error::ApiError;

/// Header set by the upstream auth layer with the caller's identity.
pub const X_OWNER_ID: &str = "x-owner-id";

const MAX_OWNER_ID_LEN: usize = 128;

/// The authenticated owner of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(X_OWNER_ID)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() {
            return Err(ApiError::unauthorized(format!("missing {} header", X_OWNER_ID)));
        }
        if value.len() > MAX_OWNER_ID_LEN {
            return Err(ApiError::unauthorized(format!("{} header is too long", X_OWNER_ID)));
        }
        Ok(OwnerId(value.to_string()))
    }
}
