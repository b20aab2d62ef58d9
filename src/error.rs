use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Everything a route handler can fail with, mapped onto the HTTP surface.
/// Model failures never appear here: generation recovers them with a
/// template before the handler returns.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid website id: {0}")]
    InvalidId(String),
    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidId(id) => ApiError::InvalidId(id),
            StoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = match &self {
            // The fallback marker tells the caller it may retry assuming a
            // template-only response.
            ApiError::Internal(msg) => json!({
                "succeeded": false,
                "error": msg,
                "fallback": true,
            }),
            other => json!({
                "succeeded": false,
                "error": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_the_http_taxonomy() {
        let e: ApiError = StoreError::InvalidId("nope".into()).into();
        assert!(matches!(e, ApiError::InvalidId(_)));
        let e: ApiError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(e, ApiError::StoreUnavailable(_)));
    }
}
