//! API error responses

use crate::orchestrator::RequestError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors returned by API handlers as `{error, code}` JSON
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Request(RequestError::InvalidRequest(_)) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
            }
            Self::Request(RequestError::ServiceUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Store(StoreError::UnsupportedFormat(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
            }
            Self::Store(StoreError::Serialization(_) | StoreError::Io(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_FAILED")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("API error: {}", self);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": code,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(RequestError::invalid("x")), StatusCode::BAD_REQUEST),
            (
                ApiError::from(RequestError::ServiceUnavailable),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(StoreError::NotFound("q".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(StoreError::UnsupportedFormat("xml".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
