//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use crate::recommender::RecommendError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or revoked credentials
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Bad request with a structured detail
    #[error("{0}")]
    Rejected(Value),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::ProfileNotFound => ApiError::NotFound(err.to_string()),
            RecommendError::Upstream { status, body } => ApiError::Rejected(json!({
                "message": "AI service error",
                "upstream_status": status,
                "upstream": body,
            })),
            RecommendError::Store(e) => {
                error!("Failed to load recommendation inputs: {:#}", e);
                ApiError::InternalServerError
            }
            RecommendError::MissingFields(_)
            | RecommendError::NoItems
            | RecommendError::Unreachable(_)
            | RecommendError::MalformedResponse(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Log an unexpected failure and hide it behind a 500
pub fn internal<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> ApiError {
    move |e| {
        error!("{}: {}", context, e);
        ApiError::InternalServerError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match self {
            ApiError::Rejected(value) => value,
            other => Value::String(other.to_string()),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_recommend_errors_map_to_status() {
        let (status, value) = body(RecommendError::ProfileNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["detail"], "Client profile not found.");

        let (status, value) = body(RecommendError::NoItems.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            value["detail"],
            "No wardrobe items available for recommendation."
        );

        let (status, _) = body(RecommendError::Unreachable("timed out".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_error_detail_is_structured() {
        let err = RecommendError::Upstream {
            status: 503,
            body: json!({"detail": "overloaded"}),
        };
        let (status, value) = body(err.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["detail"]["message"], "AI service error");
        assert_eq!(value["detail"]["upstream_status"], 503);
        assert_eq!(value["detail"]["upstream"]["detail"], "overloaded");
    }

    #[tokio::test]
    async fn test_store_failure_is_hidden() {
        let err = RecommendError::Store(anyhow::anyhow!("connection reset"));
        let (status, value) = body(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["detail"], "Internal server error");
    }
}
