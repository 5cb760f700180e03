//! API Error Types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use price_model::ModelError;
use serde_json::json;
use thiserror::Error;

/// Errors a handler can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    /// No model was found at startup
    #[error("Model is not loaded.")]
    ModelNotLoaded,

    /// The request body or its values could not be turned into a prediction
    #[error("Error processing input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidInput(_) | ModelError::NonFinitePrediction(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let detail = match &self {
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
