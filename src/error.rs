//! Error types for the fleet server

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidFields(errors) => (
                StatusCode::BAD_REQUEST,
                "Invalid input".to_string(),
                serde_json::to_value(&errors).ok(),
            ),
            AppError::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                Some(json!({ "body": msg })),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::InvalidBody(e.body_text()),
            JsonRejection::JsonSyntaxError(e) => AppError::InvalidBody(e.body_text()),
            JsonRejection::MissingJsonContentType(_) => AppError::Validation(
                "Request must include 'Content-Type: application/json' header".to_string(),
            ),
            other => AppError::Validation(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
