use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mi_coach_core::error::{self, ApiError};

use crate::agent::cache::ConfigurationError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Unknown route (404)
    NotFound { path: String },
    /// Database error (500)
    Database(sqlx::Error),
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    fn internal(request_id: String) -> (StatusCode, ApiError) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError {
                error: error::codes::INTERNAL_ERROR.to_string(),
                message: "An internal error occurred".to_string(),
                field: None,
                received: None,
                request_id,
                docs_hint: None,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { path } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("No route for {path}"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: Some("See /swagger-ui for the available endpoints.".to_string()),
                },
            ),
            AppError::Database(err) => {
                tracing::error!(error = ?err, %request_id, "database error");
                Self::internal(request_id)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, %request_id, "internal error");
                Self::internal(request_id)
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(err: ConfigurationError) -> Self {
        AppError::Internal(err.to_string())
    }
}
