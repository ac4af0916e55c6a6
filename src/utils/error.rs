//! Error handling module
//!
//! Defines error types and handling logic used in the project

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed request parameters
    #[error("Request validation failed: {0}")]
    Validation(String),

    /// Unknown service, city or other resource
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upstream service returned an error or an unusable body
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Upstream service did not answer in time
    #[error("Upstream service timed out: {0}")]
    UpstreamTimeout(String),

    /// Persistence error (counter or user files)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error body returned to HTTP callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::HttpClient(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_request_error",
            AppError::NotFound(_) => "not_found_error",
            AppError::Upstream(_) | AppError::HttpClient(_) => "upstream_error",
            AppError::UpstreamTimeout(_) => "timeout_error",
            AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => "api_error",
        }
    }

    /// Whether this is the caller's fault rather than ours or an upstream's
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to the JSON error body
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: ErrorDetail {
                error_type: self.error_type().to_string(),
                message: self.to_string(),
            },
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_client_error() {
            tracing::warn!("Client error: {} - Status code: {}", self, status);
        } else {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add storage error context
    fn storage_context(self, message: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn storage_context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Storage(format!("{}: {}", message, e)))
    }
}

/// Map a reqwest failure from a named upstream into the matching variant
pub fn from_upstream(service: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::UpstreamTimeout(service.to_string())
    } else {
        AppError::Upstream(format!("{}: {}", service, err))
    }
}
