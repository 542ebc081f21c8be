// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::media::MediaError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Record absent or owned by someone else. The two cases are reported
    /// identically so callers cannot detect other users' records.
    #[error("{0} not found or not authorized")]
    NotFoundOrUnauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    #[error("Create failed: {0}")]
    CreateFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Media store error: {0}")]
    Media(#[from] MediaError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NotFoundOrUnauthorized(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Media(_) => StatusCode::BAD_GATEWAY,
            AppError::UploadFailed(_)
            | AppError::CreateFailed(_)
            | AppError::DeleteFailed(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidInput(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::NotFoundOrUnauthorized(_) => self.to_string(),
            AppError::UploadFailed(msg) => {
                tracing::error!(error = %msg, "Image upload failed");
                "Error uploading trip images".to_string()
            }
            AppError::CreateFailed(msg) => {
                tracing::error!(error = %msg, "Trip creation failed");
                "Failed to create trip. Uploaded images were deleted.".to_string()
            }
            AppError::DeleteFailed(msg) => {
                tracing::error!(error = %msg, "Trip deletion failed");
                "Failed to delete trip.".to_string()
            }
            AppError::Media(err) => {
                tracing::error!(error = %err, "Media store error");
                "Media service unavailable".to_string()
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
