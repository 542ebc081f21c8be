// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Success envelope shared by all JSON endpoints.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// `{"success": true, "message": ..., "data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub type ApiResult<T> = crate::error::Result<(StatusCode, Json<ApiResponse<T>>)>;

/// 200 with a payload.
pub fn ok<T: Serialize>(message: &str, data: T) -> ApiResult<T> {
    respond(StatusCode::OK, message, Some(data))
}

/// 201 with the created payload.
pub fn created<T: Serialize>(message: &str, data: T) -> ApiResult<T> {
    respond(StatusCode::CREATED, message, Some(data))
}

/// 200 without a payload.
pub fn message(message: &str) -> ApiResult<()> {
    respond(StatusCode::OK, message, None)
}

fn respond<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> ApiResult<T> {
    Ok((
        status,
        Json(ApiResponse {
            success: true,
            message: message.to_string(),
            data,
        }),
    ))
}
