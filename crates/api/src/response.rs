//! Shared response envelope for API handlers.
//!
//! Every `/api/v1` response, success or error, is
//! `{ "code": <http status>, "message": ..., "data": ..., "success": ... }`.
//! Use [`ApiResponse`] instead of ad-hoc `serde_json::json!` bodies.

use axum::http::StatusCode;
use serde::Serialize;

/// Message used when a handler has nothing more specific to say.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "success";

/// Standard response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(ApiResponse::ok(task)))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Mirrors the HTTP status code.
    pub code: u16,
    pub message: String,
    pub data: T,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self::with_message(data, DEFAULT_SUCCESS_MESSAGE)
    }

    /// `200 OK` envelope with a custom message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
            success: true,
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope with `data: null`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: (),
            success: false,
        }
    }
}
