//! JSON envelope for `/health` and non-chat errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{ "success": true, "data": ... }` or `{ "success": false, "error": { code, message } }`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    /// Machine-readable, e.g. `BAD_REQUEST`.
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Error envelope rendered with `status`.
    pub fn failure(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
        let body = Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
