//! Uniform response envelope for the OCR endpoint.
//!
//! Every request, success or failure, returns the same three-key shape:
//!
//! ```json
//! { "success": true,  "data": { "text": "..." }, "error": null }
//! { "success": false, "data": null, "error": { "code": 400, "message": "..." } }
//! ```
//!
//! `data` and `error` are mutually exclusive and always present (as null
//! when absent). `error.code` doubles as the HTTP status of the response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::SnaptextError;

/// Error payload inside the envelope. `code` mirrors the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: u16,
    /// Safe to display to end users. Validation failures carry their
    /// specific message; server-side failures carry a generic phrase only.
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,

    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: status.as_u16(),
                message: message.into(),
            }),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "success": false,
                    "data": null,
                    "error": { "code": 500, "message": "Internal Server Error" }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<SnaptextError> for ApiResponse<T> {
    /// Server-side error details are **never** leaked to the client; the
    /// real error is logged by the handler with its request context.
    fn from(err: SnaptextError) -> Self {
        let status = err.status();
        if err.is_client_error() {
            ApiResponse::error(status, err.to_string())
        } else {
            ApiResponse::error(status, "Internal Server Error")
        }
    }
}
