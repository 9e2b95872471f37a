//! HTTP API types

use crate::error::{AppError, ErrorResponse};
use crate::models::DeltaMode;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard API response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }
}

/// Query parameters for `GET /api/oi/view`
///
/// Either parameter overrides the stored setting for this request only.
/// An empty `expiry` means "latest capture".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub mode: Option<DeltaMode>,
    pub expiry: Option<String>,
}

impl ViewQuery {
    pub fn is_default(&self) -> bool {
        self.mode.is_none() && self.expiry.is_none()
    }
}

/// Query parameters for the row-based endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
    pub expiry: Option<String>,
}

/// Error body sent to clients
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("API request failed: {}", self);
        }

        let ErrorResponse { code, message } = ErrorResponse::from(&self);
        let body = ErrorBody {
            status: "error",
            code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
