// Shared response envelopes for the booking API
// Every module error renders through `error_response` so clients see one error shape

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope: `{ "success": true, "data": ..., "message"?: ... }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Consistent error response structure
///
/// Carries a machine-readable `errorCode` next to the human-readable message
/// so the UI can render actionable feedback without parsing text.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,

    /// Machine-readable error code (e.g., "AVAILABILITY_CONFLICT", "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message, safe to show to the client
    pub message: String,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.to_string(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Build an error response with the given status, code and client-facing message
pub fn error_response(status: StatusCode, error_code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_missing_message() {
        let value = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn test_error_envelope_shape() {
        let value = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "Booking not found.")).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["errorCode"], "NOT_FOUND");
        assert_eq!(value["message"], "Booking not found.");
        assert!(value["timestamp"].is_string());
    }
}
