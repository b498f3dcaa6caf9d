//! Shared API error body
//!
//! Every error enum exposed over HTTP renders through [`ApiError`], so clients
//! always see `{"error": ..., "code": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }

    /// Render with the given status
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Body used for 500 responses; internal details only go to the log
pub fn internal_error(context: &str, detail: &str) -> Response {
    tracing::error!(error = %detail, "{}", context);
    ApiError::new("Internal server error", "INTERNAL_ERROR")
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("Something went wrong", "ERROR_CODE");
        let json = serde_json::to_string(&error).unwrap();

        assert_eq!(json, r#"{"error":"Something went wrong","code":"ERROR_CODE"}"#);
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = internal_error("store failed", "connection refused on 10.0.0.5");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
