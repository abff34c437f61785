use crate::services::credentials::AuthError;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Per-request failures, rendered as `{error, details}` JSON.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(#[from] AuthError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(err: validator::ValidationErrors) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

impl GatewayError {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation_error",
            GatewayError::UpstreamAuth(_) => "auth_error",
            GatewayError::Provider(_) => "provider_error",
            GatewayError::SessionNotFound(_) => "not_found",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            GatewayError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            GatewayError::UpstreamAuth(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get access token".to_string(),
                Some(Value::String(err.to_string())),
            ),
            GatewayError::Provider(ProviderError::Status { status, body }) => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "Search provider request failed".to_string(),
                Some(body),
            ),
            GatewayError::Provider(ProviderError::NetworkError(msg)) => (
                StatusCode::BAD_GATEWAY,
                "Failed to reach search provider".to_string(),
                Some(Value::String(msg)),
            ),
            GatewayError::Provider(ProviderError::InvalidResponse(msg)) => (
                StatusCode::BAD_GATEWAY,
                "Failed to parse search response".to_string(),
                Some(Value::String(msg)),
            ),
            GatewayError::Provider(ProviderError::NotConfigured(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Search provider not configured".to_string(),
                Some(Value::String(msg)),
            ),
            GatewayError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "Session not found".to_string(),
                Some(Value::String(id)),
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
