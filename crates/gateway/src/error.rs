//! Error types for the webhook gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request did not carry a valid provider signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// The webhook body could not be understood.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The pipeline failed before it could reply.
    #[error("Pipeline error: {0}")]
    Orchestrator(#[from] orchestrator::OrchestratorError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::InvalidSignature => {
                tracing::warn!("Rejected webhook with invalid signature");
                (StatusCode::FORBIDDEN, "Forbidden: invalid signature".to_string())
            }
            GatewayError::InvalidPayload(msg) => {
                tracing::warn!("Invalid webhook payload: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            GatewayError::Orchestrator(err) => {
                tracing::error!("Pipeline error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway handlers.
pub type Result<T> = std::result::Result<T, GatewayError>;
