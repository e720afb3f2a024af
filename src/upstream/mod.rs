pub mod ollama_client;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use serde_json::json;
use std::pin::Pin;
use tracing::error;

/// Closed set of failure classes for proxied calls. Every upstream outcome the
/// gateway can observe lands in exactly one variant; the variant decides the
/// outbound HTTP status and the `detail` message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("model '{model}' not found")]
    ModelNotFound { model: String },

    /// Upstream answered with a non-404 error status. Status and body text are
    /// forwarded verbatim, never swallowed.
    #[error("upstream request failed: {status} - {body}")]
    UpstreamRejected { status: u16, body: String },

    /// Transport-level failure: connection refused, DNS, timeout. A timed-out
    /// call is indistinguishable from an unreachable daemon and maps the same.
    #[error("cannot connect to ollama service: {0}")]
    Unreachable(String),

    #[error("incorrect response format from upstream: {0}")]
    MalformedResponse(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::MalformedResponse(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!("request failed: {}", self);
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Reshaped NDJSON lines of a streaming generate, ready for `Body::from_stream`.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, GatewayError>> + Send>>;
