//! Gateway errors and their HTTP rendering.
//!
//! Error bodies read `{"error": "...", "code": "...", "message_id": ...}`,
//! with `message_id` present only when the error names a message.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sm_01_shard_store::{MessageId, ShardStoreError};
use sm_02_dispatch::DispatchError;

use super::config::ConfigError;

/// Errors starting or running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

/// HTTP status for a dispatcher error.
pub fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::NoAvailableShard | DispatchError::NoHealthyShard => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DispatchError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
        DispatchError::UnknownReceiver { .. } | DispatchError::InvalidShard { .. } => {
            StatusCode::BAD_REQUEST
        }
        DispatchError::MessageNotFound { .. } => StatusCode::NOT_FOUND,
        DispatchError::Shard { source, .. } => match source {
            ShardStoreError::DuplicateId { .. }
            | ShardStoreError::CorruptedMessage { .. }
            | ShardStoreError::MessageLocked { .. } => StatusCode::BAD_REQUEST,
            ShardStoreError::MessageNotFound { .. } => StatusCode::NOT_FOUND,
            ShardStoreError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        },
    }
}

/// Error returned by balancer handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code,
            message_id: None,
        }
    }

    /// Login rejected.
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "invalid username or secret",
        )
    }

    /// Request exceeded the gateway timeout.
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            "REQUEST_TIMEOUT",
            format!("request exceeded {}ms timeout", limit.as_millis()),
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            details.into(),
        )
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self {
            status: status_for(&err),
            error: err.to_string(),
            code: err.code(),
            message_id: err.message_id(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}
