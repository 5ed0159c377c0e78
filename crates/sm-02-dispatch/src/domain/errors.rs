//! # Domain Errors
//!
//! Error types for the Dispatch subsystem.

use std::time::Duration;

use sm_01_shard_store::{MessageId, ShardId, ShardStoreError};
use thiserror::Error;

/// Errors surfaced to callers of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The rotation set is empty.
    #[error("No available servers")]
    NoAvailableShard,

    /// Every shard in the rotation set is DOWN.
    #[error("No UP servers found")]
    NoHealthyShard,

    /// Transport-level failure talking to the selected shard. Not retried.
    #[error("shard {shard_id} unreachable: {reason}")]
    UpstreamUnreachable { shard_id: ShardId, reason: String },

    /// Receiver failed the directory existence check.
    #[error("unknown receiver: {username}")]
    UnknownReceiver { username: String },

    /// Health operation on a shard id outside the static configuration.
    #[error("Invalid server_id: {shard_id}")]
    InvalidShard { shard_id: String },

    /// A shard answered with a domain rejection.
    #[error("shard {shard_id} rejected the request: {source}")]
    Shard {
        shard_id: ShardId,
        #[source]
        source: ShardStoreError,
    },

    /// No probed shard holds the message.
    #[error("message {id} not found on any shard")]
    MessageNotFound { id: MessageId },
}

impl DispatchError {
    /// Stable code carried in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::NoAvailableShard => "NO_AVAILABLE_SHARD",
            DispatchError::NoHealthyShard => "NO_HEALTHY_SHARD",
            DispatchError::UpstreamUnreachable { .. } => "UPSTREAM_UNREACHABLE",
            DispatchError::UnknownReceiver { .. } => "UNKNOWN_RECEIVER",
            DispatchError::InvalidShard { .. } => "INVALID_SHARD",
            DispatchError::Shard { source, .. } => source.code(),
            DispatchError::MessageNotFound { .. } => "MESSAGE_NOT_FOUND",
        }
    }

    /// Message id the error refers to, if any.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            DispatchError::Shard { source, .. } => source.message_id(),
            DispatchError::MessageNotFound { id } => Some(*id),
            _ => None,
        }
    }

    /// Label used for the routing failure counter.
    pub fn routing_reason(&self) -> &'static str {
        match self {
            DispatchError::NoAvailableShard => "no_available",
            DispatchError::NoHealthyShard => "no_healthy",
            DispatchError::UpstreamUnreachable { .. } => "upstream",
            _ => "rejected",
        }
    }
}

/// Outcome of a single failed call to one shard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardCallError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The shard processed the call and refused it.
    #[error("{0}")]
    Rejected(ShardStoreError),
}

impl ShardCallError {
    /// True for transport failures, false for domain rejections.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ShardCallError::Rejected(_))
    }

    /// Lift into a caller-facing error attributed to `shard_id`.
    pub fn into_dispatch(self, shard_id: ShardId) -> DispatchError {
        match self {
            ShardCallError::Rejected(source) => DispatchError::Shard { shard_id, source },
            other => DispatchError::UpstreamUnreachable {
                shard_id,
                reason: other.to_string(),
            },
        }
    }
}
