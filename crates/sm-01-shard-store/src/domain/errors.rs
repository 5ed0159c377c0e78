//! # Domain Errors
//!
//! Error types for the Shard Store subsystem.
//!
//! `ShardStoreError` crosses process boundaries: shard nodes serialize it into
//! their error bodies and the dispatcher rebuilds it on the other side, so the
//! `code` tag is part of the wire contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::MessageId;

/// Errors surfaced by the Shard Store contract.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardStoreError {
    /// A message with this id already exists on the shard (INVARIANT-1).
    #[error("message {id} already exists on this shard")]
    DuplicateId { id: MessageId },

    /// Stored digest no longer matches content (INVARIANT-2).
    #[error("message {id} failed integrity verification")]
    CorruptedMessage { id: MessageId },

    /// Message has been read and is immutable (INVARIANT-4).
    #[error("message {id} has been read and can no longer be changed")]
    MessageLocked { id: MessageId },

    #[error("message {id} not found")]
    MessageNotFound { id: MessageId },

    /// Backing storage failed.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
}

impl ShardStoreError {
    /// Wire code carried in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ShardStoreError::DuplicateId { .. } => "DUPLICATE_ID",
            ShardStoreError::CorruptedMessage { .. } => "CORRUPTED_MESSAGE",
            ShardStoreError::MessageLocked { .. } => "MESSAGE_LOCKED",
            ShardStoreError::MessageNotFound { .. } => "MESSAGE_NOT_FOUND",
            ShardStoreError::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
        }
    }

    /// Message id the error refers to, if any.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            ShardStoreError::DuplicateId { id }
            | ShardStoreError::CorruptedMessage { id }
            | ShardStoreError::MessageLocked { id }
            | ShardStoreError::MessageNotFound { id } => Some(*id),
            ShardStoreError::StorageUnavailable { .. } => None,
        }
    }
}

/// Errors from a `MessageRepository` backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate key {id}")]
    DuplicateKey { id: MessageId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
}

impl RepositoryError {
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        RepositoryError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

impl From<RepositoryError> for ShardStoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey { id } => ShardStoreError::DuplicateId { id },
            other => ShardStoreError::StorageUnavailable {
                message: other.to_string(),
            },
        }
    }
}
