//! Shard node wire types, shared with HTTP clients of the shard.

use serde::{Deserialize, Serialize};

use crate::domain::errors::ShardStoreError;
use crate::domain::message::{MessageId, ShardId, StoredMessage};

/// Response to `POST /receive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveReceipt {
    pub message: String,
    pub server: ShardId,
    pub id: MessageId,
}

impl From<&StoredMessage> for ReceiveReceipt {
    fn from(stored: &StoredMessage) -> Self {
        Self {
            message: format!("Stored in {}", stored.shard_id),
            server: stored.shard_id.clone(),
            id: stored.id,
        }
    }
}

/// Body of `PUT /edit/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub content: String,
}

/// Response to edit and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    pub message: String,
    pub id: MessageId,
}

/// Response to the history clearing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReceipt {
    pub message: String,
    pub deleted: usize,
}

/// Error body returned by a shard node.
///
/// Flattened so the body reads `{"error": "...", "code": "...", "id": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardErrorBody {
    pub error: String,
    #[serde(flatten)]
    pub detail: ShardStoreError,
}

impl From<&ShardStoreError> for ShardErrorBody {
    fn from(err: &ShardStoreError) -> Self {
        Self {
            error: err.to_string(),
            detail: err.clone(),
        }
    }
}

/// Response to `GET /health` and `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardBanner {
    pub status: String,
    pub shard_id: ShardId,
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = ShardErrorBody::from(&ShardStoreError::MessageLocked { id: 8 });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["code"], "MESSAGE_LOCKED");
        assert_eq!(json["id"], 8);
        assert!(json["error"].as_str().unwrap().contains("read"));

        let back: ShardErrorBody = serde_json::from_value(json).unwrap();
        assert_eq!(back.detail, ShardStoreError::MessageLocked { id: 8 });
    }
}
