//! # Outbound Ports
//!
//! Dependencies of the dispatcher: the shards and the user directory.

use async_trait::async_trait;
use sm_01_shard_store::adapters::http::ReceiveReceipt;
use sm_01_shard_store::{MessageId, NewMessage, ShardId, ShardStats, StoredMessage};

use crate::domain::errors::ShardCallError;

/// One shard, reached in-process or over the network.
///
/// Domain rejections come back as `ShardCallError::Rejected` carrying the
/// store's own error; everything else is a transport failure.
#[async_trait]
pub trait ShardClient: Send + Sync {
    fn shard_id(&self) -> &ShardId;

    async fn receive(&self, message: NewMessage) -> Result<ReceiveReceipt, ShardCallError>;

    async fn list_for_receiver(&self, username: &str)
        -> Result<Vec<StoredMessage>, ShardCallError>;

    async fn list_sent(&self, username: &str) -> Result<Vec<StoredMessage>, ShardCallError>;

    async fn edit(&self, id: MessageId, content: String) -> Result<(), ShardCallError>;

    async fn delete(&self, id: MessageId) -> Result<(), ShardCallError>;

    async fn clear_sent_history(&self, username: &str) -> Result<usize, ShardCallError>;

    async fn clear_inbox_history(&self, username: &str) -> Result<usize, ShardCallError>;

    async fn stats(&self) -> Result<ShardStats, ShardCallError>;
}

/// External user directory, consulted before routing and on login.
pub trait UserDirectory: Send + Sync {
    fn exists(&self, username: &str) -> bool;

    fn verify_credentials(&self, username: &str, secret: &str) -> bool;
}
