//! # Inbound Ports (Driving Ports)
//!
//! The contract every shard honours, whatever its persistence backend.

use crate::domain::errors::ShardStoreError;
use crate::domain::message::{MessageId, NewMessage, ShardId, ShardStats, StoredMessage};

/// Primary API of a shard.
///
/// Implementations must enforce all domain invariants.
pub trait ShardStoreApi {
    /// Identity of this shard.
    fn shard_id(&self) -> &ShardId;

    /// Persist a new UNREAD message.
    ///
    /// ## Errors
    ///
    /// - `DuplicateId`: the id already exists on this shard (INVARIANT-1)
    /// - `StorageUnavailable`: backend failure
    fn receive(&mut self, message: NewMessage) -> Result<StoredMessage, ShardStoreError>;

    /// Return the receiver's messages newest first and mark UNREAD ones as READ.
    ///
    /// ## Integrity (INVARIANT-2, INVARIANT-3)
    ///
    /// Every returned message is verified before any status changes. A single
    /// mismatch aborts the whole read with `CorruptedMessage` and leaves every
    /// message untouched. The returned list reflects the post-read status.
    fn list_for_receiver(&mut self, receiver: &str) -> Result<Vec<StoredMessage>, ShardStoreError>;

    /// Return the sender's messages newest first. No status changes.
    fn list_sent(&self, sender: &str) -> Result<Vec<StoredMessage>, ShardStoreError>;

    /// Replace the content of an UNREAD message and refresh its digest.
    ///
    /// ## Errors
    ///
    /// - `MessageNotFound`: no such id on this shard
    /// - `MessageLocked`: the message has been read (INVARIANT-4)
    fn edit(&mut self, id: MessageId, new_content: String) -> Result<StoredMessage, ShardStoreError>;

    /// Remove an UNREAD message.
    ///
    /// ## Errors
    ///
    /// - `MessageNotFound`: no such id on this shard
    /// - `MessageLocked`: the message has been read (INVARIANT-4)
    fn delete(&mut self, id: MessageId) -> Result<(), ShardStoreError>;

    /// Remove every message sent by `sender`, regardless of status.
    fn clear_sent_history(&mut self, sender: &str) -> Result<usize, ShardStoreError>;

    /// Remove every message addressed to `receiver`, regardless of status.
    fn clear_inbox_history(&mut self, receiver: &str) -> Result<usize, ShardStoreError>;

    fn stats(&self) -> Result<ShardStats, ShardStoreError>;
}
