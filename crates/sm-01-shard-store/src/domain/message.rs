//! # Message Records
//!
//! The unit of storage on a shard and the identifiers used to address it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::integrity::content_hash;

/// Client-assigned message identifier.
///
/// Uniqueness is enforced per shard only. Two shards may hold the same id.
pub type MessageId = u64;

/// Identifier of a shard within a deployment (e.g. `"S1"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(String);

impl ShardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ShardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Delivery status of a message.
///
/// The only transition is `Unread -> Read`, performed by a receiver read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    Unread,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unread => "UNREAD",
            MessageStatus::Read => "READ",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "UNREAD" => Some(MessageStatus::Unread),
            "READ" => Some(MessageStatus::Read),
            _ => None,
        }
    }
}

/// Payload accepted by `receive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub id: MessageId,
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

impl NewMessage {
    pub fn new(
        id: MessageId,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
        }
    }
}

/// A message as held by a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub status: MessageStatus,
    pub timestamp_sent: DateTime<Utc>,
    pub timestamp_read: Option<DateTime<Utc>>,
    /// Hex digest of `content` recorded at write time.
    pub checksum: String,
    pub shard_id: ShardId,
}

impl StoredMessage {
    /// Build a fresh UNREAD record with its content digest.
    pub fn from_new(message: NewMessage, shard_id: ShardId, sent_at: DateTime<Utc>) -> Self {
        let checksum = content_hash(&message.content);
        Self {
            id: message.id,
            sender: message.sender,
            receiver: message.receiver,
            content: message.content,
            status: MessageStatus::Unread,
            timestamp_sent: sent_at,
            timestamp_read: None,
            checksum,
            shard_id,
        }
    }

    pub fn is_read(&self) -> bool {
        self.status == MessageStatus::Read
    }

    /// Transition to READ, keeping the first read time if already read.
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if self.status == MessageStatus::Unread {
            self.status = MessageStatus::Read;
            self.timestamp_read = Some(at);
        }
    }

    /// Replace content and refresh the digest.
    pub fn rewrite(&mut self, content: String) {
        self.checksum = content_hash(&content);
        self.content = content;
    }
}

/// Which side of a mailbox a query addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    BySender(String),
    ByReceiver(String),
}

impl MessageFilter {
    pub fn matches(&self, message: &StoredMessage) -> bool {
        match self {
            MessageFilter::BySender(user) => &message.sender == user,
            MessageFilter::ByReceiver(user) => &message.receiver == user,
        }
    }
}

/// Per-shard statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStats {
    pub shard_id: ShardId,
    pub message_count: usize,
}

/// Mailbox ordering: newest `timestamp_sent` first, ties broken by id descending.
pub fn newest_first(a: &StoredMessage, b: &StoredMessage) -> Ordering {
    b.timestamp_sent
        .cmp(&a.timestamp_sent)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn sort_newest_first(messages: &mut [StoredMessage]) {
    messages.sort_by(newest_first);
}
