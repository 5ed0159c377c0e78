//! # Content Integrity
//!
//! Digest recorded on every write and re-verified on every receiver read
//! (INVARIANT-2).

use sha2::{Digest, Sha256};

use super::message::StoredMessage;

/// Lowercase hex SHA-256 of the message content.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// True when the stored digest still matches the stored content.
pub fn verify_integrity(message: &StoredMessage) -> bool {
    content_hash(&message.content) == message.checksum
}
