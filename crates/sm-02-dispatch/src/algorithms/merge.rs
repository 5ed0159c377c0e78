//! # Scatter-gather Merge
//!
//! Combines per-shard result sets into one mailbox view.

use std::collections::HashMap;

use sm_01_shard_store::{sort_newest_first, MessageId, ShardId, StoredMessage};
use tracing::warn;

/// Merge receiver reads.
///
/// Ids are deduplicated with the first occurrence winning, in the order the
/// batches are given. Ids are only unique per shard, so two shards holding
/// different messages under one id lose one of them here; each such
/// collision is logged.
pub fn merge_inbox(batches: Vec<(ShardId, Vec<StoredMessage>)>) -> Vec<StoredMessage> {
    let mut owners: HashMap<MessageId, ShardId> = HashMap::new();
    let mut merged = Vec::new();

    for (shard_id, messages) in batches {
        for message in messages {
            if let Some(owner) = owners.get(&message.id) {
                warn!(
                    "[sm-02] Message id {} held by both {} and {}; keeping the copy from {}",
                    message.id, owner, shard_id, owner
                );
                continue;
            }
            owners.insert(message.id, shard_id.clone());
            merged.push(message);
        }
    }

    sort_newest_first(&mut merged);
    merged
}

/// Merge sender reads. A sent message lives on exactly one shard, so no
/// deduplication is applied.
pub fn merge_sent(batches: Vec<(ShardId, Vec<StoredMessage>)>) -> Vec<StoredMessage> {
    let mut merged: Vec<StoredMessage> = batches
        .into_iter()
        .flat_map(|(_, messages)| messages)
        .collect();
    sort_newest_first(&mut merged);
    merged
}
