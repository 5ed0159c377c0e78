//! # Aggregator
//!
//! Scatter-gather over every configured shard, regardless of health state.
//! Health only governs write placement.
//!
//! Fan-out reads and clears run concurrently and skip failing shards.
//! Edit and delete probe shards one at a time in configured order because
//! nothing maps a message id to its shard.

use std::collections::BTreeMap;

use futures::future::join_all;
use sm_01_shard_store::{MessageId, ShardId, ShardStoreError, StoredMessage};
use sm_telemetry::CORRUPTED_READS;
use tracing::{debug, warn};

use super::{log_event, DispatchService};
use crate::algorithms::merge::{merge_inbox, merge_sent};
use crate::domain::errors::{DispatchError, ShardCallError};
use crate::ports::inbound::{DashboardSnapshot, HistoryKind, MutationOutcome};

/// Name reported on the dashboard.
pub const ALGORITHM_NAME: &str = "Round Robin";

#[derive(Clone, Copy)]
enum Mutation<'a> {
    Edit(&'a str),
    Delete,
}

impl Mutation<'_> {
    fn operation(&self) -> &'static str {
        match self {
            Mutation::Edit(_) => "edit",
            Mutation::Delete => "delete",
        }
    }
}

impl DispatchService {
    /// Receiver mailbox across all shards, deduplicated, newest first.
    ///
    /// Marks every returned message READ on its shard.
    pub async fn inbox(&self, username: &str) -> Vec<StoredMessage> {
        let calls = self.shards.iter().map(|client| async move {
            let shard_id = client.shard_id().clone();
            let result = self
                .call(&shard_id, "list_for_receiver", client.list_for_receiver(username))
                .await;
            (shard_id, result)
        });

        let mut batches = Vec::with_capacity(self.shards.len());
        for (shard_id, result) in join_all(calls).await {
            match result {
                Ok(messages) => batches.push((shard_id, messages)),
                Err(ShardCallError::Rejected(ShardStoreError::CorruptedMessage { id })) => {
                    self.record_corruption(&shard_id, id, username);
                }
                Err(err) => {
                    debug!(
                        "[sm-02] Skipping shard {} for inbox of {}: {}",
                        shard_id, username, err
                    );
                }
            }
        }

        merge_inbox(batches)
    }

    /// Sender view across all shards, newest first. Never changes status.
    pub async fn sent(&self, username: &str) -> Vec<StoredMessage> {
        let calls = self.shards.iter().map(|client| async move {
            let shard_id = client.shard_id().clone();
            let result = self
                .call(&shard_id, "list_sent", client.list_sent(username))
                .await;
            (shard_id, result)
        });

        let batches = join_all(calls)
            .await
            .into_iter()
            .filter_map(|(shard_id, result)| match result {
                Ok(messages) => Some((shard_id, messages)),
                Err(err) => {
                    debug!(
                        "[sm-02] Skipping shard {} for sent of {}: {}",
                        shard_id, username, err
                    );
                    None
                }
            })
            .collect();

        merge_sent(batches)
    }

    /// Clear one side of `username`'s history on every shard.
    ///
    /// Returns the number of rows removed across the shards that answered.
    pub async fn clear_history(&self, kind: HistoryKind, username: &str) -> usize {
        let calls = self.shards.iter().map(|client| async move {
            let shard_id = client.shard_id().clone();
            let result = match kind {
                HistoryKind::Sent => {
                    self.call(&shard_id, "clear_sent_history", client.clear_sent_history(username))
                        .await
                }
                HistoryKind::Inbox => {
                    self.call(
                        &shard_id,
                        "clear_inbox_history",
                        client.clear_inbox_history(username),
                    )
                    .await
                }
            };
            (shard_id, result)
        });

        let mut total = 0;
        for (shard_id, result) in join_all(calls).await {
            match result {
                Ok(deleted) => total += deleted,
                Err(err) => debug!(
                    "[sm-02] Skipping shard {} for {} clear: {}",
                    shard_id,
                    kind.as_str(),
                    err
                ),
            }
        }

        let mut state = self.state.lock();
        log_event(
            &mut state,
            format!(
                "Cleared {total} {} messages for {username}",
                kind.as_str()
            ),
        );
        total
    }

    pub async fn edit_message(
        &self,
        id: MessageId,
        content: String,
    ) -> Result<MutationOutcome, DispatchError> {
        self.probe(id, Mutation::Edit(&content)).await
    }

    pub async fn delete_message(&self, id: MessageId) -> Result<MutationOutcome, DispatchError> {
        self.probe(id, Mutation::Delete).await
    }

    /// Try each shard in order until one applies or refuses the mutation.
    ///
    /// Success and domain rejections both stop the probe. Not-found,
    /// storage failures and unreachable shards move on to the next shard.
    async fn probe(
        &self,
        id: MessageId,
        mutation: Mutation<'_>,
    ) -> Result<MutationOutcome, DispatchError> {
        for client in &self.shards {
            let shard_id = client.shard_id();
            let result = match mutation {
                Mutation::Edit(content) => {
                    self.call(shard_id, "edit", client.edit(id, content.to_string()))
                        .await
                }
                Mutation::Delete => self.call(shard_id, "delete", client.delete(id)).await,
            };

            match result {
                Ok(()) => {
                    debug!(
                        "[sm-02] Message {} {} applied on {}",
                        id,
                        mutation.operation(),
                        shard_id
                    );
                    return Ok(MutationOutcome {
                        server: shard_id.clone(),
                        id,
                    });
                }
                Err(ShardCallError::Rejected(ShardStoreError::MessageNotFound { .. })) => {}
                Err(ShardCallError::Rejected(ShardStoreError::StorageUnavailable { message })) => {
                    warn!(
                        "[sm-02] Shard {} storage unavailable during {}: {}",
                        shard_id,
                        mutation.operation(),
                        message
                    );
                }
                Err(ShardCallError::Rejected(source)) => {
                    return Err(DispatchError::Shard {
                        shard_id: shard_id.clone(),
                        source,
                    });
                }
                Err(_) => {}
            }
        }

        Err(DispatchError::MessageNotFound { id })
    }

    /// Router state plus per-shard load. Unreachable shards report 0.
    pub async fn dashboard(&self) -> DashboardSnapshot {
        let calls = self.shards.iter().map(|client| async move {
            let shard_id = client.shard_id().clone();
            let count = self
                .call(&shard_id, "stats", client.stats())
                .await
                .map(|stats| stats.message_count)
                .unwrap_or(0);
            (shard_id, count)
        });
        let server_load: BTreeMap<ShardId, usize> = join_all(calls).await.into_iter().collect();
        let total_messages = server_load.values().sum();

        let state = self.state.lock();
        DashboardSnapshot {
            server_status: state.health().clone(),
            available_servers: state.rotation().to_vec(),
            current_index: state.cursor(),
            server_load,
            total_messages,
            algorithm: ALGORITHM_NAME.to_string(),
            logs: state.events().entries(),
            last_routed: state.last_routed().cloned(),
        }
    }

    fn record_corruption(&self, shard_id: &ShardId, id: MessageId, username: &str) {
        warn!(
            "[sm-02] Shard {} refused inbox of {}: message {} failed integrity check",
            shard_id, username, id
        );
        CORRUPTED_READS.with_label_values(&[shard_id.as_str()]).inc();
        let mut state = self.state.lock();
        log_event(
            &mut state,
            format!("Message {id} on {shard_id} failed integrity check"),
        );
    }
}
