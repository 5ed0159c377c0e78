//! # Inbound Ports
//!
//! The API the dispatcher offers to its callers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sm_01_shard_store::adapters::http::ReceiveReceipt;
use sm_01_shard_store::{MessageId, NewMessage, ShardId, StoredMessage};

use crate::domain::errors::DispatchError;
use crate::domain::health::HealthMap;

/// Result of a placed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub routed_to: ShardId,
    pub server_response: ReceiveReceipt,
}

/// Result of an edit or delete that some shard applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub server: ShardId,
    pub id: MessageId,
}

/// Which side of a user's history to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Sent,
    Inbox,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Sent => "sent",
            HistoryKind::Inbox => "inbox",
        }
    }
}

/// Point-in-time view of the router for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub server_status: HealthMap,
    pub available_servers: Vec<ShardId>,
    pub current_index: usize,
    pub server_load: BTreeMap<ShardId, usize>,
    pub total_messages: usize,
    pub algorithm: String,
    pub logs: Vec<String>,
    pub last_routed: Option<ShardId>,
}

/// Dispatch API - inbound port.
#[async_trait]
pub trait DispatchApi: Send + Sync {
    /// Place a message on the next healthy shard. No fail-over once a shard
    /// has been selected.
    async fn route_write(&self, message: NewMessage) -> Result<RouteOutcome, DispatchError>;

    /// Mark a configured shard DOWN and return the health map.
    fn mark_down(&self, shard_id: &str) -> Result<HealthMap, DispatchError>;

    /// Mark a configured shard UP and return the health map.
    fn mark_up(&self, shard_id: &str) -> Result<HealthMap, DispatchError>;

    fn health_map(&self) -> HealthMap;

    /// Receiver view across all shards. Failing shards are skipped.
    async fn inbox(&self, username: &str) -> Vec<StoredMessage>;

    /// Sender view across all shards. Failing shards are skipped.
    async fn sent(&self, username: &str) -> Vec<StoredMessage>;

    /// Clear one side of a user's history on every shard; returns the total.
    async fn clear_history(&self, kind: HistoryKind, username: &str) -> usize;

    /// Edit on whichever shard owns `id`.
    async fn edit_message(
        &self,
        id: MessageId,
        content: String,
    ) -> Result<MutationOutcome, DispatchError>;

    /// Delete on whichever shard owns `id`.
    async fn delete_message(&self, id: MessageId) -> Result<MutationOutcome, DispatchError>;

    async fn dashboard(&self) -> DashboardSnapshot;

    /// Delegates to the user directory.
    fn authenticate(&self, username: &str, secret: &str) -> bool;
}
