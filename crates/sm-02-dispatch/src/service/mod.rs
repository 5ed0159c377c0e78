//! # Dispatch Service
//!
//! Implements `DispatchApi` over a fixed, ordered set of shard clients.
//!
//! ## Architecture
//!
//! - `health` - mark-down/mark-up against the router state
//! - `router` - shard selection and the write path
//! - `aggregator` - fan-out reads, bulk clears and ownership probes
//!
//! Router state sits behind one `parking_lot::Mutex`. It is locked only to
//! select a shard or record an outcome; shard calls run with the lock
//! released, each bounded by the configured timeout.

mod aggregator;
mod health;
mod router;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sm_01_shard_store::{MessageId, NewMessage, ShardId, StoredMessage};
use sm_telemetry::{time_shard_call, EVENT_LOG_SIZE, SHARD_CALL_FAILURES, SHARD_UP};
use tracing::{info, warn};

use crate::domain::errors::{DispatchError, ShardCallError};
use crate::domain::health::HealthMap;
use crate::domain::state::RouterState;
use crate::ports::inbound::{
    DashboardSnapshot, DispatchApi, HistoryKind, MutationOutcome, RouteOutcome,
};
use crate::ports::outbound::{ShardClient, UserDirectory};

/// The Dispatch Service.
pub struct DispatchService {
    /// Configured order: initial rotation and probe order.
    shards: Vec<Arc<dyn ShardClient>>,
    directory: Arc<dyn UserDirectory>,
    state: Mutex<RouterState>,
    shard_timeout: Duration,
}

impl DispatchService {
    pub fn new(
        shards: Vec<Arc<dyn ShardClient>>,
        directory: Arc<dyn UserDirectory>,
        shard_timeout: Duration,
    ) -> Self {
        let state = RouterState::new(shards.iter().map(|client| client.shard_id().clone()));
        for client in &shards {
            SHARD_UP.with_label_values(&[client.shard_id().as_str()]).set(1.0);
        }
        info!(
            "[sm-02] Dispatching across {} shards (timeout {}ms)",
            shards.len(),
            shard_timeout.as_millis()
        );

        Self {
            shards,
            directory,
            state: Mutex::new(state),
            shard_timeout,
        }
    }

    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.shards.iter().map(|c| c.shard_id().clone()).collect()
    }

    /// Snapshot of the router state.
    pub fn router_state(&self) -> RouterState {
        self.state.lock().clone()
    }

    fn client(&self, shard_id: &ShardId) -> Option<&Arc<dyn ShardClient>> {
        self.shards.iter().find(|c| c.shard_id() == shard_id)
    }

    /// Run one shard call under the timeout, recording latency and
    /// transport failures.
    async fn call<T, F>(
        &self,
        shard_id: &ShardId,
        operation: &'static str,
        fut: F,
    ) -> Result<T, ShardCallError>
    where
        F: Future<Output = Result<T, ShardCallError>>,
    {
        let _timer = time_shard_call(operation);
        let result = match tokio::time::timeout(self.shard_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ShardCallError::Timeout(self.shard_timeout)),
        };

        if let Err(err) = &result {
            if err.is_transport() {
                SHARD_CALL_FAILURES
                    .with_label_values(&[shard_id.as_str(), operation])
                    .inc();
                warn!("[sm-02] Shard {} {} failed: {}", shard_id, operation, err);
            }
        }
        result
    }
}

/// Append to the event log while the state lock is held.
fn log_event(state: &mut RouterState, entry: String) {
    info!("[sm-02] {}", entry);
    state.events_mut().push(entry);
    EVENT_LOG_SIZE.set(state.events().len() as f64);
}

#[async_trait]
impl DispatchApi for DispatchService {
    async fn route_write(&self, message: NewMessage) -> Result<RouteOutcome, DispatchError> {
        DispatchService::route_write(self, message).await
    }

    fn mark_down(&self, shard_id: &str) -> Result<HealthMap, DispatchError> {
        DispatchService::mark_down(self, shard_id)
    }

    fn mark_up(&self, shard_id: &str) -> Result<HealthMap, DispatchError> {
        DispatchService::mark_up(self, shard_id)
    }

    fn health_map(&self) -> HealthMap {
        DispatchService::health_map(self)
    }

    async fn inbox(&self, username: &str) -> Vec<StoredMessage> {
        DispatchService::inbox(self, username).await
    }

    async fn sent(&self, username: &str) -> Vec<StoredMessage> {
        DispatchService::sent(self, username).await
    }

    async fn clear_history(&self, kind: HistoryKind, username: &str) -> usize {
        DispatchService::clear_history(self, kind, username).await
    }

    async fn edit_message(
        &self,
        id: MessageId,
        content: String,
    ) -> Result<MutationOutcome, DispatchError> {
        DispatchService::edit_message(self, id, content).await
    }

    async fn delete_message(&self, id: MessageId) -> Result<MutationOutcome, DispatchError> {
        DispatchService::delete_message(self, id).await
    }

    async fn dashboard(&self) -> DashboardSnapshot {
        DispatchService::dashboard(self).await
    }

    fn authenticate(&self, username: &str, secret: &str) -> bool {
        self.directory.verify_credentials(username, secret)
    }
}
