//! In-process shard client.
//!
//! Wraps a `SharedShardStore` so a single process can host the dispatcher
//! and its shards. Store calls run on the blocking pool since file-backed
//! repositories do synchronous I/O.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sm_01_shard_store::adapters::http::ReceiveReceipt;
use sm_01_shard_store::{
    MessageId, NewMessage, ShardId, ShardStats, ShardStore, ShardStoreApi, ShardStoreError,
    SharedShardStore, StoredMessage,
};

use crate::domain::errors::ShardCallError;
use crate::ports::outbound::ShardClient;

pub struct InProcessShardClient {
    shard_id: ShardId,
    store: SharedShardStore,
    reachable: AtomicBool,
}

impl InProcessShardClient {
    pub fn new(store: SharedShardStore) -> Self {
        let shard_id = store.read().shard_id().clone();
        Self {
            shard_id,
            store,
            reachable: AtomicBool::new(true),
        }
    }

    /// Simulate the shard process going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn store(&self) -> &SharedShardStore {
        &self.store
    }

    async fn run<T, F>(&self, op: F) -> Result<T, ShardCallError>
    where
        F: FnOnce(&mut ShardStore) -> Result<T, ShardStoreError> + Send + 'static,
        T: Send + 'static,
    {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(ShardCallError::Unreachable(format!(
                "shard {} is offline",
                self.shard_id
            )));
        }

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&mut store.write()))
            .await
            .map_err(|e| ShardCallError::Unreachable(format!("store task failed: {e}")))?
            .map_err(ShardCallError::Rejected)
    }
}

#[async_trait]
impl ShardClient for InProcessShardClient {
    fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }

    async fn receive(&self, message: NewMessage) -> Result<ReceiveReceipt, ShardCallError> {
        let stored = self.run(move |store| store.receive(message)).await?;
        Ok(ReceiveReceipt::from(&stored))
    }

    async fn list_for_receiver(
        &self,
        username: &str,
    ) -> Result<Vec<StoredMessage>, ShardCallError> {
        let username = username.to_string();
        self.run(move |store| store.list_for_receiver(&username)).await
    }

    async fn list_sent(&self, username: &str) -> Result<Vec<StoredMessage>, ShardCallError> {
        let username = username.to_string();
        self.run(move |store| store.list_sent(&username)).await
    }

    async fn edit(&self, id: MessageId, content: String) -> Result<(), ShardCallError> {
        self.run(move |store| store.edit(id, content).map(|_| ())).await
    }

    async fn delete(&self, id: MessageId) -> Result<(), ShardCallError> {
        self.run(move |store| store.delete(id)).await
    }

    async fn clear_sent_history(&self, username: &str) -> Result<usize, ShardCallError> {
        let username = username.to_string();
        self.run(move |store| store.clear_sent_history(&username))
            .await
    }

    async fn clear_inbox_history(&self, username: &str) -> Result<usize, ShardCallError> {
        let username = username.to_string();
        self.run(move |store| store.clear_inbox_history(&username))
            .await
    }

    async fn stats(&self) -> Result<ShardStats, ShardCallError> {
        self.run(|store| store.stats()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_01_shard_store::{InMemoryMessageRepository, SystemClock};
    use std::sync::Arc;

    fn client(id: &str) -> InProcessShardClient {
        InProcessShardClient::new(
            ShardStore::new(
                ShardId::new(id),
                Box::new(InMemoryMessageRepository::new()),
                Arc::new(SystemClock),
            )
            .into_shared(),
        )
    }

    #[tokio::test]
    async fn test_store_errors_are_rejections() {
        let client = client("S1");
        client
            .receive(NewMessage::new(1, "alice", "bob", "hi"))
            .await
            .unwrap();

        assert_eq!(
            client.receive(NewMessage::new(1, "alice", "bob", "hi")).await,
            Err(ShardCallError::Rejected(ShardStoreError::DuplicateId { id: 1 }))
        );
    }

    #[tokio::test]
    async fn test_unreachable_when_offline() {
        let client = client("S2");
        client.set_reachable(false);

        let err = client.stats().await.unwrap_err();
        assert!(err.is_transport());

        client.set_reachable(true);
        assert_eq!(client.stats().await.unwrap().message_count, 0);
    }
}
