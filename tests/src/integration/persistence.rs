//! # Persistence Flows
//!
//! File-backed shard nodes keep messages and READ locks across restarts, and
//! refuse to share a data directory with a live node.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use sm_01_shard_store::{ShardStore, ShardStoreError, StorageBackend, SystemClock};

    use crate::integration::harness::{ids, store_config, ShardNode};

    async fn receive(client: &Client, node: &ShardNode, id: u64) {
        let response = client
            .post(node.endpoint("/receive"))
            .json(&json!({"id": id, "sender": "alice", "receiver": "bob", "content": "kept"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn get_json(client: &Client, node: &ShardNode, path: &str) -> Value {
        client
            .get(node.endpoint(path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn survives_restart(backend: StorageBackend) {
        let dir = tempfile::tempdir().unwrap();
        let config = store_config("S1", backend, dir.path(), false);
        let client = Client::new();

        let mut node = ShardNode::spawn(config.clone()).await;
        receive(&client, &node, 1).await;
        receive(&client, &node, 2).await;
        node.stop().await;

        let mut node = ShardNode::spawn(config.clone()).await;
        let inbox = get_json(&client, &node, "/messages/bob").await;
        assert_eq!(ids(&inbox), [2, 1]);
        node.stop().await;

        // READ status was written through before the restart.
        let node = ShardNode::spawn(config).await;
        let sent = get_json(&client, &node, "/sent/alice").await;
        assert!(sent
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["status"] == "READ"));

        let response = client
            .put(node.endpoint("/edit/1"))
            .json(&json!({"content": "rewrite"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_shard_survives_restart() {
        survives_restart(StorageBackend::Json).await;
    }

    #[tokio::test]
    async fn test_sqlite_shard_survives_restart() {
        survives_restart(StorageBackend::Sqlite).await;
    }

    #[tokio::test]
    async fn test_live_node_holds_data_dir_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = store_config("S1", StorageBackend::Sqlite, dir.path(), false);

        let mut node = ShardNode::spawn(config.clone()).await;
        let second = ShardStore::open(&config, Arc::new(SystemClock));
        assert!(matches!(
            second,
            Err(ShardStoreError::StorageUnavailable { .. })
        ));

        node.stop().await;
        assert!(ShardStore::open(&config, Arc::new(SystemClock)).is_ok());
    }

    #[tokio::test]
    async fn test_distinct_shards_share_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();

        let s1 = ShardNode::spawn(store_config("S1", StorageBackend::Json, dir.path(), false)).await;
        let s2 = ShardNode::spawn(store_config("S2", StorageBackend::Json, dir.path(), false)).await;
        receive(&client, &s1, 1).await;
        receive(&client, &s2, 1).await;

        // Same id on two shards is allowed; uniqueness is per shard.
        assert_eq!(get_json(&client, &s1, "/stats").await["message_count"], 1);
        assert_eq!(get_json(&client, &s2, "/stats").await["message_count"], 1);
        assert_eq!(get_json(&client, &s2, "/health").await["backend"], "json");
    }
}
