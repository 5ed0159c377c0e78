//! # Mailbox Flows
//!
//! Scatter-gather reads and probing mutations across shard nodes:
//!
//! 1. Inbox reads merge every shard newest first and lock what they return
//! 2. Sent views never change status
//! 3. Edit and delete find the owning shard by probing in configured order
//! 4. An integrity failure hides only the affected shard's batch

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use sm_01_shard_store::{StorageBackend, CORRUPTED_CONTENT};

    use crate::integration::harness::{ids, Cluster};

    // =============================================================================
    // INBOX / SENT
    // =============================================================================

    #[tokio::test]
    async fn test_inbox_merges_newest_first_and_locks() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=4 {
            cluster.route_ok(id, "alice", "bob").await;
        }
        cluster.route_ok(5, "alice", "carol").await;

        let inbox = cluster.get_json("/inbox/bob").await;
        assert_eq!(ids(&inbox), [4, 3, 2, 1]);
        for message in inbox.as_array().unwrap() {
            assert_eq!(message["status"], "READ");
            assert!(message["timestamp_read"].is_string());
        }

        // Carol's message is untouched by Bob's read.
        let sent = cluster.get_json("/sent/alice").await;
        let carol = sent
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["id"] == 5)
            .unwrap();
        assert_eq!(carol["status"], "UNREAD");
    }

    #[tokio::test]
    async fn test_sent_view_does_not_lock() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=3 {
            cluster.route_ok(id, "alice", "bob").await;
        }

        let sent = cluster.get_json("/sent/alice").await;
        assert_eq!(ids(&sent), [3, 2, 1]);
        assert!(sent
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["status"] == "UNREAD"));

        let response = cluster
            .put_json("/edit/2", json!({"content": "fixed typo"}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreachable_shard_skipped_on_read() {
        let mut cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=3 {
            cluster.route_ok(id, "alice", "bob").await;
        }
        cluster.stop_shard("S3").await;

        let inbox = cluster.get_json("/inbox/bob").await;
        assert_eq!(ids(&inbox), [2, 1]);
    }

    // =============================================================================
    // EDIT / DELETE
    // =============================================================================

    #[tokio::test]
    async fn test_edit_and_delete_probe_owning_shard() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=3 {
            cluster.route_ok(id, "alice", "carol").await;
        }

        let response = cluster
            .put_json("/edit/3", json!({"content": "edited"}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["server"], "S3");
        assert_eq!(body["id"], 3);

        let sent = cluster.get_json("/sent/alice").await;
        assert_eq!(sent[0]["content"], "edited");

        let response = cluster.delete("/delete/2").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["server"], "S2");
        assert_eq!(cluster.shard_count("S2").await, 0);

        let response = cluster.delete("/delete/2").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "MESSAGE_NOT_FOUND");
        assert_eq!(body["message_id"], 2);
    }

    #[tokio::test]
    async fn test_read_messages_are_locked() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        cluster.route_ok(1, "alice", "bob").await;
        cluster.get_json("/inbox/bob").await;

        let response = cluster.put_json("/edit/1", json!({"content": "too late"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "MESSAGE_LOCKED");

        let response = cluster.delete("/delete/1").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(cluster.shard_count("S1").await, 1);
    }

    #[tokio::test]
    async fn test_clear_history_sums_across_shards() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=4 {
            cluster.route_ok(id, "alice", "bob").await;
        }
        cluster.route_ok(5, "carol", "bob").await;

        let body: Value = cluster
            .delete("/sent-history/alice")
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["deleted"], 4);
        assert_eq!(ids(&cluster.get_json("/sent/alice").await), Vec::<u64>::new());

        let body: Value = cluster
            .delete("/inbox-history/bob")
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["deleted"], 1);

        let logs = cluster.get_json("/dashboard-data").await["logs"].clone();
        assert!(logs
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry == "Cleared 4 sent messages for alice"));
    }

    // =============================================================================
    // INTEGRITY
    // =============================================================================

    #[tokio::test]
    async fn test_corrupted_message_hides_shard_batch() {
        let cluster = Cluster::start(StorageBackend::Json, true).await;
        for id in 1..=3 {
            cluster.route_ok(id, "alice", "bob").await;
        }
        assert_eq!(cluster.corrupt("S2", 2).await.status(), StatusCode::OK);

        let inbox = cluster.get_json("/inbox/bob").await;
        assert_eq!(ids(&inbox), [3, 1]);

        // The refused batch stays UNREAD; the sender still sees it.
        let sent = cluster.get_json("/sent/alice").await;
        let tampered = sent
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["id"] == 2)
            .unwrap();
        assert_eq!(tampered["status"], "UNREAD");
        assert_eq!(tampered["content"], CORRUPTED_CONTENT);

        let logs = cluster.get_json("/dashboard-data").await["logs"].clone();
        assert!(logs
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry == "Message 2 on S2 failed integrity check"));
    }

    #[tokio::test]
    async fn test_corrupt_endpoint_absent_without_fault_injection() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        cluster.route_ok(1, "alice", "bob").await;

        assert_eq!(cluster.corrupt("S1", 1).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(ids(&cluster.get_json("/inbox/bob").await), [1]);
    }
}
