//! # Write Placement Flows
//!
//! Balancer → shard nodes over HTTP:
//!
//! 1. Round robin over the rotation set, one message per shard per lap
//! 2. `/fail` and `/restore` reshape the rotation set
//! 3. Dispatcher errors surface with their HTTP status and code
//! 4. A dead shard node fails its write without failover

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::Value;
    use sm_01_shard_store::StorageBackend;

    use crate::integration::harness::Cluster;

    // =============================================================================
    // PLACEMENT
    // =============================================================================

    #[tokio::test]
    async fn test_round_robin_places_one_message_per_shard() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;

        let mut placed = Vec::new();
        for id in 1..=6 {
            placed.push(cluster.route_ok(id, "alice", "bob").await);
        }
        assert_eq!(placed, ["S1", "S2", "S3", "S1", "S2", "S3"]);

        for shard in ["S1", "S2", "S3"] {
            assert_eq!(cluster.shard_count(shard).await, 2);
        }
    }

    #[tokio::test]
    async fn test_route_response_carries_shard_receipt() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;

        let body: Value = cluster
            .route(7, "alice", "bob", "hello")
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["routed_to"], "S1");
        assert_eq!(body["server_response"]["server"], "S1");
        assert_eq!(body["server_response"]["id"], 7);
        assert_eq!(body["server_response"]["message"], "Stored in S1");
    }

    #[tokio::test]
    async fn test_fail_and_restore_reshape_rotation() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=3 {
            cluster.route_ok(id, "alice", "bob").await;
        }

        let health: Value = cluster.post("/fail/S2").await.json().await.unwrap();
        assert_eq!(health["S2"], "DOWN");
        assert_eq!(cluster.route_ok(4, "alice", "bob").await, "S1");
        assert_eq!(cluster.route_ok(5, "alice", "bob").await, "S3");
        assert_eq!(cluster.get_json("/servers").await["S2"], "DOWN");

        let health: Value = cluster.post("/restore/S2").await.json().await.unwrap();
        assert_eq!(health["S2"], "UP");

        // Restored shards rejoin at the end of the rotation.
        let mut placed = Vec::new();
        for id in 6..=8 {
            placed.push(cluster.route_ok(id, "alice", "bob").await);
        }
        assert_eq!(placed, ["S1", "S3", "S2"]);
    }

    // =============================================================================
    // ERROR MAPPING
    // =============================================================================

    #[tokio::test]
    async fn test_all_shards_down_is_service_unavailable() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for shard in ["S1", "S2", "S3"] {
            cluster.post(&format!("/fail/{shard}")).await;
        }

        let response = cluster.route(1, "alice", "bob", "hi").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "NO_AVAILABLE_SHARD");
        assert_eq!(body["error"], "No available servers");
    }

    #[tokio::test]
    async fn test_unknown_receiver_and_shard_rejected() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;

        let response = cluster.route(1, "alice", "mallory", "hi").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "UNKNOWN_RECEIVER");

        let response = cluster.post("/fail/S9").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_SHARD");

        // Rejected writes consume no rotation slot.
        assert_eq!(cluster.route_ok(1, "alice", "bob").await, "S1");
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_by_shard() {
        let cluster = Cluster::with_shards(&["S1"], StorageBackend::Memory, false).await;
        cluster.route_ok(1, "alice", "bob").await;

        let response = cluster.route(1, "alice", "bob", "again").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "DUPLICATE_ID");
        assert_eq!(body["message_id"], 1);
    }

    #[tokio::test]
    async fn test_dead_shard_fails_write_without_failover() {
        let mut cluster = Cluster::start(StorageBackend::Memory, false).await;
        cluster.stop_shard("S2").await;

        assert_eq!(cluster.route_ok(1, "alice", "bob").await, "S1");

        let response = cluster.route(2, "alice", "bob", "lost").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "UPSTREAM_UNREACHABLE");

        // Health is operator-controlled; the cursor still moved past S2.
        assert_eq!(cluster.get_json("/servers").await["S2"], "UP");
        assert_eq!(cluster.route_ok(3, "alice", "bob").await, "S3");
    }

    // =============================================================================
    // DASHBOARD
    // =============================================================================

    #[tokio::test]
    async fn test_dashboard_reflects_routing() {
        let cluster = Cluster::start(StorageBackend::Memory, false).await;
        for id in 1..=4 {
            cluster.route_ok(id, "alice", "bob").await;
        }
        cluster.post("/fail/S3").await;

        let dashboard = cluster.get_json("/dashboard-data").await;
        assert_eq!(dashboard["algorithm"], "Round Robin");
        assert_eq!(dashboard["total_messages"], 4);
        assert_eq!(dashboard["server_load"]["S1"], 2);
        assert_eq!(dashboard["server_load"]["S3"], 1);
        assert_eq!(dashboard["server_status"]["S3"], "DOWN");
        assert_eq!(dashboard["available_servers"], serde_json::json!(["S1", "S2"]));
        assert_eq!(dashboard["last_routed"], "S1");

        let logs = dashboard["logs"].as_array().unwrap();
        assert_eq!(logs.last().unwrap(), "Server S3 marked DOWN");
        assert!(logs.iter().any(|entry| entry == "Message 4 routed to S1"));
    }
}
