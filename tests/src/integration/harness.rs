//! # Cluster Harness
//!
//! Spawns shard nodes and a balancer on loopback ephemeral ports and drives
//! them over real HTTP, the same way a browser client would.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use sm_01_shard_store::adapters::http::shard_router;
use sm_01_shard_store::{ShardId, ShardStore, ShardStoreConfig, StorageBackend, SystemClock};
use sm_02_dispatch::{
    DispatchApi, DispatchService, HttpShardClient, InMemoryUserDirectory, ShardClient,
    ShardDescriptor,
};
use sm_03_api_gateway::{ApiGatewayService, GatewayConfig};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Secret shared by every registered test user.
pub const SECRET: &str = "pw";

/// Users registered with every balancer.
pub const USERS: [&str; 3] = ["alice", "bob", "carol"];

/// Per-call shard bound used by the balancer under test.
pub const SHARD_TIMEOUT: Duration = Duration::from_secs(2);

/// One shard node serving its store over HTTP.
pub struct ShardNode {
    pub id: String,
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ShardNode {
    /// Open the store described by `config` and serve it on a fresh port.
    pub async fn spawn(config: ShardStoreConfig) -> Self {
        let store = ShardStore::open(&config, Arc::new(SystemClock)).expect("open shard store");
        let router = shard_router(store.into_shared(), config.fault_injection);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind shard listener");
        let url = format!("http://{}", listener.local_addr().expect("shard address"));

        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
                .expect("shard server");
        });

        Self {
            id: config.shard_id.to_string(),
            url,
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    /// Stop serving and wait until the store (and its data directory lock)
    /// has been released.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

impl Drop for ShardNode {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Store configuration for a shard under `dir`.
pub fn store_config(
    id: &str,
    backend: StorageBackend,
    dir: &std::path::Path,
    fault_injection: bool,
) -> ShardStoreConfig {
    ShardStoreConfig {
        shard_id: ShardId::new(id),
        backend,
        data_dir: dir.to_path_buf(),
        fault_injection,
    }
}

/// Shard nodes behind one balancer.
pub struct Cluster {
    pub url: String,
    pub client: Client,
    shards: Vec<ShardNode>,
    balancer_shutdown: Option<oneshot::Sender<()>>,
    _data_dir: TempDir,
}

impl Cluster {
    /// S1, S2 and S3 on `backend`.
    pub async fn start(backend: StorageBackend, fault_injection: bool) -> Self {
        Self::with_shards(&["S1", "S2", "S3"], backend, fault_injection).await
    }

    pub async fn with_shards(ids: &[&str], backend: StorageBackend, fault_injection: bool) -> Self {
        let data_dir = tempfile::tempdir().expect("temp data dir");

        let mut shards = Vec::with_capacity(ids.len());
        for id in ids {
            shards.push(
                ShardNode::spawn(store_config(id, backend, data_dir.path(), fault_injection)).await,
            );
        }

        let mut clients: Vec<Arc<dyn ShardClient>> = Vec::with_capacity(shards.len());
        for shard in &shards {
            let descriptor = ShardDescriptor::new(shard.id.as_str(), shard.url.as_str());
            clients.push(Arc::new(
                HttpShardClient::new(&descriptor, SHARD_TIMEOUT).expect("shard client"),
            ));
        }

        let directory: InMemoryUserDirectory =
            USERS.iter().map(|user| (*user, SECRET)).collect();
        let dispatch: Arc<dyn DispatchApi> = Arc::new(DispatchService::new(
            clients,
            Arc::new(directory),
            SHARD_TIMEOUT,
        ));
        let gateway =
            ApiGatewayService::new(GatewayConfig::default(), dispatch).expect("gateway config");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind balancer listener");
        let url = format!("http://{}", listener.local_addr().expect("balancer address"));

        let (balancer_shutdown, signal) = oneshot::channel::<()>();
        tokio::spawn(async move {
            gateway
                .serve_with_shutdown(listener, async {
                    let _ = signal.await;
                })
                .await
                .expect("balancer server");
        });

        Self {
            url,
            client: Client::new(),
            shards,
            balancer_shutdown: Some(balancer_shutdown),
            _data_dir: data_dir,
        }
    }

    pub fn shard(&self, id: &str) -> &ShardNode {
        self.shards
            .iter()
            .find(|shard| shard.id == id)
            .expect("shard is part of the cluster")
    }

    /// Take a shard node offline without telling the balancer.
    pub async fn stop_shard(&mut self, id: &str) {
        let shard = self
            .shards
            .iter_mut()
            .find(|shard| shard.id == id)
            .expect("shard is part of the cluster");
        shard.stop().await;
    }

    pub async fn route(&self, id: u64, sender: &str, receiver: &str, content: &str) -> Response {
        self.client
            .post(format!("{}/route", self.url))
            .json(&serde_json::json!({
                "id": id,
                "sender": sender,
                "receiver": receiver,
                "content": content,
            }))
            .send()
            .await
            .expect("route request")
    }

    /// Route and return the shard id the balancer chose.
    pub async fn route_ok(&self, id: u64, sender: &str, receiver: &str) -> String {
        let response = self.route(id, sender, receiver, &format!("message {id}")).await;
        assert!(
            response.status().is_success(),
            "route {id} failed with {}",
            response.status()
        );
        let body: Value = response.json().await.expect("route body");
        body["routed_to"].as_str().expect("routed_to").to_string()
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.url, path))
            .send()
            .await
            .expect("GET request")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.get(path).await.json().await.expect("JSON body")
    }

    pub async fn post(&self, path: &str) -> Response {
        self.client
            .post(format!("{}{}", self.url, path))
            .send()
            .await
            .expect("POST request")
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Response {
        self.client
            .put(format!("{}{}", self.url, path))
            .json(&body)
            .send()
            .await
            .expect("PUT request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(format!("{}{}", self.url, path))
            .send()
            .await
            .expect("DELETE request")
    }

    /// Flip a stored message's content behind its checksum, directly on the shard.
    pub async fn corrupt(&self, shard_id: &str, message_id: u64) -> Response {
        self.client
            .post(self.shard(shard_id).endpoint(&format!("/corrupt/{message_id}")))
            .send()
            .await
            .expect("corrupt request")
    }

    /// Message count reported by the shard node itself.
    pub async fn shard_count(&self, shard_id: &str) -> u64 {
        let stats: Value = self
            .client
            .get(self.shard(shard_id).endpoint("/stats"))
            .send()
            .await
            .expect("stats request")
            .json()
            .await
            .expect("stats body");
        stats["message_count"].as_u64().expect("message_count")
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        if let Some(shutdown) = self.balancer_shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Ids of a mailbox listing, in listed order.
pub fn ids(messages: &Value) -> Vec<u64> {
    messages
        .as_array()
        .map(|list| list.iter().filter_map(|m| m["id"].as_u64()).collect())
        .unwrap_or_default()
}
