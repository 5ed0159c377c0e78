//! Role wiring: builds the subsystems a node needs and serves them.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use sm_01_shard_store::adapters::http::shard_router;
use sm_01_shard_store::{ShardStore, ShardStoreConfig, SystemClock};
use sm_02_dispatch::{
    DispatchApi, DispatchService, HttpShardClient, InMemoryUserDirectory, InProcessShardClient,
    ShardClient, UserDirectory,
};
use sm_03_api_gateway::ApiGatewayService;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{NodeConfig, NodeRole};

/// A configured node, ready to bind and serve.
pub struct NodeRuntime {
    config: NodeConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Bind the configured address and serve until [`shutdown`](Self::shutdown).
    pub async fn start(&self) -> Result<()> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.serve_on(listener).await
    }

    /// Serve the configured role on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let signal = async move {
            let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
        };

        info!(
            role = self.config.role.as_str(),
            "[node] Starting ShardMail node v{}",
            env!("CARGO_PKG_VERSION")
        );

        match self.config.role {
            NodeRole::Shard => self.serve_shard(listener, signal).await,
            NodeRole::Balancer => {
                let dispatch = self.remote_dispatch()?;
                self.serve_balancer(dispatch, listener, signal).await
            }
            NodeRole::Standalone => {
                let dispatch = self.standalone_dispatch().await?;
                self.serve_balancer(dispatch, listener, signal).await
            }
        }
    }

    /// Stop a node started with [`start`](Self::start) or [`serve_on`](Self::serve_on).
    pub fn shutdown(&self) {
        info!("[node] Shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    async fn serve_shard<F>(&self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let store_config = &self.config.store;
        let store = open_store(store_config.clone(), Arc::new(SystemClock)).await?;
        if store_config.fault_injection {
            warn!(
                "[sm-01] Fault injection enabled on shard {}",
                store_config.shard_id
            );
        }

        let router = shard_router(store.into_shared(), store_config.fault_injection)
            .layer(TraceLayer::new_for_http());
        let local = listener.local_addr()?;
        info!(
            addr = %local,
            backend = store_config.backend.as_str(),
            "[sm-01] Shard {} listening",
            store_config.shard_id
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await
            .context("shard server failed")?;
        info!("[sm-01] Shard {} stopped", store_config.shard_id);
        Ok(())
    }

    async fn serve_balancer<F>(
        &self,
        dispatch: Arc<dyn DispatchApi>,
        listener: TcpListener,
        signal: F,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let gateway = ApiGatewayService::new(self.config.gateway.clone(), dispatch)
            .context("invalid gateway configuration")?;
        gateway
            .serve_with_shutdown(listener, signal)
            .await
            .context("balancer server failed")
    }

    /// Balancer over shard nodes reached by HTTP.
    fn remote_dispatch(&self) -> Result<Arc<dyn DispatchApi>> {
        let timeout = self.config.dispatch.shard_timeout();
        let mut shards: Vec<Arc<dyn ShardClient>> = Vec::new();
        for descriptor in &self.config.dispatch.shards {
            let client = HttpShardClient::new(descriptor, timeout)
                .with_context(|| format!("failed to set up client for shard {}", descriptor.id))?;
            info!(
                "[sm-02] Shard {} at {}",
                descriptor.id, descriptor.endpoint
            );
            shards.push(Arc::new(client));
        }
        Ok(Arc::new(DispatchService::new(
            shards,
            self.directory(),
            timeout,
        )))
    }

    /// Balancer with every shard opened in this process.
    async fn standalone_dispatch(&self) -> Result<Arc<dyn DispatchApi>> {
        let clock = Arc::new(SystemClock);
        let mut shards: Vec<Arc<dyn ShardClient>> = Vec::new();
        for store_config in self.config.standalone_stores() {
            let store = open_store(store_config.clone(), clock.clone()).await?;
            info!(
                backend = store_config.backend.as_str(),
                "[sm-01] Shard {} opened in-process",
                store_config.shard_id
            );
            shards.push(Arc::new(InProcessShardClient::new(store.into_shared())));
        }
        Ok(Arc::new(DispatchService::new(
            shards,
            self.directory(),
            self.config.dispatch.shard_timeout(),
        )))
    }

    fn directory(&self) -> Arc<dyn UserDirectory> {
        if self.config.users.is_empty() {
            warn!("[node] No users registered, every route request will be rejected");
        }
        let directory: InMemoryUserDirectory = self
            .config
            .users
            .iter()
            .map(|(user, secret)| (user.as_str(), secret.as_str()))
            .collect();
        Arc::new(directory)
    }
}

/// Open a shard store on the blocking pool; taking the data-dir lock may
/// sleep while it retries.
async fn open_store(config: ShardStoreConfig, clock: Arc<SystemClock>) -> Result<ShardStore> {
    let shard_id = config.shard_id.clone();
    tokio::task::spawn_blocking(move || ShardStore::open(&config, clock))
        .await
        .with_context(|| format!("open task for shard {shard_id} failed"))?
        .with_context(|| format!("failed to open shard {shard_id}"))
}
