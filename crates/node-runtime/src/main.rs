//! # ShardMail Node
//!
//! Entry point for shard nodes and the load balancer.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SM_ROLE` | `balancer` | `balancer`, `shard` or `standalone` |
//! | `SM_HTTP_HOST` | `0.0.0.0` | Listen address |
//! | `SM_HTTP_PORT` | `5000` (`5001` for shards) | Listen port |
//! | `SM_REQUEST_TIMEOUT_MS` | `30000` | Balancer request timeout |
//! | `SM_SHARDS` | `S1..S3` on `127.0.0.1:5001..5003` | `ID=URL` list (`ID` list when standalone) |
//! | `SM_SHARD_TIMEOUT_MS` | `5000` | Bound on each shard call |
//! | `SM_USERS` | none | `username:secret` list |
//! | `SM_SHARD_ID` | `S1` | Shard identity |
//! | `SM_BACKEND` | `json` | `memory`, `json`, `sqlite` or `rocksdb` |
//! | `SM_DATA_DIR` | `./data` | Backend files and lock |
//! | `SM_FAULT_INJECTION` | `false` | Mount `POST /corrupt/{id}` on shards |

use std::sync::Arc;

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRole, NodeRuntime};
use sm_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("invalid node configuration")?;

    let role = match config.role {
        NodeRole::Shard => format!("shard-{}", config.store.shard_id),
        other => other.as_str().to_string(),
    };
    init_telemetry(&TelemetryConfig::for_role(&role)).context("failed to initialize telemetry")?;

    let runtime = Arc::new(NodeRuntime::new(config));
    let mut server = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.start().await })
    };

    info!("Node is running. Press Ctrl+C to stop.");
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            runtime.shutdown();
            (&mut server).await
        }
        // Bind or open failures end the server before any signal arrives.
        finished = &mut server => finished,
    };

    match finished.context("server task panicked")? {
        Ok(()) => {
            info!("Node stopped");
            Ok(())
        }
        Err(e) => {
            error!("Node failed: {e:#}");
            Err(e)
        }
    }
}
