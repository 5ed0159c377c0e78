//! Dispatcher configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sm_01_shard_store::ShardId;
use thiserror::Error;

/// Default bound on a single shard call.
pub const DEFAULT_SHARD_TIMEOUT_MS: u64 = 5_000;

/// One statically configured shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardDescriptor {
    pub id: ShardId,
    /// Base URL of the shard node, e.g. `http://127.0.0.1:5001`.
    pub endpoint: String,
}

impl ShardDescriptor {
    pub fn new(id: impl Into<ShardId>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Shard list and call bounds.
///
/// Shard order is both the initial rotation order and the probe order for
/// edit and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub shards: Vec<ShardDescriptor>,
    pub shard_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shards: vec![
                ShardDescriptor::new("S1", "http://127.0.0.1:5001"),
                ShardDescriptor::new("S2", "http://127.0.0.1:5002"),
                ShardDescriptor::new("S3", "http://127.0.0.1:5003"),
            ],
            shard_timeout_ms: DEFAULT_SHARD_TIMEOUT_MS,
        }
    }
}

impl DispatchConfig {
    pub fn shard_timeout(&self) -> Duration {
        Duration::from_millis(self.shard_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), DispatchConfigError> {
        if self.shards.is_empty() {
            return Err(DispatchConfigError::NoShards);
        }
        if self.shard_timeout_ms == 0 {
            return Err(DispatchConfigError::ZeroTimeout);
        }

        let mut seen = HashSet::new();
        for shard in &self.shards {
            if !seen.insert(shard.id.clone()) {
                return Err(DispatchConfigError::DuplicateShard(shard.id.to_string()));
            }
            if !(shard.endpoint.starts_with("http://") || shard.endpoint.starts_with("https://"))
            {
                return Err(DispatchConfigError::InvalidEndpoint {
                    shard_id: shard.id.to_string(),
                    endpoint: shard.endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchConfigError {
    #[error("at least one shard must be configured")]
    NoShards,

    #[error("shard {0} is configured twice")]
    DuplicateShard(String),

    #[error("shard {shard_id} has invalid endpoint {endpoint}")]
    InvalidEndpoint { shard_id: String, endpoint: String },

    #[error("shard timeout must be greater than zero")]
    ZeroTimeout,
}
