//! Shard store configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use super::message::ShardId;

/// Persistence technology behind a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, for tests and demos.
    Memory,
    /// Whole-mailbox JSON document rewritten atomically on each mutation.
    Json,
    /// Relational store (SQLite).
    Sqlite,
    /// Embedded key-value store (RocksDB, `rocksdb` feature).
    Rocksdb,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Json => "json",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Rocksdb => "rocksdb",
        }
    }

    /// Whether the backend keeps files under the data directory.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, StorageBackend::Memory)
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = StoreConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "json" | "file" => Ok(StorageBackend::Json),
            "sqlite" | "relational" => Ok(StorageBackend::Sqlite),
            "rocksdb" | "kv" => Ok(StorageBackend::Rocksdb),
            other => Err(StoreConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration of a single shard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardStoreConfig {
    /// Identity stamped on every stored message.
    pub shard_id: ShardId,
    pub backend: StorageBackend,
    /// Directory holding backend files and the process lock.
    pub data_dir: PathBuf,
    /// Enables the corruption-injection endpoint. Off in production.
    pub fault_injection: bool,
}

impl Default for ShardStoreConfig {
    fn default() -> Self {
        Self {
            shard_id: ShardId::new("S1"),
            backend: StorageBackend::Json,
            data_dir: PathBuf::from("./data"),
            fault_injection: false,
        }
    }
}

impl ShardStoreConfig {
    pub fn validate(&self) -> Result<(), StoreConfigError> {
        let id = self.shard_id.as_str();
        if id.is_empty() {
            return Err(StoreConfigError::InvalidShardId(id.to_string()));
        }
        // Shard id becomes part of file names.
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreConfigError::InvalidShardId(id.to_string()));
        }
        #[cfg(not(feature = "rocksdb"))]
        if self.backend == StorageBackend::Rocksdb {
            return Err(StoreConfigError::BackendNotCompiled("rocksdb"));
        }
        Ok(())
    }

    /// Location of the backend's files for this shard.
    pub fn storage_path(&self) -> PathBuf {
        let id = self.shard_id.as_str();
        match self.backend {
            StorageBackend::Memory => self.data_dir.clone(),
            StorageBackend::Json => self.data_dir.join(format!("{id}_messages.json")),
            StorageBackend::Sqlite => self.data_dir.join(format!("{id}_messages.db")),
            StorageBackend::Rocksdb => self.data_dir.join(format!("{id}_rocksdb")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreConfigError {
    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),
    #[error("invalid shard id: {0:?}")]
    InvalidShardId(String),
    #[error("storage backend {0} is not compiled into this binary")]
    BackendNotCompiled(&'static str),
}
