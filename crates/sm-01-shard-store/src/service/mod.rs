//! # Shard Store Service
//!
//! The single implementation of `ShardStoreApi`, generic over its repository.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `ShardStoreApi` on top of any `MessageRepository`
//! 2. Enforces all 4 domain invariants
//! 3. Takes its clock by injection so send times are testable

mod store;

pub use store::CORRUPTED_CONTENT;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::adapters::infra::SystemClock;
use crate::adapters::lock::DataDirLock;
use crate::adapters::storage::{open_repository, BoxedRepository, InMemoryMessageRepository};
use crate::domain::config::ShardStoreConfig;
use crate::domain::errors::ShardStoreError;
use crate::domain::message::ShardId;
use crate::ports::outbound::{Clock, MessageRepository};

/// The Shard Store Service.
pub struct ShardStoreService<R: MessageRepository> {
    pub(crate) shard_id: ShardId,
    pub(crate) repo: R,
    pub(crate) clock: Arc<dyn Clock>,
    /// Held for the lifetime of a file-backed shard.
    _lock: Option<DataDirLock>,
}

/// Shard with its backend chosen at runtime.
pub type ShardStore = ShardStoreService<BoxedRepository>;

/// Handle shared between a shard's HTTP handlers or an in-process dispatcher.
pub type SharedShardStore = Arc<RwLock<ShardStore>>;

impl<R: MessageRepository> ShardStoreService<R> {
    pub fn new(shard_id: ShardId, repo: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            shard_id,
            repo,
            clock,
            _lock: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }
}

impl ShardStoreService<InMemoryMessageRepository> {
    /// Volatile shard on the system clock.
    pub fn in_memory(shard_id: ShardId) -> Self {
        Self::new(
            shard_id,
            InMemoryMessageRepository::new(),
            Arc::new(SystemClock),
        )
    }
}

impl ShardStore {
    /// Open the shard described by `config`, taking the data directory lock
    /// for file-backed backends.
    pub fn open(config: &ShardStoreConfig, clock: Arc<dyn Clock>) -> Result<Self, ShardStoreError> {
        let lock = if config.backend.is_persistent() {
            let lock = DataDirLock::acquire(&config.data_dir, config.shard_id.as_str()).map_err(
                |e| ShardStoreError::StorageUnavailable {
                    message: e.to_string(),
                },
            )?;
            Some(lock)
        } else {
            None
        };

        let repo = open_repository(config)?;
        let mut service = Self::new(config.shard_id.clone(), repo, clock);
        service._lock = lock;
        Ok(service)
    }

    pub fn into_shared(self) -> SharedShardStore {
        Arc::new(RwLock::new(self))
    }
}
