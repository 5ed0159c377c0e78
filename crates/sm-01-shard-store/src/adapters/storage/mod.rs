//! Storage Adapters
//!
//! Implementations of the `MessageRepository` trait, one per persistence
//! technology a shard can run on.

mod json_file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;
mod sqlite;

pub use json_file::JsonFileRepository;
pub use memory::InMemoryMessageRepository;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksDbRepository;
pub use sqlite::SqliteRepository;

use crate::domain::config::{ShardStoreConfig, StorageBackend};
use crate::domain::errors::RepositoryError;
use crate::ports::outbound::MessageRepository;

/// Type-erased repository chosen at startup.
pub type BoxedRepository = Box<dyn MessageRepository>;

/// Open the repository selected by `config`.
pub fn open_repository(config: &ShardStoreConfig) -> Result<BoxedRepository, RepositoryError> {
    let path = config.storage_path();
    let repo: BoxedRepository = match config.backend {
        StorageBackend::Memory => Box::new(InMemoryMessageRepository::new()),
        StorageBackend::Json => Box::new(JsonFileRepository::open(&path)?),
        StorageBackend::Sqlite => Box::new(SqliteRepository::open(&path)?),
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => Box::new(RocksDbRepository::open(&path)?),
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => {
            return Err(RepositoryError::backend(
                "rocksdb",
                "not compiled in (enable the `rocksdb` feature)",
            ))
        }
    };
    tracing::info!(
        "[sm-01] Shard {} using {} storage at {}",
        config.shard_id,
        repo.backend_name(),
        path.display()
    );
    Ok(repo)
}
