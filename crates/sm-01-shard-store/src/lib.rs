//! # Shard Store (sm-01)
//!
//! One independently-failing partition of the message space. Every shard in a
//! deployment runs the same store contract regardless of which persistence
//! technology sits underneath it.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Shard-local Uniqueness | A message id exists at most once per shard |
//! | 2 | Content Integrity | Stored checksum is recomputed on every receiver read |
//! | 3 | All-or-nothing Delivery | A corrupted batch transitions no message to READ |
//! | 4 | Lock-on-read | READ messages cannot be edited or deleted |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Messages, errors, integrity digest, backend configuration
//! - `ports/` - `ShardStoreApi` (inbound) and `MessageRepository`/`Clock` (outbound)
//! - `adapters/` - Memory, JSON file, SQLite and RocksDB repositories, clocks,
//!   data directory lock, shard node HTTP surface
//! - `service/` - `ShardStoreService`, the single implementation of the contract
//!
//! ## Usage
//!
//! ```ignore
//! use sm_01_shard_store::{NewMessage, ShardId, ShardStoreApi, ShardStoreService};
//!
//! let mut store = ShardStoreService::in_memory(ShardId::new("S1"));
//! store.receive(NewMessage::new(1, "alice", "bob", "hi"))?;
//! let inbox = store.list_for_receiver("bob")?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::infra::{ManualClock, SystemClock};
pub use adapters::lock::{DataDirLock, LockError};
pub use adapters::storage::{
    open_repository, BoxedRepository, InMemoryMessageRepository, JsonFileRepository,
    SqliteRepository,
};
#[cfg(feature = "rocksdb")]
pub use adapters::storage::RocksDbRepository;
pub use domain::config::{ShardStoreConfig, StorageBackend, StoreConfigError};
pub use domain::errors::{RepositoryError, ShardStoreError};
pub use domain::integrity::{content_hash, verify_integrity};
pub use domain::message::{
    sort_newest_first, MessageFilter, MessageId, MessageStatus, NewMessage, ShardId, ShardStats,
    StoredMessage,
};
pub use ports::inbound::ShardStoreApi;
pub use ports::outbound::{Clock, MessageRepository};
pub use service::{SharedShardStore, ShardStore, ShardStoreService, CORRUPTED_CONTENT};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
