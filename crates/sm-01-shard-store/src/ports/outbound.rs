//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the Shard Store service.

use chrono::{DateTime, Utc};

use crate::domain::errors::RepositoryError;
use crate::domain::message::{MessageFilter, MessageId, StoredMessage};

/// Abstract persistence for one shard's messages.
///
/// Production: `JsonFileRepository`, `SqliteRepository`, `RocksDbRepository`
/// Testing: `InMemoryMessageRepository`
pub trait MessageRepository: Send + Sync {
    /// Short backend label for logs and the shard banner.
    fn backend_name(&self) -> &'static str;

    /// Insert a new record. Fails with `DuplicateKey` if the id exists.
    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError>;

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError>;

    /// Overwrite existing records.
    ///
    /// ## Atomicity
    ///
    /// Either ALL records in the batch are written, or NONE are.
    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError>;

    /// Remove a record. Returns whether it existed.
    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError>;

    /// All records matching the filter, in no particular order.
    fn find_by(&self, filter: &MessageFilter) -> Result<Vec<StoredMessage>, RepositoryError>;

    /// Remove all records matching the filter. Returns the number removed.
    fn remove_by(&mut self, filter: &MessageFilter) -> Result<usize, RepositoryError>;

    fn count(&self) -> Result<usize, RepositoryError>;
}

impl<R: MessageRepository + ?Sized> MessageRepository for Box<R> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError> {
        (**self).insert(message)
    }

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError> {
        (**self).get(id)
    }

    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError> {
        (**self).update_batch(messages)
    }

    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError> {
        (**self).remove(id)
    }

    fn find_by(&self, filter: &MessageFilter) -> Result<Vec<StoredMessage>, RepositoryError> {
        (**self).find_by(filter)
    }

    fn remove_by(&mut self, filter: &MessageFilter) -> Result<usize, RepositoryError> {
        (**self).remove_by(filter)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        (**self).count()
    }
}

/// Abstract interface for wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
