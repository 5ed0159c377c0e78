//! # RocksDB Message Repository
//!
//! Embedded key-value backend for a shard.
//!
//! ## Layout
//!
//! - key: message id, 8 bytes big-endian (ids iterate in numeric order)
//! - value: the `StoredMessage` as JSON
//!
//! Batch updates go through a single `WriteBatch`.

use crate::domain::errors::RepositoryError;
use crate::domain::message::{MessageFilter, MessageId, StoredMessage};
use crate::ports::outbound::MessageRepository;
use rocksdb::{IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;

const BACKEND: &str = "rocksdb";

pub struct RocksDbRepository {
    db: DB,
    sync_writes: bool,
}

impl RocksDbRepository {
    /// Open or create the database directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        Self::open_with(path, true)
    }

    /// Open without fsync on each write, for tests.
    pub fn open_for_testing(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        Self::open_with(path, false)
    }

    fn open_with(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self, RepositoryError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| RepositoryError::backend(BACKEND, format!("open failed: {e}")))?;
        Ok(Self { db, sync_writes })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn scan(&self) -> Result<Vec<StoredMessage>, RepositoryError> {
        let mut out = Vec::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (_, value) = item.map_err(|e| RepositoryError::backend(BACKEND, e))?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn exists(&self, id: MessageId) -> Result<bool, RepositoryError> {
        self.db
            .get_pinned(key(id))
            .map(|v| v.is_some())
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }
}

fn key(id: MessageId) -> [u8; 8] {
    id.to_be_bytes()
}

impl MessageRepository for RocksDbRepository {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError> {
        if self.exists(message.id)? {
            return Err(RepositoryError::DuplicateKey { id: message.id });
        }
        let value = serde_json::to_vec(&message)?;
        self.db
            .put_opt(key(message.id), value, &self.write_opts())
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError> {
        let raw = self
            .db
            .get_pinned(key(id))
            .map_err(|e| RepositoryError::backend(BACKEND, e))?;
        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::default();
        for message in &messages {
            if !self.exists(message.id)? {
                return Err(RepositoryError::backend(
                    BACKEND,
                    format!("update of unknown message {}", message.id),
                ));
            }
            batch.put(key(message.id), serde_json::to_vec(message)?);
        }
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError> {
        if !self.exists(id)? {
            return Ok(false);
        }
        self.db
            .delete_opt(key(id), &self.write_opts())
            .map_err(|e| RepositoryError::backend(BACKEND, e))?;
        Ok(true)
    }

    fn find_by(&self, filter: &MessageFilter) -> Result<Vec<StoredMessage>, RepositoryError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect())
    }

    fn remove_by(&mut self, filter: &MessageFilter) -> Result<usize, RepositoryError> {
        let doomed = self.find_by(filter)?;
        if doomed.is_empty() {
            return Ok(0);
        }
        let mut batch = WriteBatch::default();
        for message in &doomed {
            batch.delete(key(message.id));
        }
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(|e| RepositoryError::backend(BACKEND, e))?;
        Ok(doomed.len())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let mut count = 0;
        for item in self.db.iterator(IteratorMode::Start) {
            item.map_err(|e| RepositoryError::backend(BACKEND, e))?;
            count += 1;
        }
        Ok(count)
    }
}
