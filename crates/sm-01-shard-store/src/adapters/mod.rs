//! # Adapters Layer
//!
//! - `storage` - `MessageRepository` backends
//! - `infra` - Clock implementations
//! - `lock` - Exclusive data directory lock
//! - `http` - Shard node HTTP surface (`http` feature)

#[cfg(feature = "http")]
pub mod http;
pub mod infra;
pub mod lock;
pub mod storage;
