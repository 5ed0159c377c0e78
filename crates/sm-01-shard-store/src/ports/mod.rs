//! # Ports Layer
//!
//! - `inbound` - `ShardStoreApi`, what the shard exposes
//! - `outbound` - `MessageRepository` and `Clock`, what the shard requires

pub mod inbound;
pub mod outbound;
