//! # Adapters Layer
//!
//! - `http_client` - shard nodes over HTTP (reqwest)
//! - `in_process` - shards living in the dispatcher's own process
//! - `user_directory` - in-memory credential store

pub mod http_client;
pub mod in_process;
pub mod user_directory;

pub use http_client::HttpShardClient;
pub use in_process::InProcessShardClient;
pub use user_directory::InMemoryUserDirectory;
