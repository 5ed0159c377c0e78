//! # ShardMail Node Runtime
//!
//! Wires the subsystems into a runnable node. One binary serves every role:
//!
//! | Role | Serves | Shards reached through |
//! |------|--------|------------------------|
//! | `shard` | sm-01 shard node surface | (is a shard) |
//! | `balancer` | sm-03 balancer surface | `HttpShardClient` |
//! | `standalone` | sm-03 balancer surface | `InProcessShardClient` |
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `SM_*` environment variables
//! 2. Initialize telemetry (logging + metrics registry)
//! 3. Open stores or build shard clients for the role
//! 4. Serve until Ctrl+C, then drain in-flight requests

pub mod config;
pub mod runtime;

pub use config::{NodeConfig, NodeConfigError, NodeRole, DEFAULT_SHARD_PORT};
pub use runtime::NodeRuntime;
