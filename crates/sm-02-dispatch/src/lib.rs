//! # Dispatch (sm-02)
//!
//! Hides sharding from clients: places each write on a healthy shard in
//! round-robin order and rebuilds mailboxes by querying every shard.
//!
//! ## Components
//!
//! | Component | Responsibility |
//! |-----------|----------------|
//! | Health Registry | UP/DOWN per shard, feeds the rotation set |
//! | Round-Robin Router | Picks a shard per write, forwards it, records the outcome |
//! | Aggregator | Fan-out reads and clears, sequential probes for edit/delete |
//! | Event Log | Last 20 operational events |
//!
//! ## Failure Semantics
//!
//! - A write goes to exactly one shard. A failed forward is not retried elsewhere.
//! - Fan-out reads skip failing shards and report no partial-failure marker.
//! - Message ids are unique per shard only. The inbox merge keeps the first
//!   copy of a colliding id and logs the collision.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! ```text
//! sm-02-dispatch/
//! ├── domain/       # RouterState, health, event log, errors, config
//! ├── algorithms/   # round robin selection, mailbox merge
//! ├── ports/        # DispatchApi (inbound), ShardClient + UserDirectory (outbound)
//! ├── adapters/     # HTTP and in-process shard clients, user directory
//! └── service/      # DispatchService
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{HttpShardClient, InMemoryUserDirectory, InProcessShardClient};
pub use algorithms::{merge_inbox, merge_sent, select_shard};
pub use domain::{
    DispatchConfig, DispatchConfigError, DispatchError, EventLog, HealthMap, HealthState,
    RouterState, ShardCallError, ShardDescriptor, EVENT_LOG_CAPACITY,
};
pub use ports::{
    DashboardSnapshot, DispatchApi, HistoryKind, MutationOutcome, RouteOutcome, ShardClient,
    UserDirectory,
};
pub use service::DispatchService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
