//! # Ports Layer
//!
//! - **Inbound**: `DispatchApi`, what the gateway drives
//! - **Outbound**: `ShardClient` per shard, `UserDirectory` for receivers

pub mod inbound;
pub mod outbound;

pub use inbound::{DashboardSnapshot, DispatchApi, HistoryKind, MutationOutcome, RouteOutcome};
pub use outbound::{ShardClient, UserDirectory};
