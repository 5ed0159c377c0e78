//! # Domain Layer
//!
//! Router state, shard health, the event log and dispatch errors.

pub mod config;
pub mod errors;
pub mod event_log;
pub mod health;
pub mod state;

pub use config::{DispatchConfig, DispatchConfigError, ShardDescriptor};
pub use errors::{DispatchError, ShardCallError};
pub use event_log::{EventLog, EVENT_LOG_CAPACITY};
pub use health::{HealthMap, HealthState};
pub use state::RouterState;
