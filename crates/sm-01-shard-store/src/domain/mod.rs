//! # Domain Layer
//!
//! Pure domain types for the Shard Store.
//!
//! ## Modules
//!
//! - `message` - Message records, identifiers, filters and ordering
//! - `errors` - Store and repository error types
//! - `integrity` - Content digest used for corruption detection (INVARIANT-2)
//! - `config` - Shard identity and backend selection

pub mod config;
pub mod errors;
pub mod integrity;
pub mod message;
