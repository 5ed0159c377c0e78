//! # Algorithms Module
//!
//! Pure placement and merge logic, free of I/O and locking.

pub mod merge;
pub mod round_robin;

pub use merge::{merge_inbox, merge_sent};
pub use round_robin::select_shard;
