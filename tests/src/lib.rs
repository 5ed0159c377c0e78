//! # ShardMail Test Suite
//!
//! Cross-crate tests run against real HTTP nodes on ephemeral ports.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs      # Cluster: shard nodes + balancer over loopback
//!     ├── routing.rs      # Placement, fail/restore, error mapping
//!     ├── mailbox.rs      # Scatter-gather reads, locking, integrity
//!     └── persistence.rs  # File-backed shards across restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sm-tests
//! cargo test -p sm-tests integration::mailbox
//!
//! # Benchmarks
//! cargo bench -p sm-tests
//! ```

pub mod integration;
