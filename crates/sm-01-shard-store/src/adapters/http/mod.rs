//! # Shard Node HTTP Surface
//!
//! Exposes one shard's store over HTTP so a dispatcher in another process can
//! reach it.

mod routes;
pub mod types;

pub use routes::{shard_router, status_for};
pub use types::{
    ClearReceipt, EditRequest, MutationReceipt, ReceiveReceipt, ShardBanner, ShardErrorBody,
};
