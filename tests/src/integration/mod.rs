//! End-to-end flows through the balancer and shard nodes.

pub mod harness;

mod mailbox;
mod persistence;
mod routing;
