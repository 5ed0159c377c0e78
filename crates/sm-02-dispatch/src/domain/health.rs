//! Shard health states.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sm_01_shard_store::ShardId;

/// Health of one shard as recorded by the registry.
///
/// Only explicit mark-down and mark-up operations change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Up,
    Down,
}

impl HealthState {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthState::Up)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Up => "UP",
            HealthState::Down => "DOWN",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of every configured shard, serialized as `{"S1": "UP", ...}`.
pub type HealthMap = BTreeMap<ShardId, HealthState>;
