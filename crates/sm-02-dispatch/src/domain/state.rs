//! # Router State
//!
//! Everything the write path mutates: health map, rotation set, cursor,
//! last routed shard and the event log. One instance lives behind a single
//! mutex in the dispatch service; shard I/O never happens while it is held.

use sm_01_shard_store::ShardId;

use super::errors::DispatchError;
use super::event_log::EventLog;
use super::health::{HealthMap, HealthState};
use crate::algorithms::round_robin;

#[derive(Debug, Clone)]
pub struct RouterState {
    health: HealthMap,
    rotation: Vec<ShardId>,
    cursor: usize,
    last_routed: Option<ShardId>,
    events: EventLog,
}

impl RouterState {
    /// All shards start UP, in configured order.
    pub fn new(shards: impl IntoIterator<Item = ShardId>) -> Self {
        let rotation: Vec<ShardId> = shards.into_iter().collect();
        let health = rotation
            .iter()
            .map(|id| (id.clone(), HealthState::Up))
            .collect();
        Self {
            health,
            rotation,
            cursor: 0,
            last_routed: None,
            events: EventLog::new(),
        }
    }

    /// Resolve a raw id against the static configuration.
    pub fn resolve(&self, raw: &str) -> Result<ShardId, DispatchError> {
        let id = ShardId::new(raw);
        if self.health.contains_key(&id) {
            Ok(id)
        } else {
            Err(DispatchError::InvalidShard {
                shard_id: raw.to_string(),
            })
        }
    }

    /// Set DOWN and drop from the rotation set. Idempotent.
    pub fn mark_down(&mut self, id: &ShardId) {
        self.health.insert(id.clone(), HealthState::Down);
        self.rotation.retain(|candidate| candidate != id);
    }

    /// Set UP and append to the end of the rotation set if absent. Idempotent.
    pub fn mark_up(&mut self, id: &ShardId) {
        self.health.insert(id.clone(), HealthState::Up);
        if !self.rotation.contains(id) {
            self.rotation.push(id.clone());
        }
    }

    pub fn select_shard(&mut self) -> Result<ShardId, DispatchError> {
        round_robin::select_shard(&self.rotation, &self.health, &mut self.cursor)
    }

    pub fn record_routed(&mut self, id: ShardId) {
        self.last_routed = Some(id);
    }

    pub fn health(&self) -> &HealthMap {
        &self.health
    }

    pub fn rotation(&self) -> &[ShardId] {
        &self.rotation
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_routed(&self) -> Option<&ShardId> {
        self.last_routed.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ShardId> {
        raw.iter().map(|s| ShardId::new(*s)).collect()
    }

    #[test]
    fn test_restore_appends_to_end() {
        let mut state = RouterState::new(ids(&["A", "B", "C"]));
        let a = state.resolve("A").unwrap();

        state.mark_down(&a);
        assert_eq!(state.rotation(), ids(&["B", "C"]).as_slice());
        assert_eq!(state.health()[&a], HealthState::Down);

        state.mark_up(&a);
        assert_eq!(state.rotation(), ids(&["B", "C", "A"]).as_slice());
        assert_eq!(state.health()[&a], HealthState::Up);
    }

    #[test]
    fn test_mark_operations_are_idempotent() {
        let mut state = RouterState::new(ids(&["A", "B"]));
        let b = ShardId::new("B");

        state.mark_down(&b);
        state.mark_down(&b);
        assert_eq!(state.rotation(), ids(&["A"]).as_slice());

        state.mark_up(&b);
        state.mark_up(&b);
        assert_eq!(state.rotation(), ids(&["A", "B"]).as_slice());
    }

    #[test]
    fn test_unknown_shard_is_invalid() {
        let state = RouterState::new(ids(&["A"]));
        assert_eq!(
            state.resolve("Z"),
            Err(DispatchError::InvalidShard {
                shard_id: "Z".to_string()
            })
        );
    }

    #[test]
    fn test_select_advances_cursor() {
        let mut state = RouterState::new(ids(&["A", "B"]));
        assert_eq!(state.select_shard().unwrap().as_str(), "A");
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.select_shard().unwrap().as_str(), "B");
        assert_eq!(state.cursor(), 0);
    }
}
