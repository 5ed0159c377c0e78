//! Health registry operations.

use sm_telemetry::SHARD_UP;

use super::{log_event, DispatchService};
use crate::domain::errors::DispatchError;
use crate::domain::health::HealthMap;

impl DispatchService {
    /// Set a shard DOWN and remove it from the rotation set.
    pub fn mark_down(&self, shard_id: &str) -> Result<HealthMap, DispatchError> {
        let mut state = self.state.lock();
        let id = state.resolve(shard_id)?;
        state.mark_down(&id);
        SHARD_UP.with_label_values(&[id.as_str()]).set(0.0);
        log_event(&mut state, format!("Server {id} marked DOWN"));
        Ok(state.health().clone())
    }

    /// Set a shard UP and append it to the end of the rotation set.
    pub fn mark_up(&self, shard_id: &str) -> Result<HealthMap, DispatchError> {
        let mut state = self.state.lock();
        let id = state.resolve(shard_id)?;
        state.mark_up(&id);
        SHARD_UP.with_label_values(&[id.as_str()]).set(1.0);
        log_event(&mut state, format!("Server {id} restored"));
        Ok(state.health().clone())
    }

    pub fn health_map(&self) -> HealthMap {
        self.state.lock().health().clone()
    }
}
