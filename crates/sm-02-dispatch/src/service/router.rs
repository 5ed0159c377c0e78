//! Write path: receiver check, shard selection, forward, record.

use sm_01_shard_store::NewMessage;
use sm_telemetry::{MESSAGES_ROUTED, ROUTING_FAILURES};
use tracing::warn;

use super::{log_event, DispatchService};
use crate::domain::errors::{DispatchError, ShardCallError};
use crate::ports::inbound::RouteOutcome;

impl DispatchService {
    /// Place `message` on the next healthy shard.
    ///
    /// Once a shard is selected its outcome is final: a failed forward is
    /// returned to the caller and no other shard is tried.
    pub async fn route_write(&self, message: NewMessage) -> Result<RouteOutcome, DispatchError> {
        self.try_route(message).await.inspect_err(|err| {
            ROUTING_FAILURES
                .with_label_values(&[err.routing_reason()])
                .inc();
        })
    }

    async fn try_route(&self, message: NewMessage) -> Result<RouteOutcome, DispatchError> {
        if !self.directory.exists(&message.receiver) {
            return Err(DispatchError::UnknownReceiver {
                username: message.receiver,
            });
        }

        let shard_id = self.state.lock().select_shard()?;
        let client = self.client(&shard_id).ok_or_else(|| DispatchError::UpstreamUnreachable {
            shard_id: shard_id.clone(),
            reason: "no client configured".to_string(),
        })?;

        let message_id = message.id;
        let receipt = self
            .call(&shard_id, "receive", client.receive(message))
            .await
            .map_err(|err: ShardCallError| {
                warn!(
                    "[sm-02] Message {} not placed on {}: {}",
                    message_id, shard_id, err
                );
                err.into_dispatch(shard_id.clone())
            })?;

        {
            let mut state = self.state.lock();
            state.record_routed(shard_id.clone());
            log_event(
                &mut state,
                format!("Message {message_id} routed to {shard_id}"),
            );
        }
        MESSAGES_ROUTED.with_label_values(&[shard_id.as_str()]).inc();

        Ok(RouteOutcome {
            routed_to: shard_id,
            server_response: receipt,
        })
    }
}
