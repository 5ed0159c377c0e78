//! # HTTP Shard Client
//!
//! Talks to a shard node's HTTP surface. Error bodies carrying a store error
//! code are rebuilt into `ShardCallError::Rejected`; any other failure is a
//! transport failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use sm_01_shard_store::adapters::http::{
    ClearReceipt, EditRequest, MutationReceipt, ReceiveReceipt, ShardErrorBody,
};
use sm_01_shard_store::{MessageId, NewMessage, ShardId, ShardStats, StoredMessage};
use tracing::debug;

use crate::domain::config::ShardDescriptor;
use crate::domain::errors::ShardCallError;
use crate::ports::outbound::ShardClient;

pub struct HttpShardClient {
    shard_id: ShardId,
    base_url: Url,
    client: Client,
    timeout: Duration,
}

impl HttpShardClient {
    pub fn new(descriptor: &ShardDescriptor, timeout: Duration) -> Result<Self, ShardCallError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShardCallError::Unreachable(format!("client setup failed: {e}")))?;
        Self::with_client(descriptor, client, timeout)
    }

    /// Share one connection pool across several shards.
    pub fn with_client(
        descriptor: &ShardDescriptor,
        client: Client,
        timeout: Duration,
    ) -> Result<Self, ShardCallError> {
        let base_url = Url::parse(&descriptor.endpoint).map_err(|e| {
            ShardCallError::Unreachable(format!("invalid endpoint {}: {e}", descriptor.endpoint))
        })?;
        Ok(Self {
            shard_id: descriptor.id.clone(),
            base_url,
            client,
            timeout,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ShardCallError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ShardCallError::Unreachable(format!("endpoint {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport(&self, err: reqwest::Error) -> ShardCallError {
        if err.is_timeout() {
            ShardCallError::Timeout(self.timeout)
        } else {
            ShardCallError::Unreachable(err.to_string())
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ShardCallError> {
        let response = request.send().await.map_err(|e| self.transport(e))?;
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                ShardCallError::Unreachable(format!("unreadable response from shard: {e}"))
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport(e))?;
        match serde_json::from_slice::<ShardErrorBody>(&body) {
            Ok(rejection) => {
                debug!(
                    "[sm-02] Shard {} rejected request: {}",
                    self.shard_id, rejection.error
                );
                Err(ShardCallError::Rejected(rejection.detail))
            }
            Err(_) => Err(ShardCallError::Unreachable(format!("HTTP {status}"))),
        }
    }
}

#[async_trait]
impl ShardClient for HttpShardClient {
    fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }

    async fn receive(&self, message: NewMessage) -> Result<ReceiveReceipt, ShardCallError> {
        let url = self.url(&["receive"])?;
        self.send(self.client.post(url).json(&message)).await
    }

    async fn list_for_receiver(
        &self,
        username: &str,
    ) -> Result<Vec<StoredMessage>, ShardCallError> {
        let url = self.url(&["messages", username])?;
        self.send(self.client.get(url)).await
    }

    async fn list_sent(&self, username: &str) -> Result<Vec<StoredMessage>, ShardCallError> {
        let url = self.url(&["sent", username])?;
        self.send(self.client.get(url)).await
    }

    async fn edit(&self, id: MessageId, content: String) -> Result<(), ShardCallError> {
        let url = self.url(&["edit", &id.to_string()])?;
        let _: MutationReceipt = self
            .send(self.client.put(url).json(&EditRequest { content }))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> Result<(), ShardCallError> {
        let url = self.url(&["delete", &id.to_string()])?;
        let _: MutationReceipt = self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn clear_sent_history(&self, username: &str) -> Result<usize, ShardCallError> {
        let url = self.url(&["sent-history", username])?;
        let receipt: ClearReceipt = self.send(self.client.delete(url)).await?;
        Ok(receipt.deleted)
    }

    async fn clear_inbox_history(&self, username: &str) -> Result<usize, ShardCallError> {
        let url = self.url(&["inbox-history", username])?;
        let receipt: ClearReceipt = self.send(self.client.delete(url)).await?;
        Ok(receipt.deleted)
    }

    async fn stats(&self) -> Result<ShardStats, ShardCallError> {
        let url = self.url(&["stats"])?;
        self.send(self.client.get(url)).await
    }
}
