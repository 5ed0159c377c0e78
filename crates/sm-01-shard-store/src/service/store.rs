//! `ShardStoreApi` implementation.

use super::ShardStoreService;
use crate::domain::errors::ShardStoreError;
use crate::domain::integrity::verify_integrity;
use crate::domain::message::{
    sort_newest_first, MessageFilter, MessageId, NewMessage, ShardId, ShardStats, StoredMessage,
};
use crate::ports::inbound::ShardStoreApi;
use crate::ports::outbound::MessageRepository;

/// Content written by fault injection.
pub const CORRUPTED_CONTENT: &str = "corrupted data";

impl<R: MessageRepository> ShardStoreService<R> {
    fn load_unread(&self, id: MessageId) -> Result<StoredMessage, ShardStoreError> {
        let message = self
            .repo
            .get(id)?
            .ok_or(ShardStoreError::MessageNotFound { id })?;
        if message.is_read() {
            return Err(ShardStoreError::MessageLocked { id });
        }
        Ok(message)
    }

    /// Overwrite a message's content without refreshing its digest.
    ///
    /// The next receiver read of that mailbox fails with `CorruptedMessage`.
    pub fn inject_corruption(&mut self, id: MessageId) -> Result<(), ShardStoreError> {
        let mut message = self
            .repo
            .get(id)?
            .ok_or(ShardStoreError::MessageNotFound { id })?;
        message.content = CORRUPTED_CONTENT.to_string();
        self.repo.update_batch(vec![message])?;
        tracing::warn!("[sm-01] Shard {} corrupted message {} on request", self.shard_id, id);
        Ok(())
    }
}

impl<R: MessageRepository> ShardStoreApi for ShardStoreService<R> {
    fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }

    fn receive(&mut self, message: NewMessage) -> Result<StoredMessage, ShardStoreError> {
        if self.repo.get(message.id)?.is_some() {
            return Err(ShardStoreError::DuplicateId { id: message.id });
        }
        let stored = StoredMessage::from_new(message, self.shard_id.clone(), self.clock.now());
        self.repo.insert(stored.clone())?;
        tracing::debug!(
            "[sm-01] Shard {} stored message {} for {}",
            self.shard_id,
            stored.id,
            stored.receiver
        );
        Ok(stored)
    }

    fn list_for_receiver(&mut self, receiver: &str) -> Result<Vec<StoredMessage>, ShardStoreError> {
        let mut messages = self
            .repo
            .find_by(&MessageFilter::ByReceiver(receiver.to_string()))?;
        sort_newest_first(&mut messages);

        // Verify the whole batch before anything transitions.
        if let Some(bad) = messages.iter().find(|m| !verify_integrity(m)) {
            tracing::warn!(
                "[sm-01] Shard {} integrity check failed for message {}",
                self.shard_id,
                bad.id
            );
            return Err(ShardStoreError::CorruptedMessage { id: bad.id });
        }

        let now = self.clock.now();
        let mut transitioned = Vec::new();
        for message in messages.iter_mut().filter(|m| !m.is_read()) {
            message.mark_read(now);
            transitioned.push(message.clone());
        }
        if !transitioned.is_empty() {
            self.repo.update_batch(transitioned)?;
        }
        Ok(messages)
    }

    fn list_sent(&self, sender: &str) -> Result<Vec<StoredMessage>, ShardStoreError> {
        let mut messages = self
            .repo
            .find_by(&MessageFilter::BySender(sender.to_string()))?;
        sort_newest_first(&mut messages);
        Ok(messages)
    }

    fn edit(&mut self, id: MessageId, new_content: String) -> Result<StoredMessage, ShardStoreError> {
        let mut message = self.load_unread(id)?;
        message.rewrite(new_content);
        self.repo.update_batch(vec![message.clone()])?;
        Ok(message)
    }

    fn delete(&mut self, id: MessageId) -> Result<(), ShardStoreError> {
        self.load_unread(id)?;
        if !self.repo.remove(id)? {
            return Err(ShardStoreError::MessageNotFound { id });
        }
        Ok(())
    }

    fn clear_sent_history(&mut self, sender: &str) -> Result<usize, ShardStoreError> {
        Ok(self
            .repo
            .remove_by(&MessageFilter::BySender(sender.to_string()))?)
    }

    fn clear_inbox_history(&mut self, receiver: &str) -> Result<usize, ShardStoreError> {
        Ok(self
            .repo
            .remove_by(&MessageFilter::ByReceiver(receiver.to_string()))?)
    }

    fn stats(&self) -> Result<ShardStats, ShardStoreError> {
        Ok(ShardStats {
            shard_id: self.shard_id.clone(),
            message_count: self.repo.count()?,
        })
    }
}
