use crate::domain::errors::RepositoryError;
use crate::domain::message::{MessageFilter, MessageId, StoredMessage};
use crate::ports::outbound::MessageRepository;
use std::collections::BTreeMap;

/// In-memory message repository for unit tests and demos.
///
/// Batch updates validate every id before applying anything.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    data: BTreeMap<MessageId, StoredMessage>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageRepository for InMemoryMessageRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError> {
        if self.data.contains_key(&message.id) {
            return Err(RepositoryError::DuplicateKey { id: message.id });
        }
        self.data.insert(message.id, message);
        Ok(())
    }

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError> {
        Ok(self.data.get(&id).cloned())
    }

    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError> {
        if let Some(missing) = messages.iter().find(|m| !self.data.contains_key(&m.id)) {
            return Err(RepositoryError::backend(
                "memory",
                format!("update of unknown message {}", missing.id),
            ));
        }
        for message in messages {
            self.data.insert(message.id, message);
        }
        Ok(())
    }

    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError> {
        Ok(self.data.remove(&id).is_some())
    }

    fn find_by(&self, filter: &MessageFilter) -> Result<Vec<StoredMessage>, RepositoryError> {
        Ok(self
            .data
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    fn remove_by(&mut self, filter: &MessageFilter) -> Result<usize, RepositoryError> {
        let before = self.data.len();
        self.data.retain(|_, m| !filter.matches(m));
        Ok(before - self.data.len())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.data.len())
    }
}
