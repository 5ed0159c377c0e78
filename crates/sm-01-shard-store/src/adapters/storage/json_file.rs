use crate::domain::errors::RepositoryError;
use crate::domain::message::{MessageFilter, MessageId, StoredMessage};
use crate::ports::outbound::MessageRepository;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Document-file message repository.
///
/// Holds the shard's whole mailbox as one JSON array on disk. Every mutation
/// rewrites the document through a temp file and rename, so a crash leaves
/// either the old or the new document and never a torn one. The in-memory
/// view only changes after the write succeeded.
pub struct JsonFileRepository {
    data: BTreeMap<MessageId, StoredMessage>,
    path: PathBuf,
}

impl JsonFileRepository {
    /// Open the document at `path`, creating an empty mailbox if absent.
    ///
    /// A present but unparseable document is an error rather than an empty
    /// mailbox, so a damaged file is never silently overwritten.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                let messages: Vec<StoredMessage> = serde_json::from_slice(&bytes)?;
                tracing::info!(
                    "[sm-01] Loaded {} messages from {}",
                    messages.len(),
                    path.display()
                );
                messages.into_iter().map(|m| (m.id, m)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[sm-01] No existing mailbox file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &BTreeMap<MessageId, StoredMessage>) -> Result<(), RepositoryError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let messages: Vec<&StoredMessage> = data.values().collect();
        let bytes = serde_json::to_vec_pretty(&messages)?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy, persist it, then swap it in.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut BTreeMap<MessageId, StoredMessage>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut next = self.data.clone();
        let out = change(&mut next)?;
        self.save(&next)?;
        self.data = next;
        Ok(out)
    }
}

impl MessageRepository for JsonFileRepository {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError> {
        if self.data.contains_key(&message.id) {
            return Err(RepositoryError::DuplicateKey { id: message.id });
        }
        self.commit(|data| {
            data.insert(message.id, message);
            Ok(())
        })
    }

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError> {
        Ok(self.data.get(&id).cloned())
    }

    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.commit(|data| {
            for message in messages {
                if !data.contains_key(&message.id) {
                    return Err(RepositoryError::backend(
                        "json",
                        format!("update of unknown message {}", message.id),
                    ));
                }
                data.insert(message.id, message);
            }
            Ok(())
        })
    }

    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError> {
        if !self.data.contains_key(&id) {
            return Ok(false);
        }
        self.commit(|data| Ok(data.remove(&id).is_some()))
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
        if !self.data.values().any(|m| filter.matches(m)) {
            return Ok(0);
        }
        self.commit(|data| {
            let before = data.len();
            data.retain(|_, m| !filter.matches(m));
            Ok(before - data.len())
        })
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.data.len())
    }
}
