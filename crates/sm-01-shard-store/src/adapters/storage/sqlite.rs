use crate::domain::errors::RepositoryError;
use crate::domain::message::{MessageFilter, MessageId, MessageStatus, ShardId, StoredMessage};
use crate::ports::outbound::MessageRepository;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, Row};
use std::path::Path;

const BACKEND: &str = "sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id             INTEGER PRIMARY KEY,
    sender         TEXT    NOT NULL,
    receiver       TEXT    NOT NULL,
    content        TEXT    NOT NULL,
    status         TEXT    NOT NULL,
    timestamp_sent INTEGER NOT NULL,
    timestamp_read INTEGER,
    checksum       TEXT    NOT NULL,
    shard_id       TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages (sender);
CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages (receiver);
";

const SELECT_COLUMNS: &str = "SELECT id, sender, receiver, content, status, timestamp_sent, \
                              timestamp_read, checksum, shard_id FROM messages";

/// Relational message repository backed by SQLite.
///
/// Timestamps are stored as UTC nanoseconds. Batch updates run inside a
/// single transaction.
pub struct SqliteRepository {
    connection: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(path.as_ref(), flags).map_err(db_err)?;
        connection
            .execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = FULL;")
            .map_err(db_err)?;
        Self::with_connection(connection)
    }

    /// Volatile database, for tests.
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(connection: Connection) -> Result<Self, RepositoryError> {
        connection.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn query(
        &self,
        sql: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let guard = self.connection.lock();
        let mut stmt = guard.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(&[param], RawRow::read)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        rows.into_iter().map(RawRow::into_message).collect()
    }
}

fn db_err(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::backend(BACKEND, err)
}

fn filter_clause(filter: &MessageFilter) -> (&'static str, &str) {
    match filter {
        MessageFilter::BySender(user) => ("sender", user.as_str()),
        MessageFilter::ByReceiver(user) => ("receiver", user.as_str()),
    }
}

/// Column values as stored, before domain conversion.
struct RawRow {
    id: i64,
    sender: String,
    receiver: String,
    content: String,
    status: String,
    timestamp_sent: i64,
    timestamp_read: Option<i64>,
    checksum: String,
    shard_id: String,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender: row.get(1)?,
            receiver: row.get(2)?,
            content: row.get(3)?,
            status: row.get(4)?,
            timestamp_sent: row.get(5)?,
            timestamp_read: row.get(6)?,
            checksum: row.get(7)?,
            shard_id: row.get(8)?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let status = MessageStatus::parse(&self.status).ok_or_else(|| {
            RepositoryError::backend(BACKEND, format!("invalid status {:?}", self.status))
        })?;
        let timestamp_read = self.timestamp_read.map(from_nanos);
        Ok(StoredMessage {
            id: self.id as MessageId,
            sender: self.sender,
            receiver: self.receiver,
            content: self.content,
            status,
            timestamp_sent: from_nanos(self.timestamp_sent),
            timestamp_read,
            checksum: self.checksum,
            shard_id: ShardId::new(self.shard_id),
        })
    }
}

fn from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_nanos(nanos)
}

/// i64 nanoseconds cover 1677..2262.
fn to_nanos(at: DateTime<Utc>) -> Result<i64, RepositoryError> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| RepositoryError::backend(BACKEND, format!("timestamp out of range {at}")))
}

impl MessageRepository for SqliteRepository {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn insert(&mut self, message: StoredMessage) -> Result<(), RepositoryError> {
        let guard = self.connection.lock();
        let result = guard.execute(
            "INSERT INTO messages (id, sender, receiver, content, status, timestamp_sent, \
             timestamp_read, checksum, shard_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                message.id as i64,
                message.sender,
                message.receiver,
                message.content,
                message.status.as_str(),
                to_nanos(message.timestamp_sent)?,
                message.timestamp_read.map(to_nanos).transpose()?,
                message.checksum,
                message.shard_id.as_str(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepositoryError::DuplicateKey { id: message.id })
            }
            Err(err) => Err(db_err(err)),
        }
    }

    fn get(&self, id: MessageId) -> Result<Option<StoredMessage>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        Ok(self.query(&sql, &(id as i64))?.into_iter().next())
    }

    fn update_batch(&mut self, messages: Vec<StoredMessage>) -> Result<(), RepositoryError> {
        let mut guard = self.connection.lock();
        let tx = guard.transaction().map_err(db_err)?;
        for message in &messages {
            let changed = tx
                .execute(
                    "UPDATE messages SET content = ?2, status = ?3, timestamp_read = ?4, \
                     checksum = ?5 WHERE id = ?1",
                    params![
                        message.id as i64,
                        message.content,
                        message.status.as_str(),
                        message.timestamp_read.map(to_nanos).transpose()?,
                        message.checksum,
                    ],
                )
                .map_err(db_err)?;
            if changed == 0 {
                // Dropping the transaction rolls it back.
                return Err(RepositoryError::backend(
                    BACKEND,
                    format!("update of unknown message {}", message.id),
                ));
            }
        }
        tx.commit().map_err(db_err)
    }

    fn remove(&mut self, id: MessageId) -> Result<bool, RepositoryError> {
        let guard = self.connection.lock();
        let removed = guard
            .execute("DELETE FROM messages WHERE id = ?1", params![id as i64])
            .map_err(db_err)?;
        Ok(removed > 0)
    }

    fn find_by(&self, filter: &MessageFilter) -> Result<Vec<StoredMessage>, RepositoryError> {
        let (column, user) = filter_clause(filter);
        let sql = format!("{SELECT_COLUMNS} WHERE {column} = ?1");
        self.query(&sql, &user)
    }

    fn remove_by(&mut self, filter: &MessageFilter) -> Result<usize, RepositoryError> {
        let (column, user) = filter_clause(filter);
        let guard = self.connection.lock();
        guard
            .execute(
                &format!("DELETE FROM messages WHERE {column} = ?1"),
                params![user],
            )
            .map_err(db_err)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let guard = self.connection.lock();
        let count: i64 = guard
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }
}
