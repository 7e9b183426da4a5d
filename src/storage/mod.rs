//! Conversation persistence
//!
//! Sessions and their ordered messages are stored in an embedded SQLite
//! database. A [`ConversationStore`] owns exactly one connection for its
//! whole lifetime; every operation locks that connection, so reads and
//! writes issued through one store never interleave.
//!
//! Data operations are `async` and take a [`CancellationToken`]. The SQL runs
//! on tokio's blocking pool. When the token fires mid-statement the store
//! interrupts SQLite; the surrounding transaction is then rolled back.

use crate::error::{ChattyError, Result};
use chrono::Local;
use directories::BaseDirs;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

pub mod timestamp;
pub mod types;

pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
pub use types::{Message, NewMessage, SessionSummary, Transcript};

/// Default database directory, relative to the user's home
pub const DEFAULT_DIR: &str = ".local/share/chatty";

/// Default database file name
pub const DEFAULT_FILE: &str = "chatty.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
    );
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
        FOREIGN KEY(session_id) REFERENCES sessions(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id);
";

// MAX() keeps updated_at monotonic (and >= created_at) even if the wall clock steps back.
const TOUCH_SESSION: &str = "UPDATE sessions
    SET updated_at = MAX(updated_at, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
    WHERE id = ?1";

const RENAME_SESSION: &str = "UPDATE sessions
    SET name = ?1, updated_at = MAX(updated_at, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
    WHERE id = ?2";

const SUMMARY_SELECT: &str = "SELECT s.id, s.name, s.created_at, s.updated_at, COUNT(m.id)
    FROM sessions s
    LEFT JOIN messages m ON m.session_id = s.id";

/// Handle to the conversation database
///
/// Created with [`ConversationStore::open`] and released with
/// [`ConversationStore::close`] (or by dropping it). Several stores may
/// coexist in one process as long as they point at different files.
pub struct ConversationStore {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl ConversationStore {
    /// Open or create the conversation database
    ///
    /// A blank `location_hint` selects `<home>/.local/share/chatty/chatty.db`;
    /// anything else is resolved to an absolute path. Missing parent
    /// directories are created with owner-only permissions. WAL journaling and
    /// foreign-key enforcement are switched on before the schema is applied.
    ///
    /// # Errors
    ///
    /// Returns `ChattyError::StorageUnavailable` if any step fails; the
    /// partially opened connection is closed before returning.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatty::storage::ConversationStore;
    ///
    /// # fn main() -> chatty::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = ConversationStore::open(dir.path().join("chats/chatty.db").to_str().unwrap())?;
    /// assert!(store.path().is_absolute());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(location_hint: &str) -> Result<Self> {
        let path = resolve_path(location_hint)?;
        let conn =
            open_connection(&path).map_err(|(step, e)| ChattyError::StorageUnavailable {
                path: path.clone(),
                reason: format!("{}: {}", step, e),
            })?;

        tracing::info!(path = %path.display(), "Opened conversation store");

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Resolved absolute path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the database connection
    ///
    /// Waits for an in-flight operation to finish. Closing an already closed
    /// store is a no-op. Every later operation fails with
    /// `ChattyError::InvalidState`.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        if let Err((conn, source)) = conn.close() {
            // Keep the handle so the caller can retry.
            *guard = Some(conn);
            return Err(ChattyError::Storage {
                operation: "close",
                source,
            }
            .into());
        }

        tracing::info!(path = %self.path.display(), "Closed conversation store");
        Ok(())
    }

    /// Create a new session and return its identifier
    ///
    /// The name is trimmed; a blank name becomes `Session YYYY-MM-DD HH:MM`
    /// in local time. Both timestamps are set by SQLite at insert time.
    pub async fn create_session(&self, cancel: &CancellationToken, name: &str) -> Result<i64> {
        const OP: &str = "create_session";
        let title = session_title(name);
        tracing::debug!(name = %title, "Creating session");

        self.run(OP, cancel, move |conn| {
            conn.execute("INSERT INTO sessions (name) VALUES (?1)", params![title])
                .map_err(sql_error(OP))?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Rename a session and bump its `updated_at`
    ///
    /// # Errors
    ///
    /// Returns `ChattyError::InvalidArgument` for a non-positive id or a
    /// blank name and `ChattyError::NotFound` if the session does not exist.
    pub async fn update_session_name(
        &self,
        cancel: &CancellationToken,
        id: i64,
        name: &str,
    ) -> Result<()> {
        const OP: &str = "update_session_name";
        validate_id(OP, id)?;
        let trimmed = name.trim().to_string();
        if trimmed.is_empty() {
            return Err(invalid_argument(OP, "session name cannot be empty"));
        }
        tracing::debug!(session_id = id, name = %trimmed, "Renaming session");

        self.run(OP, cancel, move |conn| {
            let changed = conn
                .execute(RENAME_SESSION, params![trimmed, id])
                .map_err(sql_error(OP))?;
            if changed == 0 {
                return Err(not_found(OP, id));
            }
            Ok(())
        })
        .await
    }

    /// Append a message to a session
    ///
    /// The insert and the parent's `updated_at` bump run in one transaction:
    /// callers either see both or get an error.
    ///
    /// # Errors
    ///
    /// Returns `ChattyError::InvalidArgument` for a non-positive session id or
    /// a blank role and `ChattyError::NotFound` if the session does not
    /// exist; no row is written in either case.
    pub async fn append_message(
        &self,
        cancel: &CancellationToken,
        session_id: i64,
        message: &NewMessage,
    ) -> Result<()> {
        const OP: &str = "append_message";
        validate_id(OP, session_id)?;
        if message.role.trim().is_empty() {
            return Err(invalid_argument(OP, "message role cannot be empty"));
        }
        tracing::debug!(session_id, role = %message.role, "Appending message");

        let message = message.clone();
        self.run(OP, cancel, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(sql_error(OP))?;

            let exists = tx
                .query_row(
                    "SELECT 1 FROM sessions WHERE id = ?1",
                    params![session_id],
                    |_| Ok(()),
                )
                .optional()
                .map_err(sql_error(OP))?
                .is_some();
            if !exists {
                return Err(not_found(OP, session_id));
            }

            tx.execute(
                "INSERT INTO messages (session_id, role, content) VALUES (?1, ?2, ?3)",
                params![session_id, message.role, message.content],
            )
            .map_err(sql_error(OP))?;
            tx.execute(TOUCH_SESSION, params![session_id])
                .map_err(sql_error(OP))?;

            tx.commit().map_err(sql_error(OP))?;
            Ok(())
        })
        .await
    }

    /// List sessions, most recently updated first
    ///
    /// `limit <= 0` means no limit. Message counts are computed from the
    /// stored rows on every call. Sessions sharing an `updated_at` are
    /// ordered by descending id.
    pub async fn list_sessions(
        &self,
        cancel: &CancellationToken,
        limit: i64,
    ) -> Result<Vec<SessionSummary>> {
        const OP: &str = "list_sessions";
        // SQLite treats a negative LIMIT as unbounded.
        let limit = if limit > 0 { limit } else { -1 };
        tracing::debug!(limit, "Listing sessions");

        self.run(OP, cancel, move |conn| {
            let sql = format!(
                "{} GROUP BY s.id ORDER BY s.updated_at DESC, s.id DESC LIMIT ?1",
                SUMMARY_SELECT
            );
            let mut stmt = conn.prepare(&sql).map_err(sql_error(OP))?;
            let rows = stmt
                .query_map(params![limit], RawSummary::from_row)
                .map_err(sql_error(OP))?;

            let mut summaries = Vec::new();
            for row in rows {
                summaries.push(row.map_err(sql_error(OP))?.decode()?);
            }
            Ok(summaries)
        })
        .await
    }

    /// Load a session summary together with all of its messages
    ///
    /// Messages come back in exactly the order they were appended.
    ///
    /// # Errors
    ///
    /// Returns `ChattyError::InvalidArgument` for a non-positive id and
    /// `ChattyError::NotFound` if the session does not exist.
    pub async fn load_session(&self, cancel: &CancellationToken, id: i64) -> Result<Transcript> {
        const OP: &str = "load_session";
        validate_id(OP, id)?;
        tracing::debug!(session_id = id, "Loading session");

        self.run(OP, cancel, move |conn| {
            // One read transaction so the count and the rows come from the same snapshot.
            let tx = conn.transaction().map_err(sql_error(OP))?;

            let summary = tx
                .query_row(
                    &format!("{} WHERE s.id = ?1 GROUP BY s.id", SUMMARY_SELECT),
                    params![id],
                    RawSummary::from_row,
                )
                .optional()
                .map_err(sql_error(OP))?
                .ok_or_else(|| not_found(OP, id))?
                .decode()?;

            let mut messages = Vec::with_capacity(summary.message_count);
            {
                let mut stmt = tx
                    .prepare(
                        "SELECT role, content, created_at FROM messages
                         WHERE session_id = ?1 ORDER BY id ASC",
                    )
                    .map_err(sql_error(OP))?;
                let rows = stmt
                    .query_map(params![id], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })
                    .map_err(sql_error(OP))?;

                for row in rows {
                    let (role, content, created_at) = row.map_err(sql_error(OP))?;
                    messages.push(Message {
                        role,
                        content,
                        created_at: parse_timestamp(&created_at)?,
                    });
                }
            }

            tx.commit().map_err(sql_error(OP))?;
            Ok(Transcript { summary, messages })
        })
        .await
    }

    /// Delete a session and, through the cascading foreign key, all of its
    /// messages
    ///
    /// # Errors
    ///
    /// Returns `ChattyError::InvalidArgument` for a non-positive id and
    /// `ChattyError::NotFound` if the session does not exist.
    pub async fn delete_session(&self, cancel: &CancellationToken, id: i64) -> Result<()> {
        const OP: &str = "delete_session";
        validate_id(OP, id)?;
        tracing::debug!(session_id = id, "Deleting session");

        self.run(OP, cancel, move |conn| {
            let changed = conn
                .execute("DELETE FROM sessions WHERE id = ?1", params![id])
                .map_err(sql_error(OP))?;
            if changed == 0 {
                return Err(not_found(OP, id));
            }
            Ok(())
        })
        .await
    }

    /// Run `work` against the connection on the blocking pool
    ///
    /// Holds the connection lock for the whole call. Cancellation while
    /// waiting for the lock returns immediately; cancellation while SQLite is
    /// busy interrupts the running statement and waits for the task to unwind.
    async fn run<T, F>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(cancelled(operation));
        }

        let mut guard = tokio::select! {
            guard = Arc::clone(&self.conn).lock_owned() => guard,
            _ = cancel.cancelled() => return Err(cancelled(operation)),
        };

        let interrupt = match guard.as_ref() {
            Some(conn) => conn.get_interrupt_handle(),
            None => return Err(ChattyError::InvalidState { operation }.into()),
        };

        let token = cancel.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            if token.is_cancelled() {
                return Err(cancelled(operation));
            }
            match guard.as_mut() {
                Some(conn) => work(conn),
                None => Err(ChattyError::InvalidState { operation }.into()),
            }
        });

        tokio::select! {
            biased;
            joined = &mut task => join_result(operation, joined),
            _ = cancel.cancelled() => {
                interrupt.interrupt();
                match join_result(operation, task.await) {
                    Err(e) if is_interrupted(&e) => Err(cancelled(operation)),
                    other => other,
                }
            }
        }
    }
}

/// Columns of a summary row before timestamp decoding
struct RawSummary {
    id: i64,
    name: String,
    created_at: String,
    updated_at: String,
    message_count: usize,
}

impl RawSummary {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
            message_count: row.get(4)?,
        })
    }

    fn decode(self) -> Result<SessionSummary> {
        Ok(SessionSummary {
            id: self.id,
            name: self.name,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            message_count: self.message_count,
        })
    }
}

/// Resolve the database location and make sure its directory exists
fn resolve_path(location_hint: &str) -> Result<PathBuf> {
    let trimmed = location_hint.trim();
    let candidate = if trimmed.is_empty() {
        let dirs = BaseDirs::new().ok_or_else(|| ChattyError::StorageUnavailable {
            path: Path::new(DEFAULT_DIR).join(DEFAULT_FILE),
            reason: "could not determine home directory".to_string(),
        })?;
        dirs.home_dir().join(DEFAULT_DIR).join(DEFAULT_FILE)
    } else {
        PathBuf::from(trimmed)
    };

    let path = if candidate.is_absolute() {
        candidate
    } else {
        let cwd = std::env::current_dir().map_err(|e| ChattyError::StorageUnavailable {
            path: candidate.clone(),
            reason: format!("resolve absolute path: {}", e),
        })?;
        cwd.join(candidate)
    };

    if let Some(parent) = path.parent() {
        create_private_dir(parent).map_err(|e| ChattyError::StorageUnavailable {
            path: path.clone(),
            reason: format!("create storage directory: {}", e),
        })?;
    }

    Ok(path)
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Open the connection, apply session settings and run migrations
///
/// On error the connection is dropped (and thereby closed) here.
fn open_connection(
    path: &Path,
) -> std::result::Result<Connection, (&'static str, rusqlite::Error)> {
    let conn = Connection::open(path).map_err(|e| ("open sqlite database", e))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| ("set busy timeout", e))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| ("enable foreign keys", e))?;
    let mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|e| ("set WAL journal", e))?;
    tracing::debug!(journal_mode = %mode, "Configured sqlite connection");
    conn.execute_batch(MIGRATIONS)
        .map_err(|e| ("apply migration", e))?;
    Ok(conn)
}

fn session_title(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        format!("Session {}", Local::now().format("%Y-%m-%d %H:%M"))
    } else {
        trimmed.to_string()
    }
}

fn validate_id(operation: &'static str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(invalid_argument(
            operation,
            &format!("invalid session id {}", id),
        ));
    }
    Ok(())
}

fn invalid_argument(operation: &'static str, message: &str) -> anyhow::Error {
    ChattyError::InvalidArgument {
        operation,
        message: message.to_string(),
    }
    .into()
}

fn not_found(operation: &'static str, id: i64) -> anyhow::Error {
    ChattyError::NotFound { operation, id }.into()
}

fn cancelled(operation: &'static str) -> anyhow::Error {
    tracing::warn!(operation, "Storage operation cancelled");
    ChattyError::Cancelled { operation }.into()
}

fn sql_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> ChattyError {
    move |source| ChattyError::Storage { operation, source }
}

fn is_interrupted(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ChattyError>()
        .is_some_and(ChattyError::is_interrupted)
}

fn join_result<T>(
    operation: &'static str,
    joined: std::result::Result<Result<T>, JoinError>,
) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(cancelled(operation)),
    }
}
