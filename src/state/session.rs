use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Per-session key/value storage
///
/// Values are JSON strings. Everything written belongs to the current
/// session and disappears when the session is cleared.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
    /// End the session: drop every key it wrote
    fn clear(&self) -> Result<(), SessionError>;
}

/// Read and deserialize a stored value
pub fn read_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, SessionError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and store a value
pub fn write_json<T: Serialize>(
    store: &dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// SQLite-backed session store
///
/// An in-memory store lives exactly as long as the process. A file store
/// can hold several sessions side by side; each store only sees the rows
/// of its own session id.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
    session_id: String,
    db_path: Option<PathBuf>,
}

impl SqliteSessionStore {
    /// Store that ends with the process
    pub fn in_memory() -> Result<Self, SessionError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, "default".to_string(), None)
    }

    /// Open (or create) a session database file
    pub fn open(db_path: &Path, session_id: impl Into<String>) -> Result<Self, SessionError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        tracing::info!("📁 Session database at: {}", db_path.display());

        Self::with_connection(conn, session_id.into(), Some(db_path.to_path_buf()))
    }

    /// Get the default location for a session database file
    /// - Linux: ~/.local/share/portfolio-assets/session.db
    /// - macOS: ~/Library/Application Support/portfolio-assets/session.db
    /// - Windows: %APPDATA%\portfolio-assets\session.db
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("portfolio-assets");
        path.push("session.db");
        Some(path)
    }

    fn with_connection(
        conn: Connection,
        session_id: String,
        db_path: Option<PathBuf>,
    ) -> Result<Self, SessionError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            session_id,
            db_path,
        })
    }

    /// Create the state table if it doesn't exist
    fn init_schema(conn: &Connection) -> Result<(), SessionError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_state (
                session_id      TEXT NOT NULL,
                key             TEXT NOT NULL,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL,
                PRIMARY KEY (session_id, key)
            )",
            [],
        )?;
        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Path of the database file (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Keys stored for this session, sorted
    pub fn keys(&self) -> Result<Vec<String>, SessionError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT key FROM session_state WHERE session_id = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map([&self.session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM session_state WHERE session_id = ?1 AND key = ?2",
                rusqlite::params![&self.session_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.lock().execute(
            "INSERT INTO session_state (session_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![&self.session_id, key, value, now],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.conn.lock().execute(
            "DELETE FROM session_state WHERE session_id = ?1 AND key = ?2",
            rusqlite::params![&self.session_id, key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let removed = self.conn.lock().execute(
            "DELETE FROM session_state WHERE session_id = ?1",
            [&self.session_id],
        )?;
        tracing::debug!("🔄 Cleared {} keys for session {}", removed, self.session_id);
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for SqliteSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSessionStore")
            .field("session_id", &self.session_id)
            .field("db_path", &self.db_path)
            .finish()
    }
}
