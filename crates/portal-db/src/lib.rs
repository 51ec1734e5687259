pub mod migrations;
pub mod models;
pub mod queries;

pub use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// How long a connection waits on another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("username already exists: {0}")]
    UsernameTaken(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Handle to the SQLite file. Holds no open connection: every call to
/// [`Database::with_conn`] opens a fresh one and drops it when the closure
/// returns, so a request owns its connection for exactly its own lifetime.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        debug!("Opened connection to {}", self.path.display());
        Ok(conn)
    }

    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let conn = self.connect()?;
        f(&conn)
    }
}
