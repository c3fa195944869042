//! SQLite persistence for projects, lien rules, deadlines, invoices, and payments.
//!
//! One [`SqliteStore`] implements every workflow repository trait. All access goes
//! through a single mutex-guarded connection; ledger writes additionally run inside
//! `BEGIN IMMEDIATE` transactions so a second process sharing the file cannot
//! interleave a read-modify-write.
//!
//! ## Tables
//!
//! - `projects` - jobs owned by a user
//! - `lien_rules` - statutory offsets, seeded on open
//! - `deadlines` - tracked filing deadlines
//! - `invoices` - invoice header with ledger columns in integer cents
//! - `payments` - append-only ledger entries

mod codec;
mod deadlines;
mod invoices;
mod projects;
pub mod schema;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::workflows::RepositoryError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store for every workflow.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database named by `config`, or an in-memory one for `:memory:`.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        if config.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    /// Opens or creates the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening SQLite database");

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::initialise(conn)
    }

    /// Opens a private in-memory database; used by tests and `DATABASE_PATH=:memory:`.
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        debug!("opening in-memory SQLite database");
        Self::initialise(Connection::open_in_memory()?)
    }

    fn initialise(conn: Connection) -> Result<Self, RepositoryError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs a read or single-statement write.
    fn with_conn<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> Result<T, RepositoryError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|err| RepositoryError::Unavailable(format!("lock poisoned: {err}")))?;
        f(&conn)
    }

    /// Runs work that needs a transaction.
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|err| RepositoryError::Unavailable(format!("lock poisoned: {err}")))?;
        f(&mut conn)
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => RepositoryError::Conflict,
                ErrorCode::ConstraintViolation => RepositoryError::Constraint(err.to_string()),
                _ => RepositoryError::Unavailable(err.to_string()),
            },
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}
