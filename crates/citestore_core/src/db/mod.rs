//! Reference store bootstrap.
//!
//! # Responsibility
//! - Open the SQLite file (or in-memory store) backing `REFERENCE`.
//! - Bring its schema to the version this binary understands.
//! - Register the SQL helpers that repository queries rely on.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the number of applied migrations.
//! - A store written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod functions;
pub mod migrations;
mod open;

pub use functions::register_text_functions;
pub use open::{open_db, open_db_in_memory, DB_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or querying the reference store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite reported an error (I/O, locking, constraint, syntax).
    Sqlite(rusqlite::Error),
    /// The store's schema is ahead of this binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "reference store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "reference store was written by a newer version (schema {db_version}, this build reads up to {latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
