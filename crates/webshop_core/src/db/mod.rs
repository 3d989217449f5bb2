//! Shop store bootstrap: connections and schema versions.
//!
//! Every connection handed to a unit of work comes from [`open_db`] or
//! [`open_db_in_memory`], which enforce foreign keys and bring the schema to
//! the version this build expects (`PRAGMA user_version`).

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Store failure, surfaced to callers as a persistence error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store file could not be opened or configured.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// A schema migration failed; nothing from the batch was applied.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// True for uniqueness and foreign-key violations, i.e. a commit that
    /// conflicts with rows already in the store.
    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            Self::Sqlite(err)
            | Self::Open { source: err, .. }
            | Self::Migration { source: err, .. } => err,
            Self::UnsupportedSchemaVersion { .. } => return false,
        };
        source.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Open { target, source } => write!(f, "cannot open store `{target}`: {source}"),
            Self::Migration { version, source } => {
                write!(f, "schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
