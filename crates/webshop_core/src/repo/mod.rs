//! Repository contract and SQLite persistence mappings.
//!
//! # Responsibility
//! - Define the uniform CRUD contract shared by every shop entity.
//! - Keep SQL details inside the per-entity `Record` mappings.
//!
//! # Invariants
//! - Mutations are staged on the owning unit of work, never written directly.
//! - `get`/`get_all` report absence as `Ok(None)` / an empty list.
//! - `remove` checks existence first and fails with `NotFound`.
//! - Store errors surface unchanged as `RepoError::Db`.

use crate::db::DbError;
use crate::model::{EntityId, EntityKind, ModelValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod customer_repo;
pub mod order_repo;
pub mod product_repo;
pub mod record;
pub mod sqlite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised by repositories and the unit of work.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: EntityId,
    },
    /// An order referenced products that do not exist in the store.
    UnknownProducts {
        order_id: EntityId,
        missing: Vec<EntityId>,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

/// Coarse classification callers use to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoErrorKind {
    NotFound,
    InvalidArgument,
    Persistence,
}

impl RepoError {
    pub fn kind(&self) -> RepoErrorKind {
        match self {
            Self::NotFound { .. } => RepoErrorKind::NotFound,
            Self::Validation(_)
            | Self::UnknownProducts { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => RepoErrorKind::InvalidArgument,
            Self::Db(_) | Self::InvalidData(_) => RepoErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == RepoErrorKind::NotFound
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UnknownProducts { order_id, missing } => write!(
                f,
                "order {order_id} references unknown products: {}",
                join_ids(missing)
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store connection is not migrated: expected schema version {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "store is missing table `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Uniform CRUD contract over one entity type.
///
/// Mutating calls only stage work; nothing is durable until the owning
/// unit of work completes.
pub trait Repository<T> {
    /// Stages `item` for insertion. Id conflicts surface on commit.
    fn add(&self, item: T) -> RepoResult<()>;
    /// Returns the entity with `id`, or `None` when absent.
    fn get(&self, id: EntityId) -> RepoResult<Option<T>>;
    /// Returns every visible entity: stored rows by id, then staged additions.
    fn get_all(&self) -> RepoResult<Vec<T>>;
    /// Stages replacement of the stored entity sharing `item`'s id.
    fn update(&self, item: T) -> RepoResult<()>;
    /// Stages deletion of an existing entity; `NotFound` when absent.
    fn remove(&self, id: EntityId) -> RepoResult<()>;
}

fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::{RepoError, RepoErrorKind};
    use crate::model::{EntityKind, ModelValidationError};

    #[test]
    fn kinds_follow_error_categories() {
        let not_found = RepoError::NotFound {
            kind: EntityKind::Product,
            id: 999,
        };
        assert_eq!(not_found.kind(), RepoErrorKind::NotFound);
        assert!(not_found.is_not_found());

        let invalid = RepoError::from(ModelValidationError::BlankName(EntityKind::Customer));
        assert_eq!(invalid.kind(), RepoErrorKind::InvalidArgument);

        let db = RepoError::from(rusqlite::Error::InvalidQuery);
        assert_eq!(db.kind(), RepoErrorKind::Persistence);
    }

    #[test]
    fn unknown_products_lists_missing_ids() {
        let err = RepoError::UnknownProducts {
            order_id: 7,
            missing: vec![4, 9],
        };
        assert_eq!(err.to_string(), "order 7 references unknown products: 4,9");
    }
}
