//! Persistence mapping shared by the generic repository.
//!
//! A `Record` knows how to write itself to and read itself from SQLite.
//! Staged work is journaled as `StagedChange` values and replayed inside one
//! transaction when the unit of work completes.

use crate::model::customer::Customer;
use crate::model::order::Order;
use crate::model::product::Product;
use crate::model::{EntityId, EntityKind, ModelValidationError, UNASSIGNED_ID};
use crate::repo::{RepoError, RepoResult};
use crate::uow::StoreContext;
use rusqlite::Connection;

/// Entity type that can be stored through the generic repository.
pub trait Record: Clone + Sized {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Field validation applied when the record is staged.
    fn check_valid(&self) -> Result<(), ModelValidationError>;

    /// Inserts the record, writing the store-assigned id back into `self`.
    fn insert(&mut self, conn: &Connection) -> RepoResult<usize>;

    /// Rewrites the stored row. Fails with `NotFound` when the row is gone.
    fn update(&self, conn: &Connection) -> RepoResult<usize>;

    /// Deletes the stored row. Fails with `NotFound` when the row is gone.
    fn delete(conn: &Connection, id: EntityId) -> RepoResult<usize>;

    fn select_one(conn: &Connection, id: EntityId) -> RepoResult<Option<Self>>;

    fn select_all(conn: &Connection) -> RepoResult<Vec<Self>>;

    fn stage(change: Pending<Self>) -> StagedChange;

    fn staged(change: &StagedChange) -> Option<&Pending<Self>>;

    /// Rewrites references to other entities before the record is staged.
    fn resolve_references(self, _ctx: &StoreContext) -> RepoResult<Self> {
        Ok(self)
    }

    /// Prepares a record for a staged update. Defaults to the add-time
    /// reference resolution.
    fn prepare_update(self, ctx: &StoreContext) -> RepoResult<Self> {
        self.resolve_references(ctx)
    }

    /// The value the store holds once this staged update is written over
    /// `previous`.
    fn merged_update(&self, _previous: &Self) -> Self {
        self.clone()
    }

    /// Applies the store's delete cascade for a staged removal of another
    /// entity type. Returns `false` when the removal deletes this record too.
    fn cascade_removal(
        &mut self,
        _conn: &Connection,
        _kind: EntityKind,
        _id: EntityId,
    ) -> RepoResult<bool> {
        Ok(true)
    }
}

/// One staged mutation of a single entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending<T> {
    Add(T),
    Update(T),
    Remove(EntityId),
}

impl<T: Record> Pending<T> {
    fn apply(&mut self, conn: &Connection) -> RepoResult<usize> {
        match self {
            Self::Add(item) => item.insert(conn),
            Self::Update(item) => item.update(conn),
            Self::Remove(id) => T::delete(conn, *id),
        }
    }

    pub(crate) fn target_id(&self) -> EntityId {
        match self {
            Self::Add(item) | Self::Update(item) => item.id(),
            Self::Remove(id) => *id,
        }
    }

    pub(crate) fn op(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Remove(_) => "remove",
        }
    }
}

/// Journal entry kept by the unit of work, in staging order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedChange {
    Product(Pending<Product>),
    Customer(Pending<Customer>),
    Order(Pending<Order>),
}

impl StagedChange {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Product(_) => EntityKind::Product,
            Self::Customer(_) => EntityKind::Customer,
            Self::Order(_) => EntityKind::Order,
        }
    }

    /// Kind and id of the entity this change removes, if it is a removal.
    pub fn removed(&self) -> Option<(EntityKind, EntityId)> {
        let id = match self {
            Self::Product(Pending::Remove(id))
            | Self::Customer(Pending::Remove(id))
            | Self::Order(Pending::Remove(id)) => *id,
            _ => return None,
        };
        Some((self.kind(), id))
    }

    pub(crate) fn apply(&mut self, conn: &Connection) -> RepoResult<usize> {
        match self {
            Self::Product(pending) => pending.apply(conn),
            Self::Customer(pending) => pending.apply(conn),
            Self::Order(pending) => pending.apply(conn),
        }
    }
}

/// Converts the caller id into an insert parameter; unassigned ids let
/// SQLite pick the rowid.
pub(crate) fn insert_id(id: EntityId) -> Option<EntityId> {
    (id != UNASSIGNED_ID).then_some(id)
}

/// Counts rows matched by a single-parameter `SELECT COUNT(*)` query.
///
/// Deletes use it to include rows removed by `ON DELETE CASCADE`, which
/// SQLite leaves out of its change count.
pub(crate) fn count_rows(conn: &Connection, sql: &str, id: EntityId) -> RepoResult<usize> {
    let count: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Maps a zero-row write on the primary table to `NotFound`.
pub(crate) fn ensure_changed(changed: usize, kind: EntityKind, id: EntityId) -> RepoResult<usize> {
    if changed == 0 {
        return Err(RepoError::NotFound { kind, id });
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::{ensure_changed, insert_id, Pending, Record, StagedChange};
    use crate::model::product::Product;
    use crate::model::EntityKind;

    #[test]
    fn insert_id_leaves_unassigned_ids_to_the_store() {
        assert_eq!(insert_id(0), None);
        assert_eq!(insert_id(12), Some(12));
    }

    #[test]
    fn zero_row_writes_are_not_found() {
        let err = ensure_changed(0, EntityKind::Order, 5).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ensure_changed(2, EntityKind::Order, 5).unwrap(), 2);
    }

    #[test]
    fn staged_lookup_is_typed() {
        let change = Product::stage(Pending::Remove(3));
        assert_eq!(change.kind(), EntityKind::Product);
        assert!(matches!(Product::staged(&change), Some(Pending::Remove(3))));
        assert!(matches!(change, StagedChange::Product(_)));
        assert_eq!(change.removed(), Some((EntityKind::Product, 3)));
        assert_eq!(Product::stage(Pending::Add(Product::new("x"))).removed(), None);
    }
}
