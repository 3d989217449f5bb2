//! Generic SQLite-backed repository bound to a unit of work.

use crate::model::{EntityId, ModelValidationError, UNASSIGNED_ID};
use crate::repo::record::{Pending, Record};
use crate::repo::{RepoError, RepoResult, Repository};
use crate::uow::StoreContext;
use log::debug;
use std::marker::PhantomData;

/// Repository for entity type `T`, sharing the store context of the unit of
/// work that created it.
///
/// Borrowing the context ties the repository's lifetime to the unit of work,
/// so a repository cannot outlive a commit or disposal.
pub struct SqliteRepository<'uow, T> {
    ctx: &'uow StoreContext,
    _entity: PhantomData<fn() -> T>,
}

impl<'uow, T: Record> SqliteRepository<'uow, T> {
    pub(crate) fn new(ctx: &'uow StoreContext) -> Self {
        Self {
            ctx,
            _entity: PhantomData,
        }
    }

    pub(crate) fn context(&self) -> &'uow StoreContext {
        self.ctx
    }

    fn stage(&self, pending: Pending<T>) {
        debug!(
            "event=repo_stage module=repo status=ok op={} kind={} id={}",
            pending.op(),
            T::KIND,
            pending.target_id()
        );
        self.ctx.stage(T::stage(pending));
    }
}

impl<T: Record> Repository<T> for SqliteRepository<'_, T> {
    fn add(&self, item: T) -> RepoResult<()> {
        item.check_valid()?;
        let item = item.resolve_references(self.ctx)?;
        self.stage(Pending::Add(item));
        Ok(())
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<T>> {
        self.ctx.find(id)
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        self.ctx.find_all()
    }

    fn update(&self, item: T) -> RepoResult<()> {
        item.check_valid()?;
        if item.id() == UNASSIGNED_ID {
            return Err(ModelValidationError::UnassignedId(T::KIND).into());
        }
        let item = item.prepare_update(self.ctx)?;
        self.stage(Pending::Update(item));
        Ok(())
    }

    fn remove(&self, id: EntityId) -> RepoResult<()> {
        if self.ctx.find::<T>(id)?.is_none() {
            return Err(RepoError::NotFound { kind: T::KIND, id });
        }
        self.stage(Pending::Remove(id));
        Ok(())
    }
}
