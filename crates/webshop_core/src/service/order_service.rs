//! Order use-cases.

use crate::model::order::Order;
use crate::model::{EntityId, EntityKind};
use crate::repo::{RepoError, RepoResult, Repository};
use crate::service::commit;
use crate::uow::UnitOfWork;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderService;

impl OrderService {
    pub fn new() -> Self {
        Self
    }

    /// Resolves the order's products against the store and commits it.
    ///
    /// # Errors
    /// - `UnknownProducts` when any referenced product does not exist.
    /// - `Db` when the owning customer does not exist (foreign key).
    pub fn place_order(&self, uow: &mut UnitOfWork, order: Order) -> RepoResult<Order> {
        uow.orders().add(order)?;
        commit(uow)?;
        uow.committed::<Order>()
            .pop()
            .ok_or_else(|| RepoError::InvalidData("commit recorded no order".to_string()))
    }

    /// Replaces an existing order, including its product memberships.
    pub fn update_order(&self, uow: &mut UnitOfWork, order: Order) -> RepoResult<()> {
        if uow.orders().get(order.id)?.is_none() {
            return Err(RepoError::NotFound {
                kind: EntityKind::Order,
                id: order.id,
            });
        }
        uow.orders().update(order)?;
        commit(uow)?;
        Ok(())
    }

    pub fn remove_order(&self, uow: &mut UnitOfWork, id: EntityId) -> RepoResult<()> {
        uow.orders().remove(id)?;
        commit(uow)?;
        Ok(())
    }

    pub fn get_order(&self, uow: &UnitOfWork, id: EntityId) -> RepoResult<Option<Order>> {
        uow.orders().get(id)
    }

    pub fn list_orders(&self, uow: &UnitOfWork) -> RepoResult<Vec<Order>> {
        uow.orders().get_all()
    }
}
