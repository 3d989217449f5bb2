//! Customer use-cases.

use crate::model::customer::Customer;
use crate::model::{EntityId, EntityKind};
use crate::repo::{RepoError, RepoResult, Repository};
use crate::service::commit;
use crate::uow::UnitOfWork;

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerService;

impl CustomerService {
    pub fn new() -> Self {
        Self
    }

    /// Adds and commits `customer` together with the orders it carries.
    pub fn create_customer(
        &self,
        uow: &mut UnitOfWork,
        customer: Customer,
    ) -> RepoResult<Customer> {
        uow.customers().add(customer)?;
        commit(uow)?;
        uow.committed::<Customer>()
            .pop()
            .ok_or_else(|| RepoError::InvalidData("commit recorded no customer".to_string()))
    }

    /// Renames an existing customer.
    pub fn update_customer(&self, uow: &mut UnitOfWork, customer: Customer) -> RepoResult<()> {
        if uow.customers().get(customer.id)?.is_none() {
            return Err(RepoError::NotFound {
                kind: EntityKind::Customer,
                id: customer.id,
            });
        }
        uow.customers().update(customer)?;
        commit(uow)?;
        Ok(())
    }

    /// Removes a customer and, through the store cascade, its orders.
    pub fn remove_customer(&self, uow: &mut UnitOfWork, id: EntityId) -> RepoResult<()> {
        uow.customers().remove(id)?;
        commit(uow)?;
        Ok(())
    }

    pub fn get_customer(&self, uow: &UnitOfWork, id: EntityId) -> RepoResult<Option<Customer>> {
        uow.customers().get(id)
    }

    pub fn list_customers(&self, uow: &UnitOfWork) -> RepoResult<Vec<Customer>> {
        uow.customers().get_all()
    }
}
