//! Product use-cases.

use crate::model::product::Product;
use crate::model::{EntityId, EntityKind};
use crate::notify::subject::ProductSubject;
use crate::repo::{RepoError, RepoResult, Repository};
use crate::service::commit;
use crate::uow::UnitOfWork;

/// Product use-cases; creation announces the stored product to observers.
pub struct ProductService<'s> {
    subject: &'s ProductSubject,
}

impl<'s> ProductService<'s> {
    pub fn new(subject: &'s ProductSubject) -> Self {
        Self { subject }
    }

    /// Adds and commits `product`, then notifies observers with the stored
    /// product (store-assigned id included).
    ///
    /// Nothing is notified when the commit fails.
    pub fn create_product(&self, uow: &mut UnitOfWork, product: Product) -> RepoResult<Product> {
        uow.products().add(product)?;
        commit(uow)?;
        let created = uow
            .committed::<Product>()
            .pop()
            .ok_or_else(|| RepoError::InvalidData("commit recorded no product".to_string()))?;
        self.subject.notify(&created);
        Ok(created)
    }

    /// Replaces the stored product; `NotFound` when it does not exist.
    pub fn update_product(&self, uow: &mut UnitOfWork, product: Product) -> RepoResult<()> {
        if uow.products().get(product.id)?.is_none() {
            return Err(RepoError::NotFound {
                kind: EntityKind::Product,
                id: product.id,
            });
        }
        uow.products().update(product)?;
        commit(uow)?;
        Ok(())
    }

    pub fn remove_product(&self, uow: &mut UnitOfWork, id: EntityId) -> RepoResult<()> {
        uow.products().remove(id)?;
        commit(uow)?;
        Ok(())
    }

    pub fn get_product(&self, uow: &UnitOfWork, id: EntityId) -> RepoResult<Option<Product>> {
        uow.products().get(id)
    }

    pub fn list_products(&self, uow: &UnitOfWork) -> RepoResult<Vec<Product>> {
        uow.products().get_all()
    }
}
