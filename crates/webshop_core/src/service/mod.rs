//! Use-case services over a unit of work.
//!
//! # Responsibility
//! - Run one business operation per call: stage, commit, then side effects.
//! - Keep transport layers unaware of repositories and commit ordering.
//!
//! # Invariants
//! - Observers are notified only after `complete` succeeded.
//! - A failed operation leaves no staged changes behind.
//! - Services never hold a unit of work between calls.

use crate::repo::RepoResult;
use crate::uow::UnitOfWork;

pub mod customer_service;
pub mod order_service;
pub mod product_service;

/// Commits the staged work, dropping it when the commit fails.
pub(crate) fn commit(uow: &mut UnitOfWork) -> RepoResult<usize> {
    match uow.complete() {
        Ok(affected) => Ok(affected),
        Err(err) => {
            uow.discard();
            Err(err)
        }
    }
}
