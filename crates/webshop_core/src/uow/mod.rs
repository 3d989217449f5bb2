//! Unit of work: one store context, one repository per entity type, one commit.
//!
//! # Responsibility
//! - Own the connection that every repository of a business transaction uses.
//! - Journal staged mutations and replay them atomically on `complete`.
//!
//! # Invariants
//! - Staged changes touch the store only inside the commit transaction.
//! - A unit of work is used by one request at a time (`Send`, not `Sync`).
//! - Repositories borrow the unit of work, so none outlive commit or disposal.

mod context;
mod unit_of_work;

pub use context::StoreContext;
pub use unit_of_work::UnitOfWork;
