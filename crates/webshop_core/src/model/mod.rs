//! Shop domain model.
//!
//! # Responsibility
//! - Define the records persisted by the shop: products, customers, orders.
//! - Provide write-time validation shared by every repository.
//!
//! # Invariants
//! - Identifiers are unique per entity type once persisted.
//! - `UNASSIGNED_ID` marks a record whose id is chosen by the store on commit.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod customer;
pub mod order;
pub mod product;

/// Identifier shared by all shop entities.
///
/// SQLite rowids are 64-bit; positive values are store-assigned or caller-chosen.
pub type EntityId = i64;

/// Sentinel id for records that have not been persisted yet.
pub const UNASSIGNED_ID: EntityId = 0;

/// Entity type tag used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Customer,
    Order,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Customer => "customer",
            Self::Order => "order",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-time validation failures for shop records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Ids are never negative.
    NegativeId { kind: EntityKind, id: EntityId },
    /// Updates address an existing row, so the id must be set.
    UnassignedId(EntityKind),
    BlankName(EntityKind),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeId { kind, id } => write!(f, "{kind} id must not be negative, got {id}"),
            Self::UnassignedId(kind) => write!(f, "{kind} id must be assigned for this operation"),
            Self::BlankName(kind) => write!(f, "{kind} name must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn validate_id(kind: EntityKind, id: EntityId) -> Result<(), ModelValidationError> {
    if id < 0 {
        return Err(ModelValidationError::NegativeId { kind, id });
    }
    Ok(())
}

pub(crate) fn validate_name(kind: EntityKind, name: &str) -> Result<(), ModelValidationError> {
    if name.trim().is_empty() {
        return Err(ModelValidationError::BlankName(kind));
    }
    Ok(())
}
