//! Product record.

use crate::model::{
    validate_id, validate_name, EntityId, EntityKind, ModelValidationError, UNASSIGNED_ID,
};
use serde::{Deserialize, Serialize};

/// A product listed by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    /// Ids of the orders this product appears in.
    ///
    /// Non-owning back-reference. Loaded only when the product is read on its
    /// own; products nested inside an order leave it empty. Never serialized.
    #[serde(skip)]
    pub order_ids: Vec<EntityId>,
}

impl Product {
    /// Creates a product whose id is assigned by the store on commit.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name)
    }

    /// Creates a product with a caller-chosen id.
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            order_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_id(EntityKind::Product, self.id)?;
        validate_name(EntityKind::Product, &self.name)
    }
}
