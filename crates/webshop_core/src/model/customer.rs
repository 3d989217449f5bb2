//! Customer record.

use crate::model::order::Order;
use crate::model::{
    validate_id, validate_name, EntityId, EntityKind, ModelValidationError, UNASSIGNED_ID,
};
use serde::{Deserialize, Serialize};

/// A customer and the orders it owns.
///
/// Orders are owned one-to-many: adding a customer inserts the orders it
/// carries, and removing a customer removes its orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name)
    }

    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            orders: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_id(EntityKind::Customer, self.id)?;
        validate_name(EntityKind::Customer, &self.name)?;
        for order in &self.orders {
            order.validate()?;
        }
        Ok(())
    }
}
