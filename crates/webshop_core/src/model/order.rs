//! Order record.

use crate::model::product::Product;
use crate::model::{validate_id, EntityId, EntityKind, ModelValidationError, UNASSIGNED_ID};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A customer order referencing a set of products.
///
/// Membership only: no quantity or price is recorded per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    /// Owning customer.
    pub customer_id: EntityId,
    /// Creation time in Unix epoch milliseconds.
    pub order_date: i64,
    /// Products in this order. Caller payloads are replaced by the stored
    /// products when the order is staged.
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Order {
    /// Creates an order stamped with the current time; the id is store-assigned.
    pub fn new(customer_id: EntityId, products: Vec<Product>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            customer_id,
            order_date: now_epoch_ms(),
            products,
        }
    }

    /// Creates an order with explicit id and timestamp.
    pub fn with_id(
        id: EntityId,
        customer_id: EntityId,
        order_date: i64,
        products: Vec<Product>,
    ) -> Self {
        Self {
            id,
            customer_id,
            order_date,
            products,
        }
    }

    /// Ids of the referenced products, in payload order.
    pub fn product_ids(&self) -> Vec<EntityId> {
        self.products.iter().map(|product| product.id).collect()
    }

    /// Validates the order's own fields.
    ///
    /// Product payloads are not validated here: only their ids matter, and
    /// those are checked against the store when the order is staged.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_id(EntityKind::Order, self.id)?;
        validate_id(EntityKind::Customer, self.customer_id)
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
