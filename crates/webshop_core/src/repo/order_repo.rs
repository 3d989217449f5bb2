//! Order persistence mapping and product-reference resolution.
//!
//! # Invariants
//! - Staged orders hold the stored products, never the caller's payloads.
//! - An order referencing any unknown product id is rejected as a whole.
//! - Products nested in an order carry no back-references and are kept in
//!   id order, matching how they are read back.

use crate::model::order::Order;
use crate::model::product::Product;
use crate::model::{EntityId, EntityKind, ModelValidationError};
use crate::repo::product_repo::parse_product_row;
use crate::repo::record::{
    count_rows, ensure_changed, insert_id, Pending, Record, StagedChange,
};
use crate::repo::sqlite_repo::SqliteRepository;
use crate::repo::{RepoError, RepoResult};
use crate::uow::StoreContext;
use log::warn;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const ORDER_SELECT_SQL: &str = "SELECT id, customer_id, order_date FROM orders";

pub type OrderRepository<'uow> = SqliteRepository<'uow, Order>;

impl OrderRepository<'_> {
    /// Returns `order` with its product payloads replaced by the stored
    /// products, as seen by this unit of work.
    ///
    /// `add` and `update` apply this automatically; it is exposed so callers
    /// can preview the resolved order before staging it.
    pub fn resolve_products(&self, order: Order) -> RepoResult<Order> {
        resolve_order_products(order, self.context())
    }
}

impl Record for Order {
    const KIND: EntityKind = EntityKind::Order;

    fn id(&self) -> EntityId {
        self.id
    }

    fn check_valid(&self) -> Result<(), ModelValidationError> {
        self.validate()
    }

    fn insert(&mut self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "INSERT INTO orders (id, customer_id, order_date) VALUES (?1, ?2, ?3);",
            params![insert_id(self.id), self.customer_id, self.order_date],
        )?;
        self.id = conn.last_insert_rowid();
        Ok(changed + insert_links(conn, self.id, &self.products)?)
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "UPDATE orders SET customer_id = ?2, order_date = ?3 WHERE id = ?1;",
            params![self.id, self.customer_id, self.order_date],
        )?;
        let changed = ensure_changed(changed, EntityKind::Order, self.id)?;
        let unlinked = conn.execute("DELETE FROM order_products WHERE order_id = ?1;", [self.id])?;
        Ok(changed + unlinked + insert_links(conn, self.id, &self.products)?)
    }

    fn delete(conn: &Connection, id: EntityId) -> RepoResult<usize> {
        let links = count_rows(
            conn,
            "SELECT COUNT(*) FROM order_products WHERE order_id = ?1;",
            id,
        )?;
        let changed = conn.execute("DELETE FROM orders WHERE id = ?1;", [id])?;
        Ok(ensure_changed(changed, EntityKind::Order, id)? + links)
    }

    fn select_one(conn: &Connection, id: EntityId) -> RepoResult<Option<Self>> {
        let mut stmt = conn.prepare(&format!("{ORDER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_order_row(conn, row)?)),
            None => Ok(None),
        }
    }

    fn select_all(conn: &Connection) -> RepoResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("{ORDER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_order_row(conn, row)?);
        }
        Ok(orders)
    }

    fn stage(change: Pending<Self>) -> StagedChange {
        StagedChange::Order(change)
    }

    fn staged(change: &StagedChange) -> Option<&Pending<Self>> {
        match change {
            StagedChange::Order(pending) => Some(pending),
            _ => None,
        }
    }

    fn resolve_references(self, ctx: &StoreContext) -> RepoResult<Self> {
        resolve_order_products(self, ctx)
    }

    fn cascade_removal(
        &mut self,
        _conn: &Connection,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<bool> {
        Ok(cascade_order(self, kind, id))
    }
}

/// Applies a removal to an order the way the foreign keys do: removing its
/// customer deletes it, removing a product drops the membership.
pub(crate) fn cascade_order(order: &mut Order, kind: EntityKind, id: EntityId) -> bool {
    match kind {
        EntityKind::Customer => order.customer_id != id,
        EntityKind::Product => {
            order.products.retain(|product| product.id != id);
            true
        }
        EntityKind::Order => order.id != id,
    }
}

/// Swaps product payloads for stored products.
///
/// Duplicate ids collapse to one membership (first occurrence wins). Any id
/// missing from the store fails the whole order with `UnknownProducts`.
pub(crate) fn resolve_order_products(order: Order, ctx: &StoreContext) -> RepoResult<Order> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::with_capacity(order.products.len());
    let mut missing = Vec::new();

    for id in order.product_ids() {
        if !seen.insert(id) {
            continue;
        }
        match ctx.find::<Product>(id)? {
            Some(mut stored) => {
                stored.order_ids.clear();
                resolved.push(stored);
            }
            None => missing.push(id),
        }
    }

    if !missing.is_empty() {
        warn!(
            "event=order_resolve module=repo status=error order_id={} missing_count={}",
            order.id,
            missing.len()
        );
        return Err(RepoError::UnknownProducts {
            order_id: order.id,
            missing,
        });
    }

    resolved.sort_by_key(|product| product.id);
    Ok(Order {
        products: resolved,
        ..order
    })
}

/// Loads every order owned by `customer_id`, ordered by id.
pub(crate) fn load_orders_for_customer(
    conn: &Connection,
    customer_id: EntityId,
) -> RepoResult<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "{ORDER_SELECT_SQL} WHERE customer_id = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([customer_id])?;
    let mut orders = Vec::new();
    while let Some(row) = rows.next()? {
        orders.push(parse_order_row(conn, row)?);
    }
    Ok(orders)
}

fn parse_order_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Order> {
    let id: EntityId = row.get("id")?;
    Ok(Order::with_id(
        id,
        row.get("customer_id")?,
        row.get("order_date")?,
        load_order_products(conn, id)?,
    ))
}

fn load_order_products(conn: &Connection, order_id: EntityId) -> RepoResult<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT p.id AS id, p.name AS name
         FROM order_products op
         INNER JOIN products p ON p.id = op.product_id
         WHERE op.order_id = ?1
         ORDER BY p.id ASC;",
    )?;
    let mut rows = stmt.query([order_id])?;
    let mut products = Vec::new();
    while let Some(row) = rows.next()? {
        products.push(parse_product_row(row)?);
    }
    Ok(products)
}

fn insert_links(conn: &Connection, order_id: EntityId, products: &[Product]) -> RepoResult<usize> {
    let mut stmt =
        conn.prepare("INSERT INTO order_products (order_id, product_id) VALUES (?1, ?2);")?;
    let mut changed = 0;
    for product in products {
        changed += stmt.execute([order_id, product.id])?;
    }
    Ok(changed)
}
