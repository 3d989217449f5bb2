//! Customer persistence mapping.
//!
//! # Invariants
//! - Inserting a customer also inserts the orders it carries, re-owned to the
//!   customer's id.
//! - Updating a customer rewrites its own fields only; order payloads on an
//!   update are dropped when staged, and orders change through the order
//!   repository.
//! - Deleting a customer cascades to its orders in the store.

use crate::model::customer::Customer;
use crate::model::{EntityId, EntityKind, ModelValidationError};
use crate::repo::order_repo::{cascade_order, load_orders_for_customer, resolve_order_products};
use crate::repo::record::{
    count_rows, ensure_changed, insert_id, Pending, Record, StagedChange,
};
use crate::repo::sqlite_repo::SqliteRepository;
use crate::repo::RepoResult;
use crate::uow::StoreContext;
use rusqlite::{params, Connection, Row};

pub type CustomerRepository<'uow> = SqliteRepository<'uow, Customer>;

impl Record for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> EntityId {
        self.id
    }

    fn check_valid(&self) -> Result<(), ModelValidationError> {
        self.validate()
    }

    fn insert(&mut self, conn: &Connection) -> RepoResult<usize> {
        let mut changed = conn.execute(
            "INSERT INTO customers (id, name) VALUES (?1, ?2);",
            params![insert_id(self.id), self.name.as_str()],
        )?;
        self.id = conn.last_insert_rowid();
        for order in &mut self.orders {
            order.customer_id = self.id;
            changed += order.insert(conn)?;
        }
        Ok(changed)
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "UPDATE customers SET name = ?2 WHERE id = ?1;",
            params![self.id, self.name.as_str()],
        )?;
        ensure_changed(changed, EntityKind::Customer, self.id)
    }

    fn delete(conn: &Connection, id: EntityId) -> RepoResult<usize> {
        let orders = count_rows(conn, "SELECT COUNT(*) FROM orders WHERE customer_id = ?1;", id)?;
        let links = count_rows(
            conn,
            "SELECT COUNT(*)
             FROM order_products op
             INNER JOIN orders o ON o.id = op.order_id
             WHERE o.customer_id = ?1;",
            id,
        )?;
        let changed = conn.execute("DELETE FROM customers WHERE id = ?1;", [id])?;
        Ok(ensure_changed(changed, EntityKind::Customer, id)? + orders + links)
    }

    fn select_one(conn: &Connection, id: EntityId) -> RepoResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM customers WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_customer_row(conn, row)?)),
            None => Ok(None),
        }
    }

    fn select_all(conn: &Connection) -> RepoResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM customers ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(conn, row)?);
        }
        Ok(customers)
    }

    fn stage(change: Pending<Self>) -> StagedChange {
        StagedChange::Customer(change)
    }

    fn staged(change: &StagedChange) -> Option<&Pending<Self>> {
        match change {
            StagedChange::Customer(pending) => Some(pending),
            _ => None,
        }
    }

    fn resolve_references(mut self, ctx: &StoreContext) -> RepoResult<Self> {
        let orders = std::mem::take(&mut self.orders);
        for mut order in orders {
            order.customer_id = self.id;
            self.orders.push(resolve_order_products(order, ctx)?);
        }
        Ok(self)
    }

    /// Order payloads on an update are ignored, so they are dropped unresolved.
    fn prepare_update(mut self, _ctx: &StoreContext) -> RepoResult<Self> {
        self.orders.clear();
        Ok(self)
    }

    fn merged_update(&self, previous: &Self) -> Self {
        Customer {
            orders: previous.orders.clone(),
            ..self.clone()
        }
    }

    fn cascade_removal(
        &mut self,
        _conn: &Connection,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<bool> {
        self.orders.retain_mut(|order| cascade_order(order, kind, id));
        Ok(true)
    }
}

fn parse_customer_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Customer> {
    let mut customer = Customer::with_id(row.get("id")?, row.get::<_, String>("name")?);
    customer.orders = load_orders_for_customer(conn, customer.id)?;
    Ok(customer)
}
