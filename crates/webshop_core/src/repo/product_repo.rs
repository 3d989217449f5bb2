//! Product persistence mapping.
//!
//! Products carry no repository operations beyond the generic contract.

use crate::model::product::Product;
use crate::model::{EntityId, EntityKind, ModelValidationError};
use crate::repo::record::{
    count_rows, ensure_changed, insert_id, Pending, Record, StagedChange,
};
use crate::repo::sqlite_repo::SqliteRepository;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};

pub type ProductRepository<'uow> = SqliteRepository<'uow, Product>;

impl Record for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> EntityId {
        self.id
    }

    fn check_valid(&self) -> Result<(), ModelValidationError> {
        self.validate()
    }

    fn insert(&mut self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "INSERT INTO products (id, name) VALUES (?1, ?2);",
            params![insert_id(self.id), self.name.as_str()],
        )?;
        self.id = conn.last_insert_rowid();
        Ok(changed)
    }

    fn update(&self, conn: &Connection) -> RepoResult<usize> {
        let changed = conn.execute(
            "UPDATE products SET name = ?2 WHERE id = ?1;",
            params![self.id, self.name.as_str()],
        )?;
        ensure_changed(changed, EntityKind::Product, self.id)
    }

    fn delete(conn: &Connection, id: EntityId) -> RepoResult<usize> {
        let links = count_rows(
            conn,
            "SELECT COUNT(*) FROM order_products WHERE product_id = ?1;",
            id,
        )?;
        let changed = conn.execute("DELETE FROM products WHERE id = ?1;", [id])?;
        Ok(ensure_changed(changed, EntityKind::Product, id)? + links)
    }

    fn select_one(conn: &Connection, id: EntityId) -> RepoResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM products WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => {
                let mut product = parse_product_row(row)?;
                product.order_ids = load_order_ids(conn, product.id)?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    fn select_all(conn: &Connection) -> RepoResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM products ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            let mut product = parse_product_row(row)?;
            product.order_ids = load_order_ids(conn, product.id)?;
            products.push(product);
        }
        Ok(products)
    }

    fn stage(change: Pending<Self>) -> StagedChange {
        StagedChange::Product(change)
    }

    fn staged(change: &StagedChange) -> Option<&Pending<Self>> {
        match change {
            StagedChange::Product(pending) => Some(pending),
            _ => None,
        }
    }

    /// Updates rewrite the name only; memberships stay as they were.
    fn merged_update(&self, previous: &Self) -> Self {
        Product {
            order_ids: previous.order_ids.clone(),
            ..self.clone()
        }
    }

    fn cascade_removal(
        &mut self,
        conn: &Connection,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<bool> {
        match kind {
            EntityKind::Order => self.order_ids.retain(|order_id| *order_id != id),
            EntityKind::Customer => {
                let removed = order_ids_for_customer(conn, id)?;
                self.order_ids.retain(|order_id| !removed.contains(order_id));
            }
            EntityKind::Product => {}
        }
        Ok(true)
    }
}

/// Parses `id, name` columns into a product without back-references.
pub(crate) fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    Ok(Product::with_id(row.get("id")?, row.get::<_, String>("name")?))
}

fn load_order_ids(conn: &Connection, product_id: EntityId) -> RepoResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(
        "SELECT order_id
         FROM order_products
         WHERE product_id = ?1
         ORDER BY order_id ASC;",
    )?;
    let mut rows = stmt.query([product_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn order_ids_for_customer(conn: &Connection, customer_id: EntityId) -> RepoResult<Vec<EntityId>> {
    let mut stmt = conn.prepare("SELECT id FROM orders WHERE customer_id = ?1;")?;
    let mut rows = stmt.query([customer_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}
