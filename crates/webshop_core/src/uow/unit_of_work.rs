use super::context::StoreContext;
use crate::db::migrations::{current_version, latest_version};
use crate::repo::customer_repo::CustomerRepository;
use crate::repo::order_repo::OrderRepository;
use crate::repo::product_repo::ProductRepository;
use crate::repo::record::{Pending, Record, StagedChange};
use crate::repo::sqlite_repo::SqliteRepository;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

const REQUIRED_TABLES: [&str; 4] = ["products", "customers", "orders", "order_products"];

/// Coordinates the repositories of one business transaction.
///
/// ```no_run
/// use webshop_core::db::open_db;
/// use webshop_core::{Product, Repository, UnitOfWork};
///
/// let mut uow = UnitOfWork::try_new(open_db("shop.sqlite3")?)?;
/// uow.products().add(Product::with_id(1, "Widget"))?;
/// let affected = uow.complete()?;
/// assert_eq!(affected, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct UnitOfWork {
    ctx: StoreContext,
    last_commit: Vec<StagedChange>,
}

impl UnitOfWork {
    /// Binds a unit of work to a migrated store connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is behind this build.
    /// - `MissingRequiredTable` when a shop table is absent.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_store_ready(&conn)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("event=uow_open module=uow status=ok");
        Ok(Self {
            ctx: StoreContext::new(conn),
            last_commit: Vec::new(),
        })
    }

    pub fn products(&self) -> ProductRepository<'_> {
        SqliteRepository::new(&self.ctx)
    }

    pub fn customers(&self) -> CustomerRepository<'_> {
        SqliteRepository::new(&self.ctx)
    }

    pub fn orders(&self) -> OrderRepository<'_> {
        SqliteRepository::new(&self.ctx)
    }

    /// Number of staged changes not yet committed.
    pub fn pending_changes(&self) -> usize {
        self.ctx.staged_len()
    }

    /// Commits every staged change in one transaction.
    ///
    /// Returns the number of rows written, including order/product links.
    /// On failure the transaction rolls back, the error is returned unchanged
    /// and the staged changes are kept.
    pub fn complete(&mut self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let mut batch = self.ctx.staged.borrow().clone();
        if batch.is_empty() {
            debug!("event=uow_complete module=uow status=ok staged=0 affected=0");
            self.last_commit.clear();
            return Ok(0);
        }

        match commit_batch(&mut self.ctx.conn, &mut batch) {
            Ok(affected) => {
                info!(
                    "event=uow_complete module=uow status=ok staged={} affected={} duration_ms={}",
                    batch.len(),
                    affected,
                    started_at.elapsed().as_millis()
                );
                self.ctx.staged.get_mut().clear();
                self.last_commit = batch;
                Ok(affected)
            }
            Err(err) => {
                error!(
                    "event=uow_complete module=uow status=error staged={} duration_ms={} error={}",
                    batch.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Drops all staged changes and returns how many were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = std::mem::take(self.ctx.staged.get_mut()).len();
        if discarded > 0 {
            info!("event=uow_discard module=uow status=ok discarded={discarded}");
        }
        discarded
    }

    /// Entities of type `T` written by the last successful `complete`, with
    /// store-assigned ids filled in.
    pub fn committed<T: Record>(&self) -> Vec<T> {
        self.last_commit
            .iter()
            .filter_map(T::staged)
            .filter_map(|pending| match pending {
                Pending::Add(item) | Pending::Update(item) => Some(item.clone()),
                Pending::Remove(_) => None,
            })
            .collect()
    }

    /// Releases the store connection. Uncommitted changes are discarded.
    pub fn dispose(self) -> RepoResult<()> {
        let StoreContext { conn, staged } = self.ctx;
        let discarded = staged.into_inner().len();
        if discarded > 0 {
            warn!("event=uow_dispose module=uow status=ok discarded={discarded}");
        }
        conn.close().map_err(|(_, err)| {
            error!("event=uow_dispose module=uow status=error error={err}");
            RepoError::from(err)
        })
    }
}

fn commit_batch(conn: &mut Connection, batch: &mut [StagedChange]) -> RepoResult<usize> {
    let tx = conn.transaction()?;
    let mut affected = 0;
    for change in batch.iter_mut() {
        affected += change.apply(&tx)?;
    }
    tx.commit()?;
    Ok(affected)
}

fn ensure_store_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::UnitOfWork;
    use crate::db::open_db_in_memory;
    use crate::model::product::Product;
    use crate::repo::Repository;

    #[test]
    fn discard_drops_staged_changes() {
        let mut uow = UnitOfWork::try_new(open_db_in_memory().unwrap()).unwrap();
        uow.products().add(Product::with_id(1, "Widget")).unwrap();
        assert_eq!(uow.pending_changes(), 1);

        assert_eq!(uow.discard(), 1);
        assert_eq!(uow.pending_changes(), 0);
        assert!(uow.products().get(1).unwrap().is_none());
        assert_eq!(uow.complete().unwrap(), 0);
    }

    #[test]
    fn dispose_closes_connection_with_pending_changes() {
        let uow = UnitOfWork::try_new(open_db_in_memory().unwrap()).unwrap();
        uow.products().add(Product::new("Gadget")).unwrap();
        uow.dispose().expect("dispose should close the connection");
    }
}
