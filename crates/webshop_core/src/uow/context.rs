//! Store context shared by the repositories of one unit of work.

use crate::model::{EntityId, UNASSIGNED_ID};
use crate::repo::record::{Pending, Record, StagedChange};
use crate::repo::RepoResult;
use rusqlite::Connection;
use std::cell::RefCell;

/// Connection plus the journal of changes staged against it.
///
/// Reads overlay the journal on committed rows, so a unit of work sees its
/// own staged writes while other connections do not. The overlay follows
/// the store's rules: updates need an existing row and removals cascade.
pub struct StoreContext {
    pub(super) conn: Connection,
    pub(super) staged: RefCell<Vec<StagedChange>>,
}

impl StoreContext {
    pub(super) fn new(conn: Connection) -> Self {
        Self {
            conn,
            staged: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn stage(&self, change: StagedChange) {
        self.staged.borrow_mut().push(change);
    }

    /// Number of journaled changes awaiting commit.
    pub fn staged_len(&self) -> usize {
        self.staged.borrow().len()
    }

    /// Looks up one entity: the stored row with the journal replayed on top.
    ///
    /// A staged update of an id that neither the store nor an earlier staged
    /// add holds stays invisible, matching what the commit would write.
    pub fn find<T: Record>(&self, id: EntityId) -> RepoResult<Option<T>> {
        let mut current = T::select_one(&self.conn, id)?;
        if id == UNASSIGNED_ID {
            return Ok(current);
        }

        let staged = self.staged.borrow();
        for change in staged.iter() {
            match T::staged(change) {
                Some(Pending::Add(item)) if item.id() == id => current = Some(item.clone()),
                Some(Pending::Update(item)) if item.id() == id => {
                    current = current.map(|previous| item.merged_update(&previous));
                }
                Some(Pending::Remove(removed)) if *removed == id => current = None,
                Some(_) => {}
                None => {
                    let keep = match (current.as_mut(), change.removed()) {
                        (Some(item), Some((kind, removed))) => {
                            item.cascade_removal(&self.conn, kind, removed)?
                        }
                        _ => true,
                    };
                    if !keep {
                        current = None;
                    }
                }
            }
        }
        Ok(current)
    }

    /// Lists committed entities with the journal replayed on top.
    ///
    /// Staged additions are appended after the stored rows. Staged removals of
    /// other entity types apply the store's delete cascades.
    pub fn find_all<T: Record>(&self) -> RepoResult<Vec<T>> {
        let mut items = T::select_all(&self.conn)?;
        let staged = self.staged.borrow();
        for change in staged.iter() {
            match T::staged(change) {
                Some(Pending::Add(item)) => {
                    if item.id() != UNASSIGNED_ID {
                        items.retain(|existing| existing.id() != item.id());
                    }
                    items.push(item.clone());
                }
                Some(Pending::Update(item)) => {
                    if let Some(slot) = items.iter_mut().find(|existing| existing.id() == item.id()) {
                        *slot = item.merged_update(slot);
                    }
                }
                Some(Pending::Remove(id)) => items.retain(|existing| existing.id() != *id),
                None => {
                    if let Some((kind, removed)) = change.removed() {
                        let mut kept = Vec::with_capacity(items.len());
                        for mut item in items {
                            if item.cascade_removal(&self.conn, kind, removed)? {
                                kept.push(item);
                            }
                        }
                        items = kept;
                    }
                }
            }
        }
        Ok(items)
    }
}
