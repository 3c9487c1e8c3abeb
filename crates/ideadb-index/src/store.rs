//! Authoritative item table.
//!
//! Rows are append-only; row `i` pairs with vector `i` in the index, and
//! that pairing is the invariant everything else leans on. Deletion is a
//! tombstone flag so positions stay stable forever.

use std::collections::HashMap;

use ideadb_core::error::{Error, Result};
use ideadb_core::types::{InteractionKind, Item, ItemId};

#[derive(Default)]
pub struct ItemStore {
    items: Vec<Item>,
    by_id: HashMap<ItemId, usize>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from snapshot rows. Duplicate ids mean the
    /// artifact is corrupt, not merely invalid input.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if by_id.insert(item.id.clone(), position).is_some() {
                return Err(Error::CorruptIndexState(format!(
                    "duplicate item id '{}' in persisted rows",
                    item.id
                )));
            }
        }
        Ok(Self { items, by_id })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a row and returns its position. The caller inserts the
    /// matching vector into the index under the same lock.
    pub fn append(&mut self, item: Item) -> Result<usize> {
        if self.by_id.contains_key(&item.id) {
            return Err(Error::InvalidInput(format!("duplicate item id '{}'", item.id)));
        }
        let position = self.items.len();
        self.by_id.insert(item.id.clone(), position);
        self.items.push(item);
        Ok(position)
    }

    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Item> {
        self.position_of(id).and_then(|p| self.items.get(p))
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Applies one interaction to the counters and recomputes the
    /// popularity score in place. View and share leave the counters
    /// untouched.
    pub fn update_engagement(&mut self, id: &str, kind: InteractionKind) -> Result<&Item> {
        let position = self
            .position_of(id)
            .ok_or_else(|| Error::NotFound(format!("item '{id}'")))?;
        let item = &mut self.items[position];
        match kind {
            InteractionKind::Like => item.likes += 1,
            InteractionKind::Dislike => item.dislikes += 1,
            InteractionKind::View | InteractionKind::Share => {}
        }
        item.recompute_popularity();
        Ok(&self.items[position])
    }

    /// Marks an item superseded. Its row and vector stay where they are.
    pub fn tombstone(&mut self, id: &str) -> Result<()> {
        let position = self
            .position_of(id)
            .ok_or_else(|| Error::NotFound(format!("item '{id}'")))?;
        self.items[position].tombstoned = true;
        Ok(())
    }

    /// All rows in insertion order, tombstoned included; snapshot export.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Rows still visible to queries and listings.
    pub fn iter_live(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| !item.tombstoned)
    }
}
