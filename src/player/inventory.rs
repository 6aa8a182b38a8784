//! Bounded inventory.
//!
//! An item lives in exactly one place: the inventory, an equipment slot, the
//! ground, or merchant stock. Moves between them are whole-value moves.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_INVENTORY_CAPACITY;
use crate::equipment::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
    capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INVENTORY_CAPACITY)
    }
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item. A full inventory hands the item back.
    pub fn add(&mut self, item: Item) -> Result<usize, Item> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Put an item back at `index` (or the end). Only used right after a
    /// removal, so it may not exceed capacity.
    pub(crate) fn insert(&mut self, index: usize, item: Item) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn used_slots(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
