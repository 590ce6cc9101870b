use std::collections::HashMap;

use super::items::ItemRef;
use crate::error::CraftError;

/// Party-owned item counts. The host game supplies the real implementation;
/// crafting only counts, grants and consumes.
pub trait Inventory {
    fn count(&self, item: ItemRef) -> u32;

    fn grant(&mut self, item: ItemRef, amount: u32);

    /// Remove `amount` units, or fail without changing anything.
    fn consume(&mut self, item: ItemRef, amount: u32) -> Result<(), CraftError>;
}

#[derive(Clone, Debug, Default)]
pub struct PartyInventory {
    items: HashMap<ItemRef, u32>,
}

impl PartyInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: ItemRef, count: u32) {
        *self.items.entry(item).or_insert(0) += count;
    }

    pub fn remove(&mut self, item: ItemRef, count: u32) -> bool {
        let current = self.items.get(&item).copied().unwrap_or(0);
        if current < count {
            return false;
        }
        if current == count {
            self.items.remove(&item);
        } else {
            self.items.insert(item, current - count);
        }
        true
    }

    /// Owned stacks sorted by table, then id.
    pub fn non_empty_items(&self) -> Vec<(ItemRef, u32)> {
        let mut items: Vec<(ItemRef, u32)> = self
            .items
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&item, &count)| (item, count))
            .collect();
        items.sort_by_key(|(item, _)| *item);
        items
    }
}

impl Inventory for PartyInventory {
    fn count(&self, item: ItemRef) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    fn grant(&mut self, item: ItemRef, amount: u32) {
        self.add(item, amount);
    }

    fn consume(&mut self, item: ItemRef, amount: u32) -> Result<(), CraftError> {
        let have = self.count(item);
        if self.remove(item, amount) {
            Ok(())
        } else {
            Err(CraftError::InsufficientStock { item, have, need: amount })
        }
    }
}
