//! Fixed-capacity, slot-addressed bags.
//!
//! A bag never stacks, never compacts and never reorders: an item stays in
//! the slot it was stored in until it is dropped from that exact slot.

use sworld_types::{BagView, Item, SlotView};

use crate::error::InventoryError;

/// A bag of `capacity` slots, each empty or holding one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bag {
    slots: Vec<Option<Item>>,
}

impl Bag {
    /// Create an empty bag with the given number of slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots in the bag.
    pub const fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// All slots in order, empty ones included.
    pub fn items(&self) -> &[Option<Item>] {
        &self.slots
    }

    /// Borrow the item stored at `slot`.
    ///
    /// # Errors
    ///
    /// [`InventoryError::InvalidSlot`] when out of bounds,
    /// [`InventoryError::EmptySlot`] when nothing is stored there.
    pub fn get_item(&self, slot: usize) -> Result<&Item, InventoryError> {
        self.slot(slot)?
            .as_ref()
            .ok_or(InventoryError::EmptySlot { slot })
    }

    /// Find the lowest empty slot able to hold `item`.
    ///
    /// Items do not stack, so any empty slot will do; the item is taken so
    /// future item kinds can restrict where they fit.
    pub fn find_empty_slot(&self, _item: &Item) -> Result<usize, InventoryError> {
        self.slots
            .iter()
            .position(Option::is_none)
            .ok_or(InventoryError::InventoryFull)
    }

    /// Store `item` at `slot`. Never relocates the item on conflict.
    pub fn store_item(&mut self, item: Item, slot: usize) -> Result<(), InventoryError> {
        let entry = self.slot_mut(slot)?;
        if entry.is_some() {
            return Err(InventoryError::SlotOccupied { slot });
        }
        *entry = Some(item);
        Ok(())
    }

    /// Remove and return the item stored at `slot`, leaving the slot empty.
    pub fn drop_item(&mut self, slot: usize) -> Result<Item, InventoryError> {
        self.slot_mut(slot)?
            .take()
            .ok_or(InventoryError::EmptySlot { slot })
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Snapshot the bag for the transport layer.
    pub fn view(&self, id: usize) -> BagView {
        BagView {
            id,
            slots: self
                .slots
                .iter()
                .enumerate()
                .map(|(slot, item)| SlotView {
                    slot,
                    item: item.clone(),
                })
                .collect(),
        }
    }

    fn slot(&self, slot: usize) -> Result<&Option<Item>, InventoryError> {
        let capacity = self.capacity();
        self.slots
            .get(slot)
            .ok_or(InventoryError::InvalidSlot { slot, capacity })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Option<Item>, InventoryError> {
        let capacity = self.capacity();
        self.slots
            .get_mut(slot)
            .ok_or(InventoryError::InvalidSlot { slot, capacity })
    }
}
