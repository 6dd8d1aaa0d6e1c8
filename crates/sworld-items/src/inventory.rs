//! Multi-bag inventories for characters and users.
//!
//! An [`Inventory`] is an ordered list of [`Bag`]s addressed through
//! [`ItemLocation`]s. Pickup scans the bags in index order and takes the
//! first free slot, so items fill bag 0 before spilling into bag 1.

use sworld_types::{BagView, Item, ItemLocation, PortalStone};

use crate::bag::Bag;
use crate::error::InventoryError;

/// An owner's full set of bags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    bags: Vec<Bag>,
}

impl Inventory {
    /// Create `bag_count` empty bags of `capacity` slots each.
    pub fn new(bag_count: usize, capacity: usize) -> Self {
        Self {
            bags: (0..bag_count).map(|_| Bag::new(capacity)).collect(),
        }
    }

    /// All bags in order.
    pub fn bags(&self) -> &[Bag] {
        &self.bags
    }

    /// Borrow one bag.
    pub fn bag(&self, bag_id: usize) -> Result<&Bag, InventoryError> {
        self.bags
            .get(bag_id)
            .ok_or(InventoryError::InvalidBag { bag_id })
    }

    /// Mutably borrow one bag.
    pub fn bag_mut(&mut self, bag_id: usize) -> Result<&mut Bag, InventoryError> {
        self.bags
            .get_mut(bag_id)
            .ok_or(InventoryError::InvalidBag { bag_id })
    }

    /// First empty slot across all bags, in bag-index order.
    pub fn find_empty_slot(&self, item: &Item) -> Result<ItemLocation, InventoryError> {
        self.bags
            .iter()
            .enumerate()
            .find_map(|(bag_id, bag)| {
                bag.find_empty_slot(item)
                    .ok()
                    .map(|slot| ItemLocation::new(bag_id, slot))
            })
            .ok_or(InventoryError::InventoryFull)
    }

    /// Store `item` in the first empty slot and report where it went.
    pub fn pickup(&mut self, item: Item) -> Result<ItemLocation, InventoryError> {
        let location = self.find_empty_slot(&item)?;
        self.store_item(item, location)?;
        Ok(location)
    }

    /// Borrow the item at `location`.
    pub fn get_item(&self, location: ItemLocation) -> Result<&Item, InventoryError> {
        self.bag(location.bag_id)?.get_item(location.slot)
    }

    /// Borrow the portal stone at `location`.
    ///
    /// # Errors
    ///
    /// [`InventoryError::WrongItem`] if something other than a stone is stored there.
    pub fn get_stone(&self, location: ItemLocation) -> Result<&PortalStone, InventoryError> {
        let item = self.get_item(location)?;
        item.as_stone().ok_or_else(|| InventoryError::WrongItem {
            expected: "stone",
            found: item.kind(),
        })
    }

    /// Store `item` at an explicit location.
    pub fn store_item(&mut self, item: Item, location: ItemLocation) -> Result<(), InventoryError> {
        self.bag_mut(location.bag_id)?.store_item(item, location.slot)
    }

    /// Remove and return the item at `location`.
    pub fn drop_item(&mut self, location: ItemLocation) -> Result<Item, InventoryError> {
        self.bag_mut(location.bag_id)?.drop_item(location.slot)
    }

    /// Total number of stored items.
    pub fn item_count(&self) -> usize {
        self.bags.iter().map(Bag::len).sum()
    }

    /// Snapshot every bag for the transport layer.
    pub fn view(&self) -> Vec<BagView> {
        self.bags
            .iter()
            .enumerate()
            .map(|(id, bag)| bag.view(id))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use sworld_types::{Weapon, ZoneId};

    fn stone(level: u32) -> Item {
        Item::PortalStone(PortalStone {
            level,
            zone: ZoneId::new(),
            duration: Duration::from_secs(10),
            drop_interval: Duration::from_secs(1),
        })
    }

    #[test]
    fn pickup_fills_bags_in_order() {
        let mut inventory = Inventory::new(2, 2);
        let expected = [
            ItemLocation::new(0, 0),
            ItemLocation::new(0, 1),
            ItemLocation::new(1, 0),
            ItemLocation::new(1, 1),
        ];
        for location in expected {
            assert_eq!(inventory.pickup(stone(3)).unwrap(), location);
        }
        assert_eq!(inventory.item_count(), 4);
        assert_eq!(
            inventory.pickup(stone(3)),
            Err(InventoryError::InventoryFull)
        );
    }

    #[test]
    fn pickup_reuses_freed_slot_in_earlier_bag() {
        let mut inventory = Inventory::new(2, 1);
        inventory.pickup(stone(1)).unwrap();
        inventory.pickup(stone(2)).unwrap();
        inventory.drop_item(ItemLocation::new(0, 0)).unwrap();
        assert_eq!(
            inventory.pickup(stone(3)).unwrap(),
            ItemLocation::new(0, 0)
        );
    }

    #[test]
    fn unknown_bag_is_rejected() {
        let mut inventory = Inventory::new(1, 4);
        let location = ItemLocation::new(1, 0);
        assert_eq!(
            inventory.get_item(location),
            Err(InventoryError::InvalidBag { bag_id: 1 })
        );
        assert_eq!(
            inventory.drop_item(location),
            Err(InventoryError::InvalidBag { bag_id: 1 })
        );
    }

    #[test]
    fn get_stone_rejects_weapons() {
        let mut inventory = Inventory::new(1, 4);
        let location = inventory.pickup(Item::Weapon(Weapon { damage: 1 })).unwrap();
        assert_eq!(
            inventory.get_stone(location),
            Err(InventoryError::WrongItem {
                expected: "stone",
                found: "weapon",
            })
        );
    }

    #[test]
    fn view_covers_all_bags() {
        let mut inventory = Inventory::new(2, 5);
        inventory.pickup(stone(3)).unwrap();
        let view = inventory.view();
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|bag| bag.slots.len() == 5));
        assert!(view.first().unwrap().slots.first().unwrap().item.is_some());
        assert!(view.get(1).unwrap().slots.first().unwrap().item.is_none());
    }
}
