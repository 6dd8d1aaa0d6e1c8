//! The item model carried in bags.
//!
//! Items have no identity of their own: two stones with the same
//! attributes are interchangeable, and ownership only ever moves by taking
//! an item out of one slot and storing it in another.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::ZoneId;

/// A catalyst that opens a portal into a zone.
///
/// The level gates which drops a portal can produce, the duration bounds how
/// long the portal stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalStone {
    /// Portal level. Level 0 stones only serve as merge fodder and open
    /// portals without enemies.
    pub level: u32,
    /// Zone the stone opens into.
    pub zone: ZoneId,
    /// How long a portal opened with this stone stays open.
    pub duration: Duration,
    /// Spacing between drops inside the portal.
    pub drop_interval: Duration,
}

/// A weapon dropped inside a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Flat damage bonus of the weapon.
    pub damage: u32,
}

/// Anything that can sit in a bag slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A portal stone.
    PortalStone(PortalStone),
    /// A weapon.
    Weapon(Weapon),
}

impl Item {
    /// Short, stable name of the item kind (used in errors and views).
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PortalStone(_) => "stone",
            Self::Weapon(_) => "weapon",
        }
    }

    /// Borrow the stone if this item is one.
    pub const fn as_stone(&self) -> Option<&PortalStone> {
        match self {
            Self::PortalStone(stone) => Some(stone),
            Self::Weapon(_) => None,
        }
    }
}

impl From<PortalStone> for Item {
    fn from(stone: PortalStone) -> Self {
        Self::PortalStone(stone)
    }
}

impl From<Weapon> for Item {
    fn from(weapon: Weapon) -> Self {
        Self::Weapon(weapon)
    }
}

/// Coordinates of a slot inside an owner's list of bags.
///
/// A location is only meaningful against the owner it was obtained from;
/// moving an item to a different owner always goes through an explicit
/// transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemLocation {
    /// Index of the bag in the owner's bag list.
    pub bag_id: usize,
    /// Slot index within that bag.
    pub slot: usize,
}

impl ItemLocation {
    /// Build a location from a bag index and a slot index.
    pub const fn new(bag_id: usize, slot: usize) -> Self {
        Self { bag_id, slot }
    }
}

impl core::fmt::Display for ItemLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "bag {} slot {}", self.bag_id, self.slot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn item_kind_names() {
        let stone = Item::from(PortalStone {
            level: 1,
            zone: ZoneId::new(),
            duration: Duration::from_secs(10),
            drop_interval: Duration::from_secs(1),
        });
        assert_eq!(stone.kind(), "stone");
        assert!(stone.as_stone().is_some());

        let weapon = Item::from(Weapon { damage: 10 });
        assert_eq!(weapon.kind(), "weapon");
        assert!(weapon.as_stone().is_none());
    }

    #[test]
    fn items_serialize_with_kind_tag() {
        let json = serde_json::to_value(Item::Weapon(Weapon { damage: 7 })).unwrap();
        assert_eq!(json["kind"], "weapon");
        assert_eq!(json["damage"], 7);
    }
}
