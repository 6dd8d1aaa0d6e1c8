//! Error types for the sworld-items crate.
//!
//! Every bag, inventory and merge operation validates before mutating, so
//! returning one of these errors always means nothing changed.

use sworld_types::ItemLocation;

/// Errors raised by bag and inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// No empty slot was left for the item.
    #[error("there is no space left for that item")]
    InventoryFull,

    /// The slot index is outside the bag.
    #[error("invalid slot {slot}: bag capacity is {capacity}")]
    InvalidSlot {
        /// The requested slot.
        slot: usize,
        /// Capacity of the bag.
        capacity: usize,
    },

    /// The slot holds nothing.
    #[error("slot {slot} is empty")]
    EmptySlot {
        /// The requested slot.
        slot: usize,
    },

    /// The slot already holds an item.
    #[error("slot {slot} is not empty")]
    SlotOccupied {
        /// The requested slot.
        slot: usize,
    },

    /// The owner has no bag with this index.
    #[error("bag {bag_id} does not exist")]
    InvalidBag {
        /// The requested bag.
        bag_id: usize,
    },

    /// The item at the location is not valid for the operation.
    #[error("wrong item: expected {expected}, found {found}")]
    WrongItem {
        /// Item kind the operation needs.
        expected: &'static str,
        /// Item kind actually stored.
        found: &'static str,
    },

    /// Two operands of an operation point at the same slot.
    #[error("{0} was given twice")]
    SameSlot(ItemLocation),
}

/// Reasons two portal stones cannot be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The stones open different zones.
    #[error("zones are not compatible")]
    IncompatibleZones,

    /// Level or duration combination is not supported.
    #[error("stones are not compatible")]
    IncompatibleStones,
}
