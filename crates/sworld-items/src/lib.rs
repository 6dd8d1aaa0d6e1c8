//! Slot-addressed bags, multi-bag inventories, and portal stone merging.
//!
//! Everything here is plain data manipulation with no locking and no I/O;
//! owners (characters, users) wrap an [`Inventory`] in their own lock.
//!
//! # Modules
//!
//! - [`bag`] -- Fixed-capacity bags ([`Bag`])
//! - [`inventory`] -- Ordered bag lists with pickup ([`Inventory`])
//! - [`merge`] -- Pure stone merge rules ([`merge()`])
//! - [`error`] -- [`InventoryError`] and [`MergeError`]

pub mod bag;
pub mod error;
pub mod inventory;
pub mod merge;

pub use bag::Bag;
pub use error::{InventoryError, MergeError};
pub use inventory::Inventory;
pub use merge::{TOP_UP_DURATION, merge};
