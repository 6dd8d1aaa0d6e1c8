//! Shared type definitions for the Sworld portal simulation.
//!
//! This crate is the single source of truth for identifiers, the item model
//! and the read-model views used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`items`] -- Items (stones, weapons) and slot coordinates
//! - [`views`] -- Serializable snapshots for the transport layer

pub mod ids;
pub mod items;
pub mod views;

// Re-export all public types at crate root for convenience.
pub use ids::{CharacterId, EnemyId, PortalId, UserId, ZoneId};
pub use items::{Item, ItemLocation, PortalStone, Weapon};
pub use views::{BagView, CharacterView, EnemyView, PortalView, SlotView, UserView, ZoneView};
