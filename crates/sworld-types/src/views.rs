//! Serializable read models handed to the transport layer.
//!
//! Views are plain snapshots: they are assembled from live simulation state
//! at query time and never hold locks or references back into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, EnemyId, PortalId, UserId, ZoneId};
use crate::items::Item;

/// Public projection of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Gold banked by the user.
    pub gold: u64,
}

/// Public projection of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterView {
    /// Character identifier.
    pub id: CharacterId,
    /// Character level.
    pub level: u32,
    /// Current health. May be negative after a killing blow.
    pub health: i64,
    /// Maximum health.
    pub max_health: i64,
    /// Gold carried by the character (swept to the user on return).
    pub gold: u64,
    /// Whether the character is inside a portal right now.
    pub exploring: bool,
}

/// Public projection of an enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyView {
    /// Enemy identifier.
    pub id: EnemyId,
    /// Enemy level.
    pub level: u32,
    /// Current health.
    pub health: i64,
    /// Maximum health.
    pub max_health: i64,
    /// Lane position.
    pub position: i64,
}

/// Public projection of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneView {
    /// Zone identifier.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
}

/// Public projection of a portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalView {
    /// Portal identifier.
    pub id: PortalId,
    /// Owner of the portal.
    pub owner: UserId,
    /// Whether the portal is still open.
    pub is_open: bool,
    /// Level of the stone that opened the portal.
    pub level: u32,
    /// Zone the portal was opened into.
    pub zone: ZoneView,
    /// Total lifetime in whole seconds.
    pub duration_secs: u64,
    /// Remaining lifetime in whole seconds (0 once closed).
    pub time_left_secs: u64,
    /// Wall-clock time the portal opened.
    pub opened_at: DateTime<Utc>,
    /// Farthest lane unit that already produced an event.
    pub cleared_distance: i64,
    /// Number of characters currently exploring.
    pub explorers: usize,
    /// Enemies slain so far.
    pub defeated_enemies: Vec<EnemyView>,
}

/// One slot of a bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    /// Slot index.
    pub slot: usize,
    /// The item stored there, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// One bag with every slot listed, empty ones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagView {
    /// Bag index in the owner's bag list.
    pub id: usize,
    /// All slots in order.
    pub slots: Vec<SlotView>,
}
