//! Zones: catalogs of level-gated, weighted drop generators.
//!
//! A zone is immutable once built and shared by every portal opened into
//! it. Each portal compiles its own [`ZoneTables`] at open time, filtered
//! to the level of the stone that opened it.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use sworld_types::{Item, PortalStone, Weapon, ZoneId, ZoneView};

use crate::config::ZoneConfig;
use crate::sampling::{DropTable, SamplingError};

/// Shortest lifetime of a stone rolled inside a portal.
pub const MIN_ROLLED_STONE_SECS: u64 = 10;

/// Generator for an item drop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDrop {
    /// A stone derived from the current portal's stone.
    RandomStone,
    /// A fixed stone into the current zone.
    Stone {
        /// Stone level.
        level: u32,
        /// Stone lifetime in seconds.
        duration_secs: u64,
    },
    /// A fixed weapon.
    Weapon {
        /// Weapon damage.
        damage: u32,
    },
}

impl ItemDrop {
    /// Produce the item for a portal opened with `stone`.
    pub fn generate<R: Rng + ?Sized>(&self, stone: &PortalStone, rng: &mut R) -> Item {
        match self {
            Self::RandomStone => Item::PortalStone(roll_stone(stone, rng)),
            Self::Stone {
                level,
                duration_secs,
            } => Item::PortalStone(PortalStone {
                level: *level,
                zone: stone.zone,
                duration: Duration::from_secs(*duration_secs),
                drop_interval: stone.drop_interval,
            }),
            Self::Weapon { damage } => Item::Weapon(Weapon { damage: *damage }),
        }
    }
}

/// Generator for a portal event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDrop {
    /// Drop an item rolled from the item table.
    Item,
    /// Drop a random amount of gold.
    Gold {
        /// Smallest amount (inclusive).
        min: u64,
        /// Largest amount (inclusive).
        max: u64,
    },
    /// Spawn an enemy at the explorer's position.
    Enemy,
    /// Nothing happens.
    Nothing,
}

/// One weighted, level-gated entry of a zone catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DropEntry<T> {
    /// Lowest portal level at which the entry can drop.
    pub min_level: u32,
    /// Relative weight among the eligible entries.
    pub weight: f64,
    /// What the entry produces.
    #[serde(flatten)]
    pub drop: T,
}

impl<T> DropEntry<T> {
    /// Build an entry.
    pub const fn new(min_level: u32, weight: f64, drop: T) -> Self {
        Self {
            min_level,
            weight,
            drop,
        }
    }
}

/// A zone and its drop catalogs.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    name: String,
    item_drops: Vec<DropEntry<ItemDrop>>,
    event_drops: Vec<DropEntry<EventDrop>>,
}

/// Per-portal compiled tables. Item and event draws are independent.
#[derive(Debug, Clone)]
pub struct ZoneTables {
    /// Table over the zone's item drops.
    pub items: DropTable,
    /// Table over the zone's event drops.
    pub events: DropTable,
}

impl Zone {
    /// An empty zone.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ZoneId::new(),
            name: name.into(),
            item_drops: Vec::new(),
            event_drops: Vec::new(),
        }
    }

    /// Build a zone from its configuration entry.
    pub fn from_config(config: &ZoneConfig) -> Self {
        Self {
            id: ZoneId::new(),
            name: config.name.clone(),
            item_drops: config.item_drops.clone(),
            event_drops: config.event_drops.clone(),
        }
    }

    /// Register an item drop.
    pub fn add_item_drop(&mut self, min_level: u32, weight: f64, drop: ItemDrop) {
        self.item_drops.push(DropEntry::new(min_level, weight, drop));
    }

    /// Register an event drop.
    pub fn add_event_drop(&mut self, min_level: u32, weight: f64, drop: EventDrop) {
        self.event_drops
            .push(DropEntry::new(min_level, weight, drop));
    }

    /// Zone identifier.
    pub const fn id(&self) -> ZoneId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item drop at `index` in registration order.
    pub fn item_drop(&self, index: usize) -> Option<&ItemDrop> {
        self.item_drops.get(index).map(|entry| &entry.drop)
    }

    /// Event drop at `index` in registration order.
    pub fn event_drop(&self, index: usize) -> Option<&EventDrop> {
        self.event_drops.get(index).map(|entry| &entry.drop)
    }

    /// Compile the tables for a portal of `level`.
    pub fn compile(&self, level: u32) -> Result<ZoneTables, SamplingError> {
        let items = DropTable::compile(
            self.item_drops.iter().map(|e| (e.min_level, e.weight)),
            level,
        )?;
        let events = DropTable::compile(
            self.event_drops.iter().map(|e| (e.min_level, e.weight)),
            level,
        )?;
        Ok(ZoneTables { items, events })
    }

    /// Read model.
    pub fn view(&self) -> ZoneView {
        ZoneView {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Roll a stone dropped inside a portal opened with `base`.
///
/// The level is uniform in `0..=base.level`. The lifetime is uniform in
/// `[max(10, 0.8 D), max(10, 1.3 D))` seconds where `D` is the base lifetime,
/// falling back to 10 seconds when that span is two seconds or less.
pub fn roll_stone<R: Rng + ?Sized>(base: &PortalStone, rng: &mut R) -> PortalStone {
    let secs = base.duration.as_secs();
    let low = (secs.saturating_mul(4) / 5).max(MIN_ROLLED_STONE_SECS);
    let high = (secs.saturating_mul(13) / 10).max(MIN_ROLLED_STONE_SECS);
    let duration_secs = if high.saturating_sub(low) <= 2 {
        MIN_ROLLED_STONE_SECS
    } else {
        rng.random_range(low..high)
    };

    PortalStone {
        level: rng.random_range(0..=base.level),
        zone: base.zone,
        duration: Duration::from_secs(duration_secs),
        drop_interval: base.drop_interval,
    }
}
