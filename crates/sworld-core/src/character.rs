//! Player characters.
//!
//! Vitals, gold and the exploring flag are atomics written by the
//! simulation loops; the bags sit behind an async mutex shared with
//! inventory operations issued by the owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use sworld_items::Inventory;
use sworld_types::{BagView, CharacterId, CharacterView, Item, ItemLocation, UserId};
use tokio::sync::Mutex;

use crate::combat::{CombatStats, DamageSource, Skill, available_skill};
use crate::error::WorldError;

/// A character owned by a user.
#[derive(Debug)]
pub struct Character {
    id: CharacterId,
    owner: UserId,
    level: u32,
    max_health: i64,
    health: AtomicI64,
    gold: AtomicU64,
    exploring: AtomicBool,
    stats: Arc<CombatStats>,
    skills: Vec<Box<dyn Skill>>,
    inventory: Mutex<Inventory>,
}

impl Character {
    /// Build a character at full health.
    ///
    /// Skills are assembled by the caller and usually share `stats` as
    /// their damage source.
    pub fn new(
        owner: UserId,
        max_health: i64,
        stats: Arc<CombatStats>,
        skills: Vec<Box<dyn Skill>>,
        inventory: Inventory,
    ) -> Self {
        Self {
            id: CharacterId::new(),
            owner,
            level: stats.level,
            max_health,
            health: AtomicI64::new(max_health),
            gold: AtomicU64::new(0),
            exploring: AtomicBool::new(false),
            stats,
            skills,
            inventory: Mutex::new(inventory),
        }
    }

    /// Character identifier.
    pub const fn id(&self) -> CharacterId {
        self.id
    }

    /// Owning user.
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    /// Character level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current health.
    pub fn health(&self) -> i64 {
        self.health.load(Ordering::Acquire)
    }

    /// Maximum health.
    pub const fn max_health(&self) -> i64 {
        self.max_health
    }

    /// Whether the character has health left.
    pub fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Damage dealt by the character's skills.
    pub fn damage(&self) -> i64 {
        self.stats.damage()
    }

    /// Gold carried during the current (or last) exploration.
    pub fn gold(&self) -> u64 {
        self.gold.load(Ordering::Acquire)
    }

    /// Add gold to the purse.
    pub fn add_gold(&self, amount: u64) {
        let _ = self
            .gold
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |gold| {
                Some(gold.saturating_add(amount))
            });
    }

    /// Empty the purse, returning what it held.
    pub fn take_gold(&self) -> u64 {
        self.gold.swap(0, Ordering::AcqRel)
    }

    /// Whether an exploration session is active.
    pub fn is_exploring(&self) -> bool {
        self.exploring.load(Ordering::Acquire)
    }

    /// Mark the start of an exploration session.
    ///
    /// Fails when the character is dead or already exploring; at most one
    /// session can hold the flag.
    pub fn begin_exploring(&self) -> Result<(), WorldError> {
        if !self.is_alive() {
            return Err(WorldError::CharacterDead(self.id));
        }
        self.exploring
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| WorldError::CharacterBusy(self.id))
    }

    /// Clear the exploring flag.
    pub fn finish_exploring(&self) {
        self.exploring.store(false, Ordering::Release);
    }

    /// Subtract health. Returns `(previous, new)` health.
    pub fn apply_damage(&self, amount: i64) -> (i64, i64) {
        let previous = self
            .health
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |health| {
                Some(health.saturating_sub(amount))
            })
            .unwrap_or_else(|health| health);
        (previous, previous.saturating_sub(amount))
    }

    /// First ready skill. Dead characters have none.
    pub fn available_skill(&self) -> Option<&dyn Skill> {
        if !self.is_alive() {
            return None;
        }
        available_skill(&self.skills)
    }

    /// The character's bags.
    pub const fn inventory(&self) -> &Mutex<Inventory> {
        &self.inventory
    }

    /// Store `item` in the first free slot across all bags.
    pub async fn pickup_item(&self, item: Item) -> Result<ItemLocation, WorldError> {
        Ok(self.inventory.lock().await.pickup(item)?)
    }

    /// Snapshot of the bags.
    pub async fn inventory_view(&self) -> Vec<BagView> {
        self.inventory.lock().await.view()
    }

    /// Read model.
    pub fn view(&self) -> CharacterView {
        CharacterView {
            id: self.id,
            level: self.level,
            health: self.health(),
            max_health: self.max_health,
            gold: self.gold(),
            exploring: self.is_exploring(),
        }
    }
}
