//! Portal lifecycle.
//!
//! A portal goes `Open -> Closed` exactly once. Closing, whether from the
//! timer or an explicit call, cancels the portal's root token; every enemy
//! and explorer loop waits on a child of that token, so one cancellation
//! reaches them all.
//!
//! The portal also owns the per-instance drop tables and random source
//! used to roll events, items and enemies.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sworld_types::{CharacterId, Item, PortalId, PortalStone, PortalView, UserId};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::combat::{CombatStats, HitSkill, Skill};
use crate::config::CombatConfig;
use crate::enemy::Enemy;
use crate::error::WorldError;
use crate::event::PortalEvent;
use crate::explorer::Explorer;
use crate::zone::{EventDrop, Zone, ZoneTables, roll_stone};

/// Called once when the portal closes.
pub type CloseCallback = Box<dyn FnOnce(&Portal) + Send>;

/// A time-bounded instance of a zone.
pub struct Portal {
    id: PortalId,
    owner: UserId,
    stone: PortalStone,
    zone: Arc<Zone>,
    tables: ZoneTables,
    combat: CombatConfig,
    opened_at: Instant,
    opened_at_wall: DateTime<Utc>,
    open: AtomicBool,
    closed: CancellationToken,
    cleared: AtomicI64,
    enemies: RwLock<Vec<Arc<Enemy>>>,
    explorers: RwLock<Vec<Arc<Explorer>>>,
    rng: Mutex<StdRng>,
    on_close: Mutex<Option<CloseCallback>>,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("stone", &self.stone)
            .field("zone", &self.zone.name())
            .field("open", &self.is_open())
            .field("cleared", &self.cleared_distance())
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// Open a portal into `zone` and start its close timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        owner: UserId,
        stone: PortalStone,
        zone: Arc<Zone>,
        combat: CombatConfig,
        on_close: Option<CloseCallback>,
    ) -> Result<Arc<Self>, WorldError> {
        let tables = zone.compile(stone.level)?;
        let portal = Arc::new(Self {
            id: PortalId::new(),
            owner,
            stone,
            zone,
            tables,
            combat,
            opened_at: Instant::now(),
            opened_at_wall: Utc::now(),
            open: AtomicBool::new(true),
            closed: CancellationToken::new(),
            cleared: AtomicI64::new(0),
            enemies: RwLock::new(Vec::new()),
            explorers: RwLock::new(Vec::new()),
            rng: Mutex::new(StdRng::from_os_rng()),
            on_close: Mutex::new(on_close),
        });

        info!(
            portal_id = %portal.id,
            owner = %owner,
            zone = portal.zone.name(),
            level = portal.stone.level,
            duration_secs = portal.stone.duration.as_secs(),
            "Portal opened"
        );

        let timer = Arc::clone(&portal);
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timer.stone.duration) => timer.close(),
                () = timer.closed.cancelled() => {}
            }
        });

        Ok(portal)
    }

    /// Close the portal. Only the first call has any effect.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        self.closed.cancel();
        info!(portal_id = %self.id, cleared = self.cleared_distance(), "Portal closed");

        let callback = self
            .on_close
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback(self);
        }
    }

    /// Portal identifier.
    pub const fn id(&self) -> PortalId {
        self.id
    }

    /// User who opened the portal.
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    /// Portal level.
    pub const fn level(&self) -> u32 {
        self.stone.level
    }

    /// Stone that opened the portal.
    pub const fn stone(&self) -> &PortalStone {
        &self.stone
    }

    /// Zone the portal belongs to.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Loop timing for agents inside this portal.
    pub const fn combat(&self) -> &CombatConfig {
        &self.combat
    }

    /// Whether the portal is still open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Root cancellation token. Cancelled on close.
    pub const fn closed(&self) -> &CancellationToken {
        &self.closed
    }

    /// Remaining lifetime. Zero once closed.
    pub fn time_left(&self) -> Duration {
        if !self.is_open() {
            return Duration::ZERO;
        }
        self.stone.duration.saturating_sub(self.opened_at.elapsed())
    }

    /// Farthest lane unit that already produced an event.
    pub fn cleared_distance(&self) -> i64 {
        self.cleared.load(Ordering::Acquire)
    }

    /// Claim lane unit `position`. Returns true when nobody reached it
    /// before, in which case the caller rolls an event for it.
    pub fn claim_distance(&self, position: i64) -> bool {
        self.cleared.fetch_max(position, Ordering::AcqRel) < position
    }

    // -----------------------------------------------------------------------
    // Agents
    // -----------------------------------------------------------------------

    /// Register a spawned enemy.
    pub async fn add_enemy(&self, enemy: Arc<Enemy>) {
        self.enemies.write().await.push(enemy);
    }

    /// All enemies, dead ones included.
    pub async fn enemies(&self) -> Vec<Arc<Enemy>> {
        self.enemies.read().await.clone()
    }

    /// Enemies slain so far.
    pub async fn defeated_enemies(&self) -> Vec<Arc<Enemy>> {
        self.enemies
            .read()
            .await
            .iter()
            .filter(|enemy| !enemy.is_alive())
            .cloned()
            .collect()
    }

    /// Register an explorer.
    pub async fn add_explorer(&self, explorer: Arc<Explorer>) {
        self.explorers.write().await.push(explorer);
    }

    /// Drop the explorer session of `character_id`, if any.
    pub async fn remove_explorer(&self, character_id: CharacterId) -> Option<Arc<Explorer>> {
        let mut explorers = self.explorers.write().await;
        let index = explorers
            .iter()
            .position(|explorer| explorer.character().id() == character_id)?;
        Some(explorers.remove(index))
    }

    /// Explorer session of `character_id`, if one is active here.
    pub async fn find_explorer(&self, character_id: CharacterId) -> Option<Arc<Explorer>> {
        self.explorers
            .read()
            .await
            .iter()
            .find(|explorer| explorer.character().id() == character_id)
            .cloned()
    }

    /// Active explorer sessions.
    pub async fn explorers(&self) -> Vec<Arc<Explorer>> {
        self.explorers.read().await.clone()
    }

    /// Closest living enemy to `position` and its distance. Ties go to
    /// the earliest spawned.
    pub async fn closest_enemy(&self, position: i64) -> Option<(Arc<Enemy>, i64)> {
        closest(
            self.enemies.read().await.iter(),
            position,
            |enemy| enemy.is_alive(),
            |enemy| enemy.position(),
        )
    }

    /// Closest living explorer to `position` and its distance. Ties go to
    /// the earliest arrival.
    pub async fn closest_explorer(&self, position: i64) -> Option<(Arc<Explorer>, i64)> {
        closest(
            self.explorers.read().await.iter(),
            position,
            |explorer| explorer.character().is_alive(),
            |explorer| explorer.position(),
        )
    }

    // -----------------------------------------------------------------------
    // Drops
    // -----------------------------------------------------------------------

    /// Run `f` with the portal's random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Roll an event for an explorer standing at `position`.
    pub fn random_event(&self, position: i64) -> PortalEvent {
        let event = self.with_rng(|rng| {
            let drop = self
                .tables
                .events
                .sample(rng)
                .and_then(|index| self.zone.event_drop(index));
            match drop {
                Some(EventDrop::Item) => self
                    .roll_item(rng)
                    .map_or(PortalEvent::Nothing, PortalEvent::Item),
                Some(EventDrop::Gold { min, max }) => {
                    PortalEvent::Gold(rng.random_range(*min.min(max)..=*max.max(min)))
                }
                Some(EventDrop::Enemy) => self
                    .roll_enemy(rng, position)
                    .map_or(PortalEvent::Nothing, PortalEvent::Enemy),
                Some(EventDrop::Nothing) | None => PortalEvent::Nothing,
            }
        });
        debug!(portal_id = %self.id, position, event = event.kind(), "Event rolled");
        event
    }

    /// Roll an item from the item table.
    pub fn random_item(&self) -> Option<Item> {
        self.with_rng(|rng| self.roll_item(rng))
    }

    /// Roll a stone derived from this portal's stone.
    pub fn random_portal_stone(&self) -> PortalStone {
        self.with_rng(|rng| roll_stone(&self.stone, rng))
    }

    /// Roll an enemy at `position`. Level 0 portals have no enemies.
    pub fn random_enemy(&self, position: i64) -> Option<Arc<Enemy>> {
        self.with_rng(|rng| self.roll_enemy(rng, position))
    }

    fn roll_item(&self, rng: &mut StdRng) -> Option<Item> {
        let index = self.tables.items.sample(rng)?;
        let drop = self.zone.item_drop(index)?;
        Some(drop.generate(&self.stone, rng))
    }

    fn roll_enemy(&self, rng: &mut StdRng, position: i64) -> Option<Arc<Enemy>> {
        let level = self.stone.level;
        if level == 0 {
            return None;
        }
        let level_health = i64::from(level);
        let max_health = rng
            .random_range(0..10_i64)
            .saturating_mul(level_health)
            .saturating_add(level_health.saturating_mul(10));

        let stats = Arc::new(CombatStats::for_enemy(
            level,
            self.combat.enemy_damage_per_level,
        ));
        let skills: Vec<Box<dyn Skill>> =
            vec![Box::new(HitSkill::new(stats, self.combat.skill_cooldown()))];

        Some(Arc::new(Enemy::new(
            level,
            max_health,
            position,
            skills,
            self.closed.child_token(),
        )))
    }

    /// Read model.
    pub async fn view(&self) -> PortalView {
        let defeated_enemies = self
            .defeated_enemies()
            .await
            .iter()
            .map(|enemy| enemy.view())
            .collect();
        PortalView {
            id: self.id,
            owner: self.owner,
            is_open: self.is_open(),
            level: self.stone.level,
            zone: self.zone.view(),
            duration_secs: self.stone.duration.as_secs(),
            time_left_secs: self.time_left().as_secs(),
            opened_at: self.opened_at_wall,
            cleared_distance: self.cleared_distance(),
            explorers: self.explorers.read().await.len(),
            defeated_enemies,
        }
    }
}

fn closest<'a, T: 'a>(
    agents: impl Iterator<Item = &'a Arc<T>>,
    position: i64,
    alive: impl Fn(&T) -> bool,
    position_of: impl Fn(&T) -> i64,
) -> Option<(Arc<T>, i64)> {
    let mut best: Option<(&Arc<T>, i64)> = None;
    for agent in agents.filter(|agent| alive(agent)) {
        let distance = position_of(agent).abs_diff(position);
        let distance = i64::try_from(distance).unwrap_or(i64::MAX);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((agent, distance));
        }
    }
    best.map(|(agent, distance)| (Arc::clone(agent), distance))
}
