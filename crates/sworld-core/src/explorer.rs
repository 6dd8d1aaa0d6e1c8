//! Exploration sessions binding a character to a portal.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::character::Character;
use crate::combat::{DamageSink, Skill};
use crate::error::WorldError;
use crate::event::PortalEvent;
use crate::portal::Portal;
use crate::simulation;
use crate::user::User;

/// One character's live session inside one portal.
///
/// The session ends on character death, a return to town, or portal close.
/// [`Explorer::finish`] then reconciles the session into the user exactly
/// once.
pub struct Explorer {
    user: Arc<User>,
    character: Arc<Character>,
    portal: Arc<Portal>,
    position: AtomicI64,
    /// Child of the portal token, cancelled early on death or return.
    session: CancellationToken,
    /// Cancelled once the session has been reconciled.
    returned: CancellationToken,
    finished: AtomicBool,
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("character", &self.character.id())
            .field("portal", &self.portal.id())
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Put `character` into `portal` and register the session there.
    ///
    /// Loops are not started; see [`simulation::spawn_explorer`].
    pub async fn enter(
        user: Arc<User>,
        character: Arc<Character>,
        portal: Arc<Portal>,
    ) -> Result<Arc<Self>, WorldError> {
        if !portal.is_open() {
            return Err(WorldError::PortalClosed(portal.id()));
        }
        character.begin_exploring()?;

        let explorer = Arc::new(Self {
            session: portal.closed().child_token(),
            returned: CancellationToken::new(),
            finished: AtomicBool::new(false),
            position: AtomicI64::new(0),
            user,
            character,
            portal,
        });
        explorer.portal.add_explorer(Arc::clone(&explorer)).await;

        info!(
            portal_id = %explorer.portal.id(),
            character_id = %explorer.character.id(),
            "Explorer entered portal"
        );
        Ok(explorer)
    }

    /// The exploring character.
    pub const fn character(&self) -> &Arc<Character> {
        &self.character
    }

    /// The portal being explored.
    pub const fn portal(&self) -> &Arc<Portal> {
        &self.portal
    }

    /// Lane position.
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    /// Session token, observed by both explorer loops.
    pub const fn session(&self) -> &CancellationToken {
        &self.session
    }

    /// Whether the session has been reconciled.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// One movement tick: hold position while an enemy is engaged,
    /// otherwise step forward and handle whatever waits on new ground.
    pub async fn step(&self) {
        let position = self.position();
        let engagement = self.portal.combat().engagement_distance;
        if let Some((enemy, distance)) = self.portal.closest_enemy(position).await {
            if distance < engagement {
                debug!(
                    character_id = %self.character.id(),
                    enemy_id = %enemy.id(),
                    position,
                    "Holding position"
                );
                return;
            }
        }

        if let Some(event) = self.advance() {
            self.apply_event(event).await;
        }
    }

    /// Move forward one unit. Rolls an event when the new unit has not
    /// been cleared by anyone yet.
    pub fn advance(&self) -> Option<PortalEvent> {
        let position = self
            .position
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1);
        debug!(character_id = %self.character.id(), position, "Explorer advanced");
        self.portal
            .claim_distance(position)
            .then(|| self.portal.random_event(position))
    }

    /// Apply a rolled event to the character. Failures are logged.
    pub async fn apply_event(&self, event: PortalEvent) {
        let character_id = self.character.id();
        match event {
            PortalEvent::Item(item) => {
                let kind = item.kind();
                match self.character.pickup_item(item).await {
                    Ok(location) => {
                        info!(%character_id, item = kind, %location, "Item picked up");
                    }
                    Err(err) => warn!(%character_id, item = kind, %err, "Item lost"),
                }
            }
            PortalEvent::Gold(amount) => {
                self.character.add_gold(amount);
                debug!(%character_id, amount, "Gold picked up");
            }
            PortalEvent::Enemy(enemy) => {
                if !self.portal.is_open() {
                    warn!(%character_id, portal_id = %self.portal.id(), "Enemy spawn after close ignored");
                    return;
                }
                info!(
                    portal_id = %self.portal.id(),
                    enemy_id = %enemy.id(),
                    level = enemy.level(),
                    health = enemy.max_health(),
                    position = enemy.position(),
                    "Enemy spawned"
                );
                self.portal.add_enemy(Arc::clone(&enemy)).await;
                simulation::spawn_enemy(Arc::clone(&self.portal), enemy);
            }
            PortalEvent::Nothing => {}
        }
    }

    /// End the session early. The loops notice on their next wait.
    pub fn return_to_town(&self) {
        info!(character_id = %self.character.id(), "Returning to town");
        self.session.cancel();
    }

    /// Reconcile the session into the user. Only the first call has any
    /// effect.
    pub async fn finish(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        self.session.cancel();

        let gold = self.character.take_gold();
        self.user.deposit_gold(gold);
        self.character.finish_exploring();
        self.portal.remove_explorer(self.character.id()).await;
        self.returned.cancel();

        info!(
            portal_id = %self.portal.id(),
            character_id = %self.character.id(),
            user = self.user.username(),
            gold,
            position = self.position(),
            health = self.character.health(),
            "Explorer left portal"
        );
    }

    /// Wait until the session has been reconciled.
    pub async fn wait_returned(&self) {
        self.returned.cancelled().await;
    }
}

impl DamageSink for Explorer {
    fn receive_damage(&self, skill: &dyn Skill, amount: i64) -> i64 {
        let (previous, health) = self.character.apply_damage(amount);
        debug!(
            character_id = %self.character.id(),
            amount,
            health,
            skill = skill.name(),
            "Character hit"
        );
        if previous > 0 && health <= 0 {
            info!(character_id = %self.character.id(), portal_id = %self.portal.id(), "Character died");
            self.session.cancel();
        }
        health
    }

    fn health(&self) -> i64 {
        self.character.health()
    }
}
