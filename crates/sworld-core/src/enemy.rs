//! Enemies spawned inside portals.

use std::sync::atomic::{AtomicI64, Ordering};

use sworld_types::{EnemyId, EnemyView};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::combat::{DamageSink, Skill, available_skill};

/// A hostile agent on a portal lane.
///
/// Dead enemies stay in their portal's list so they can be reported as
/// defeated; only their loops stop.
#[derive(Debug)]
pub struct Enemy {
    id: EnemyId,
    level: u32,
    max_health: i64,
    health: AtomicI64,
    position: AtomicI64,
    skills: Vec<Box<dyn Skill>>,
    /// Cancelled when the enemy dies. A child of the portal token, so it
    /// is also cancelled when the portal closes.
    defeated: CancellationToken,
}

impl Enemy {
    /// A full-health enemy at `position`.
    pub fn new(
        level: u32,
        max_health: i64,
        position: i64,
        skills: Vec<Box<dyn Skill>>,
        defeated: CancellationToken,
    ) -> Self {
        Self {
            id: EnemyId::new(),
            level,
            max_health,
            health: AtomicI64::new(max_health),
            position: AtomicI64::new(position),
            skills,
            defeated,
        }
    }

    /// Enemy identifier.
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Enemy level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Maximum health.
    pub const fn max_health(&self) -> i64 {
        self.max_health
    }

    /// Whether the enemy still has health left.
    pub fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Lane position.
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    /// Move one unit towards `target`. Returns the new position.
    pub fn step_toward(&self, target: i64) -> i64 {
        let step = target.saturating_sub(self.position()).signum();
        self.position
            .fetch_add(step, Ordering::AcqRel)
            .saturating_add(step)
    }

    /// Token cancelled on death or portal close.
    pub const fn defeated(&self) -> &CancellationToken {
        &self.defeated
    }

    /// First ready skill. Dead enemies have none.
    pub fn available_skill(&self) -> Option<&dyn Skill> {
        if !self.is_alive() {
            return None;
        }
        available_skill(&self.skills)
    }

    /// Read model.
    pub fn view(&self) -> EnemyView {
        EnemyView {
            id: self.id,
            level: self.level,
            health: self.health(),
            max_health: self.max_health,
            position: self.position(),
        }
    }
}

impl DamageSink for Enemy {
    fn receive_damage(&self, skill: &dyn Skill, amount: i64) -> i64 {
        let previous = self
            .health
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |health| {
                Some(health.saturating_sub(amount))
            })
            .unwrap_or_else(|health| health);
        let health = previous.saturating_sub(amount);

        if previous > 0 && health <= 0 {
            self.defeated.cancel();
            info!(enemy_id = %self.id, level = self.level, skill = skill.name(), "Enemy defeated");
        }
        health
    }

    fn health(&self) -> i64 {
        self.health.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::combat::{CombatStats, HitSkill};

    fn hit(damage: i64) -> HitSkill {
        let stats = CombatStats {
            level: 1,
            base_damage: damage,
            damage_per_level: 0,
        };
        HitSkill::new(Arc::new(stats), Duration::ZERO)
    }

    fn enemy(health: i64) -> Enemy {
        Enemy::new(1, health, 0, Vec::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn cumulative_damage_defeats() {
        let enemy = enemy(25);
        let skill = hit(10);

        assert_eq!(skill.use_on(&enemy), 15);
        assert_eq!(skill.use_on(&enemy), 5);
        assert!(!enemy.defeated().is_cancelled());

        assert_eq!(skill.use_on(&enemy), -5);
        assert!(enemy.defeated().is_cancelled());
        assert!(!enemy.is_alive());
        assert!(enemy.available_skill().is_none());

        // Overkill keeps subtracting.
        assert_eq!(skill.use_on(&enemy), -15);
    }

    #[tokio::test]
    async fn portal_close_reaches_enemy() {
        let portal = CancellationToken::new();
        let enemy = Enemy::new(1, 10, 0, Vec::new(), portal.child_token());
        portal.cancel();
        assert!(enemy.defeated().is_cancelled());
        assert!(enemy.is_alive());
    }

    #[test]
    fn steps_towards_target() {
        let enemy = enemy(10);
        assert_eq!(enemy.step_toward(3), 1);
        assert_eq!(enemy.step_toward(-2), 0);
        assert_eq!(enemy.step_toward(0), 0);
        assert_eq!(enemy.view().position, 0);
    }
}
