//! Skills and the damage capabilities they connect.
//!
//! A [`Skill`] reads its damage from a [`DamageSource`] and applies it to a
//! [`DamageSink`]. Cooldowns are tracked with atomics so that skills can be
//! used from the attack loop while views read them concurrently.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::CharacterConfig;

/// Anything that can compute outgoing damage.
pub trait DamageSource: Send + Sync {
    /// Damage dealt by one use of a skill bound to this source.
    fn damage(&self) -> i64;
}

/// Anything that can be hit.
pub trait DamageSink: Send + Sync {
    /// Subtract `amount` from health and return the new health.
    ///
    /// Health is not clamped: a killing blow may leave it negative. A sink
    /// whose health crosses to zero or below releases its own completion
    /// signal exactly once.
    fn receive_damage(&self, skill: &dyn Skill, amount: i64) -> i64;

    /// Current health.
    fn health(&self) -> i64;
}

/// A cooldown-gated action.
pub trait Skill: Send + Sync + fmt::Debug {
    /// Skill name, for logs.
    fn name(&self) -> &'static str;

    /// Time left before the skill can be used again. Zero when ready.
    fn wait_time(&self) -> Duration;

    /// Whether the skill is off cooldown.
    fn is_ready(&self) -> bool {
        self.wait_time().is_zero()
    }

    /// Hit `target` and restart the cooldown. Returns the target's new
    /// health. Callers pick ready skills through [`available_skill`].
    fn use_on(&self, target: &dyn DamageSink) -> i64;
}

/// Flat damage model: `base + per_level * level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatStats {
    /// Level of the owner.
    pub level: u32,
    /// Damage independent of level.
    pub base_damage: i64,
    /// Damage added per level.
    pub damage_per_level: i64,
}

impl CombatStats {
    /// Stats of a freshly spawned character.
    pub const fn for_character(config: &CharacterConfig) -> Self {
        Self {
            level: config.level,
            base_damage: config.base_damage,
            damage_per_level: config.damage_per_level,
        }
    }

    /// Stats of an enemy of `level`.
    pub const fn for_enemy(level: u32, damage_per_level: i64) -> Self {
        Self {
            level,
            base_damage: 0,
            damage_per_level,
        }
    }
}

impl DamageSource for CombatStats {
    fn damage(&self) -> i64 {
        self.damage_per_level
            .saturating_mul(i64::from(self.level))
            .saturating_add(self.base_damage)
    }
}

const NEVER_USED: u64 = u64::MAX;

/// The basic melee hit.
pub struct HitSkill {
    source: Arc<dyn DamageSource>,
    cooldown: Duration,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last use, `NEVER_USED` before the first.
    last_use_ms: AtomicU64,
}

impl HitSkill {
    /// A hit reading its damage from `source`.
    pub fn new(source: Arc<dyn DamageSource>, cooldown: Duration) -> Self {
        Self {
            source,
            cooldown,
            epoch: Instant::now(),
            last_use_ms: AtomicU64::new(NEVER_USED),
        }
    }

    /// Cooldown between two uses.
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl fmt::Debug for HitSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitSkill")
            .field("damage", &self.source.damage())
            .field("cooldown", &self.cooldown)
            .field("wait_time", &self.wait_time())
            .finish()
    }
}

impl Skill for HitSkill {
    fn name(&self) -> &'static str {
        "hit"
    }

    fn wait_time(&self) -> Duration {
        let last = self.last_use_ms.load(Ordering::Acquire);
        if last == NEVER_USED {
            return Duration::ZERO;
        }
        let used_at = self.epoch.elapsed().saturating_sub(Duration::from_millis(last));
        self.cooldown.saturating_sub(used_at)
    }

    fn use_on(&self, target: &dyn DamageSink) -> i64 {
        let damage = self.source.damage();
        let health = target.receive_damage(self, damage);
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(NEVER_USED - 1);
        self.last_use_ms.store(now_ms, Ordering::Release);
        health
    }
}

/// First ready skill in `skills`, if any.
pub fn available_skill(skills: &[Box<dyn Skill>]) -> Option<&dyn Skill> {
    let skill = skills.iter().find(|skill| skill.is_ready());
    if skill.is_none() {
        if let Some(next) = skills.iter().map(|skill| skill.wait_time()).min() {
            debug!(wait_ms = next.as_millis(), "No skill ready");
        }
    }
    skill.map(|skill| &**skill)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicI64;

    use super::*;

    #[derive(Default)]
    struct Dummy {
        health: AtomicI64,
    }

    impl DamageSink for Dummy {
        fn receive_damage(&self, _skill: &dyn Skill, amount: i64) -> i64 {
            self.health.fetch_sub(amount, Ordering::AcqRel) - amount
        }

        fn health(&self) -> i64 {
            self.health.load(Ordering::Acquire)
        }
    }

    fn hit(damage: i64, cooldown_ms: u64) -> HitSkill {
        let stats = CombatStats {
            level: 0,
            base_damage: damage,
            damage_per_level: 0,
        };
        HitSkill::new(Arc::new(stats), Duration::from_millis(cooldown_ms))
    }

    #[test]
    fn stats_damage_scales_with_level() {
        let config = CharacterConfig::default();
        assert_eq!(CombatStats::for_character(&config).damage(), 10);
        assert_eq!(CombatStats::for_enemy(3, 10).damage(), 30);
        assert_eq!(CombatStats::for_enemy(0, 10).damage(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unused_skill_is_ready() {
        let skill = hit(5, 500);
        assert_eq!(skill.wait_time(), Duration::ZERO);
        assert!(skill.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn use_applies_damage_and_starts_cooldown() {
        let skill = hit(7, 500);
        let target = Dummy {
            health: AtomicI64::new(20),
        };

        assert_eq!(skill.use_on(&target), 13);
        assert_eq!(target.health(), 13);
        assert_eq!(skill.wait_time(), Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(skill.wait_time(), Duration::from_millis(300));

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(skill.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn health_may_go_negative() {
        let skill = hit(15, 0);
        let target = Dummy {
            health: AtomicI64::new(10),
        };
        assert_eq!(skill.use_on(&target), -5);
        assert_eq!(skill.use_on(&target), -20);
    }

    #[tokio::test(start_paused = true)]
    async fn available_skill_skips_cooling_down() {
        let skills: Vec<Box<dyn Skill>> = vec![Box::new(hit(1, 1_000)), Box::new(hit(2, 100))];
        let target = Dummy::default();

        let first = available_skill(&skills).unwrap();
        first.use_on(&target);
        assert_eq!(target.health(), -1);

        let second = available_skill(&skills).unwrap();
        second.use_on(&target);
        assert_eq!(target.health(), -3);

        assert!(available_skill(&skills).is_none());
        tokio::time::advance(Duration::from_millis(100)).await;
        available_skill(&skills).unwrap().use_on(&target);
        assert_eq!(target.health(), -5);
    }
}
