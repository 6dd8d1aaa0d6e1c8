//! Character assembly.
//!
//! Characters do not pick their own skills; the service builds the stats
//! and the starting skill set from configuration and hands both in.

use std::sync::Arc;

use sworld_core::combat::{CombatStats, DamageSource, HitSkill, Skill};
use sworld_core::config::{CharacterConfig, CombatConfig, InventoryConfig};
use sworld_core::Character;
use sworld_items::Inventory;
use sworld_types::UserId;

/// Builds fresh characters from configuration.
#[derive(Debug, Clone)]
pub struct CharacterFactory {
    character: CharacterConfig,
    combat: CombatConfig,
    inventory: InventoryConfig,
}

impl CharacterFactory {
    /// A factory for the given configuration sections.
    pub const fn new(
        character: CharacterConfig,
        combat: CombatConfig,
        inventory: InventoryConfig,
    ) -> Self {
        Self {
            character,
            combat,
            inventory,
        }
    }

    /// Starting skills sharing `stats` as their damage source.
    pub fn starting_skills(&self, stats: &Arc<CombatStats>) -> Vec<Box<dyn Skill>> {
        let source: Arc<dyn DamageSource> = Arc::<CombatStats>::clone(stats);
        vec![Box::new(HitSkill::new(source, self.combat.skill_cooldown()))]
    }

    /// A new character for `owner` with empty bags.
    pub fn build(&self, owner: UserId) -> Character {
        let stats = Arc::new(CombatStats::for_character(&self.character));
        let skills = self.starting_skills(&stats);
        Character::new(
            owner,
            self.character.max_health,
            stats,
            skills,
            Inventory::new(self.inventory.character_bags, self.inventory.bag_capacity),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use sworld_core::combat::DamageSink;

    use super::*;

    struct Dummy(AtomicI64);

    impl DamageSink for Dummy {
        fn receive_damage(&self, _skill: &dyn Skill, amount: i64) -> i64 {
            self.0.fetch_sub(amount, Ordering::AcqRel).saturating_sub(amount)
        }

        fn health(&self) -> i64 {
            self.0.load(Ordering::Acquire)
        }
    }

    #[test]
    fn starting_skill_hits_with_character_damage() {
        let factory = CharacterFactory::new(
            CharacterConfig::default(),
            CombatConfig::default(),
            InventoryConfig::default(),
        );
        let stats = Arc::new(CombatStats::for_character(&CharacterConfig::default()));
        let skills = factory.starting_skills(&stats);
        assert_eq!(skills.len(), 1);

        let target = Dummy(AtomicI64::new(100));
        let health = skills.first().unwrap().use_on(&target);
        assert_eq!(health, 90);
        assert!(!skills.first().unwrap().is_ready());
    }

    #[test]
    fn builds_from_config() {
        let factory = CharacterFactory::new(
            CharacterConfig::default(),
            CombatConfig::default(),
            InventoryConfig::default(),
        );
        let owner = UserId::new();
        let character = factory.build(owner);
        assert_eq!(character.owner(), owner);
        assert_eq!(character.level(), 1);
        assert_eq!(character.health(), 100);
        assert_eq!(character.damage(), 10);
        assert!(character.available_skill().is_some());
        assert!(!character.is_exploring());
    }
}
