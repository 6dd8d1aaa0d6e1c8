//! Configuration loading and typed config structures for the simulation.
//!
//! The canonical configuration lives in `sworld-config.yaml` at the project
//! root. Every field has a default, so an empty document (or no file at all)
//! yields the stock game: 10 second level-1 portals into the "Forest" zone.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::zone::{DropEntry, EventDrop, ItemDrop};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Portal defaults.
    #[serde(default)]
    pub world: WorldConfig,

    /// Bag layout for users and characters.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Starting character stats.
    #[serde(default)]
    pub character: CharacterConfig,

    /// Loop timing and combat tuning.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Zone catalog.
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            inventory: InventoryConfig::default(),
            character: CharacterConfig::default(),
            combat: CombatConfig::default(),
            zones: default_zones(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.inventory.bag_capacity == 0 {
            return invalid("inventory.bag_capacity must be at least 1");
        }
        if self.inventory.user_bags == 0 || self.inventory.character_bags == 0 {
            return invalid("users and characters need at least one bag");
        }
        if self.character.max_health <= 0 {
            return invalid("character.max_health must be positive");
        }
        if self.combat.move_interval_ms == 0 || self.combat.attack_interval_ms == 0 {
            return invalid("combat intervals must be non-zero");
        }
        if self.combat.engagement_distance < 1 {
            return invalid("combat.engagement_distance must be at least 1");
        }
        if self.world.default_portal_duration_secs == 0 {
            return invalid("world.default_portal_duration_secs must be non-zero");
        }
        if self.zones.is_empty() {
            return invalid("at least one zone must be configured");
        }
        if !self
            .zones
            .iter()
            .any(|zone| zone.name == self.world.default_zone)
        {
            return Err(ConfigError::Invalid {
                reason: format!("default zone {:?} is not configured", self.world.default_zone),
            });
        }
        for zone in &self.zones {
            let weights = zone
                .item_drops
                .iter()
                .map(|drop| drop.weight)
                .chain(zone.event_drops.iter().map(|drop| drop.weight));
            for weight in weights {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ConfigError::Invalid {
                        reason: format!("zone {:?} has an invalid drop weight {weight}", zone.name),
                    });
                }
            }
            if zone.event_drops.is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!("zone {:?} has no event drops", zone.name),
                });
            }
        }
        Ok(())
    }
}

/// Portal defaults used when no stone is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Lifetime of a default portal, in seconds.
    #[serde(default = "default_portal_duration_secs")]
    pub default_portal_duration_secs: u64,

    /// Level of the stone behind a default portal.
    #[serde(default = "default_stone_level")]
    pub default_stone_level: u32,

    /// Drop interval of default stones, in milliseconds.
    #[serde(default = "default_drop_interval_ms")]
    pub default_drop_interval_ms: u64,

    /// Name of the zone default portals open into.
    #[serde(default = "default_zone_name")]
    pub default_zone: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            default_portal_duration_secs: default_portal_duration_secs(),
            default_stone_level: default_stone_level(),
            default_drop_interval_ms: default_drop_interval_ms(),
            default_zone: default_zone_name(),
        }
    }
}

impl WorldConfig {
    /// Lifetime of a default portal.
    pub const fn default_portal_duration(&self) -> Duration {
        Duration::from_secs(self.default_portal_duration_secs)
    }

    /// Drop interval of a default stone.
    pub const fn default_drop_interval(&self) -> Duration {
        Duration::from_millis(self.default_drop_interval_ms)
    }
}

/// Bag layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryConfig {
    /// Number of bags in a user's stash.
    #[serde(default = "default_user_bags")]
    pub user_bags: usize,

    /// Number of bags a character carries.
    #[serde(default = "default_character_bags")]
    pub character_bags: usize,

    /// Slots per bag.
    #[serde(default = "default_bag_capacity")]
    pub bag_capacity: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            user_bags: default_user_bags(),
            character_bags: default_character_bags(),
            bag_capacity: default_bag_capacity(),
        }
    }
}

/// Starting stats for freshly spawned characters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterConfig {
    /// Starting level.
    #[serde(default = "default_character_level")]
    pub level: u32,

    /// Starting (and maximum) health.
    #[serde(default = "default_max_health")]
    pub max_health: i64,

    /// Damage dealt regardless of level.
    #[serde(default = "default_base_damage")]
    pub base_damage: i64,

    /// Extra damage per character level.
    #[serde(default = "default_damage_per_level")]
    pub damage_per_level: i64,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            level: default_character_level(),
            max_health: default_max_health(),
            base_damage: default_base_damage(),
            damage_per_level: default_damage_per_level(),
        }
    }
}

/// Loop timing and combat tuning shared by every agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombatConfig {
    /// Period of every movement loop, in milliseconds.
    #[serde(default = "default_move_interval_ms")]
    pub move_interval_ms: u64,

    /// Period of every attack loop, in milliseconds.
    #[serde(default = "default_attack_interval_ms")]
    pub attack_interval_ms: u64,

    /// Cooldown of the basic hit skill, in milliseconds.
    #[serde(default = "default_skill_cooldown_ms")]
    pub skill_cooldown_ms: u64,

    /// Agents closer than this many lane units are engaged.
    #[serde(default = "default_engagement_distance")]
    pub engagement_distance: i64,

    /// Enemy damage per enemy level.
    #[serde(default = "default_enemy_damage_per_level")]
    pub enemy_damage_per_level: i64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            move_interval_ms: default_move_interval_ms(),
            attack_interval_ms: default_attack_interval_ms(),
            skill_cooldown_ms: default_skill_cooldown_ms(),
            engagement_distance: default_engagement_distance(),
            enemy_damage_per_level: default_enemy_damage_per_level(),
        }
    }
}

impl CombatConfig {
    /// Movement loop period.
    pub const fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }

    /// Attack loop period.
    pub const fn attack_interval(&self) -> Duration {
        Duration::from_millis(self.attack_interval_ms)
    }

    /// Hit skill cooldown.
    pub const fn skill_cooldown(&self) -> Duration {
        Duration::from_millis(self.skill_cooldown_ms)
    }
}

/// One zone of the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    /// Display name, also used to reference the zone from `world.default_zone`.
    pub name: String,

    /// Weighted item generators.
    #[serde(default)]
    pub item_drops: Vec<DropEntry<ItemDrop>>,

    /// Weighted event generators.
    #[serde(default)]
    pub event_drops: Vec<DropEntry<EventDrop>>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_portal_duration_secs() -> u64 {
    10
}

const fn default_stone_level() -> u32 {
    1
}

const fn default_drop_interval_ms() -> u64 {
    1000
}

fn default_zone_name() -> String {
    String::from("Forest")
}

const fn default_user_bags() -> usize {
    1
}

const fn default_character_bags() -> usize {
    2
}

const fn default_bag_capacity() -> usize {
    10
}

const fn default_character_level() -> u32 {
    1
}

const fn default_max_health() -> i64 {
    100
}

const fn default_base_damage() -> i64 {
    5
}

const fn default_damage_per_level() -> i64 {
    5
}

const fn default_move_interval_ms() -> u64 {
    1000
}

const fn default_attack_interval_ms() -> u64 {
    500
}

const fn default_skill_cooldown_ms() -> u64 {
    500
}

const fn default_engagement_distance() -> i64 {
    1
}

const fn default_enemy_damage_per_level() -> i64 {
    10
}

fn default_log_level() -> String {
    String::from("info")
}

/// The stock "Forest" zone.
fn default_zones() -> Vec<ZoneConfig> {
    let power_stone = ItemDrop::Stone {
        level: 10,
        duration_secs: 600,
    };
    vec![ZoneConfig {
        name: default_zone_name(),
        item_drops: vec![
            DropEntry::new(0, 10.0, ItemDrop::RandomStone),
            DropEntry::new(2, 2.0, power_stone.clone()),
            DropEntry::new(3, 6.0, power_stone),
            DropEntry::new(1, 10.0, ItemDrop::Weapon { damage: 10 }),
        ],
        event_drops: vec![
            DropEntry::new(0, 10.0, EventDrop::Item),
            DropEntry::new(0, 50.0, EventDrop::Nothing),
            DropEntry::new(0, 8.0, EventDrop::Gold { min: 1, max: 5 }),
            DropEntry::new(1, 15.0, EventDrop::Item),
            DropEntry::new(1, 30.0, EventDrop::Enemy),
            DropEntry::new(2, 40.0, EventDrop::Enemy),
        ],
    }]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.default_portal_duration(), Duration::from_secs(10));
        assert_eq!(config.world.default_stone_level, 1);
        assert_eq!(config.combat.attack_interval(), Duration::from_millis(500));
        assert_eq!(config.zones.len(), 1);
        assert_eq!(config.zones.first().unwrap().name, "Forest");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = SimulationConfig::parse(include_str!("../../../sworld-config.yaml")).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  default_portal_duration_secs: 5
  default_stone_level: 2
  default_drop_interval_ms: 750
  default_zone: "Caves"

inventory:
  user_bags: 3
  character_bags: 1
  bag_capacity: 4

character:
  level: 3
  max_health: 250
  base_damage: 7
  damage_per_level: 2

combat:
  move_interval_ms: 200
  attack_interval_ms: 100
  skill_cooldown_ms: 100
  engagement_distance: 2
  enemy_damage_per_level: 3

zones:
  - name: "Caves"
    item_drops:
      - { min_level: 0, weight: 5, kind: random_stone }
      - { min_level: 1, weight: 1.5, kind: weapon, damage: 12 }
      - { min_level: 4, weight: 2, kind: stone, level: 8, duration_secs: 120 }
    event_drops:
      - { min_level: 0, weight: 20, kind: nothing }
      - { min_level: 0, weight: 4, kind: gold, min: 2, max: 9 }
      - { min_level: 1, weight: 10, kind: enemy }
      - { min_level: 0, weight: 6, kind: item }

logging:
  level: "debug"
"#;

        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.default_portal_duration(), Duration::from_secs(5));
        assert_eq!(config.world.default_drop_interval(), Duration::from_millis(750));
        assert_eq!(config.inventory.user_bags, 3);
        assert_eq!(config.character.max_health, 250);
        assert_eq!(config.combat.engagement_distance, 2);
        assert_eq!(config.logging.level, "debug");

        let caves = config.zones.first().unwrap();
        assert_eq!(caves.item_drops.len(), 3);
        assert_eq!(
            caves.item_drops.get(1).unwrap().drop,
            ItemDrop::Weapon { damage: 12 }
        );
        assert_eq!(
            caves.event_drops.get(1).unwrap().drop,
            EventDrop::Gold { min: 2, max: 9 }
        );
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = SimulationConfig::parse("combat:\n  move_interval_ms: 250\n").unwrap();
        assert_eq!(config.combat.move_interval_ms, 250);
        assert_eq!(config.combat.attack_interval_ms, 500);
        assert_eq!(config.inventory, InventoryConfig::default());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = SimulationConfig::parse("inventory:\n  bag_capacity: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn engagement_distance_below_one_is_rejected() {
        for distance in [0, -3] {
            let yaml = format!("combat:\n  engagement_distance: {distance}\n");
            assert!(matches!(
                SimulationConfig::parse(&yaml),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn unknown_default_zone_is_rejected() {
        let result = SimulationConfig::parse("world:\n  default_zone: Swamp\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let yaml = r#"
zones:
  - name: Forest
    event_drops:
      - { min_level: 0, weight: -1, kind: nothing }
"#;
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = SimulationConfig::parse("world: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
