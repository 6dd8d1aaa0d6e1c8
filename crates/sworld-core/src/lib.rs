//! Portal exploration engine for the Sworld idle RPG.
//!
//! A user consumes a stone to open a [`Portal`] into a [`Zone`]. Their
//! character enters as an [`Explorer`] and walks a one-dimensional lane;
//! reaching new ground rolls events from the portal's drop tables (items,
//! gold, enemies). Explorers and [`Enemy`] agents each run movement and
//! attack loops until death, a return to town, or the portal closing.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration ([`SimulationConfig`])
//! - [`combat`] -- Skills and damage capabilities
//! - [`sampling`] -- Alias-method weighted sampling and level-filtered drop tables
//! - [`zone`] -- Zone catalogs and drop generators
//! - [`portal`] -- Portal lifecycle, agent lists and event rolls
//! - [`character`] -- Player characters
//! - [`enemy`] -- Enemies spawned inside portals
//! - [`explorer`] -- Exploration sessions
//! - [`user`] -- User accounts, stash and roster
//! - [`event`] -- Rolled portal events
//! - [`simulation`] -- Agent loops
//! - [`error`] -- [`WorldError`]

pub mod character;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod error;
pub mod event;
pub mod explorer;
pub mod portal;
pub mod sampling;
pub mod simulation;
pub mod user;
pub mod zone;

pub use character::Character;
pub use combat::{CombatStats, DamageSink, DamageSource, HitSkill, Skill};
pub use config::{ConfigError, SimulationConfig};
pub use enemy::Enemy;
pub use error::WorldError;
pub use event::PortalEvent;
pub use explorer::Explorer;
pub use portal::{CloseCallback, Portal};
pub use sampling::{AliasTable, DropTable, SamplingError};
pub use simulation::{AgentTasks, spawn_enemy, spawn_explorer};
pub use user::User;
pub use zone::{DropEntry, EventDrop, ItemDrop, Zone};
