//! Agent loops.
//!
//! Every live explorer and every live enemy runs a movement loop and an
//! attack loop. Each loop wakes on its own interval and, at every wait,
//! also selects on the agent's cancellation token, so a portal close or a
//! death is never missed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::combat::DamageSink;
use crate::enemy::Enemy;
use crate::explorer::Explorer;
use crate::portal::Portal;

/// Join handles of an agent's two loops.
#[derive(Debug)]
pub struct AgentTasks {
    /// Movement loop.
    pub movement: JoinHandle<()>,
    /// Attack loop.
    pub attack: JoinHandle<()>,
}

impl AgentTasks {
    /// Wait for both loops to end.
    pub async fn join(self) {
        let _ = tokio::join!(self.movement, self.attack);
    }
}

/// Start the loops of a freshly entered explorer.
///
/// The movement loop reconciles the session when it stops.
pub fn spawn_explorer(explorer: Arc<Explorer>) -> AgentTasks {
    AgentTasks {
        movement: tokio::spawn(explorer_movement(Arc::clone(&explorer))),
        attack: tokio::spawn(explorer_attack(explorer)),
    }
}

/// Start the loops of an enemy registered with `portal`.
pub fn spawn_enemy(portal: Arc<Portal>, enemy: Arc<Enemy>) -> AgentTasks {
    AgentTasks {
        movement: tokio::spawn(enemy_movement(Arc::clone(&portal), Arc::clone(&enemy))),
        attack: tokio::spawn(enemy_attack(portal, enemy)),
    }
}

/// First tick one period from now.
fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn explorer_movement(explorer: Arc<Explorer>) {
    let mut ticker = ticker(explorer.portal().combat().move_interval());
    loop {
        tokio::select! {
            biased;
            () = explorer.session().cancelled() => break,
            _ = ticker.tick() => explorer.step().await,
        }
    }
    explorer.finish().await;
}

async fn explorer_attack(explorer: Arc<Explorer>) {
    let portal = Arc::clone(explorer.portal());
    let engagement = portal.combat().engagement_distance;
    let mut ticker = ticker(portal.combat().attack_interval());
    loop {
        tokio::select! {
            biased;
            () = explorer.session().cancelled() => break,
            _ = ticker.tick() => {
                let Some((enemy, distance)) = portal.closest_enemy(explorer.position()).await else {
                    continue;
                };
                if distance >= engagement {
                    continue;
                }
                let character = explorer.character();
                if let Some(skill) = character.available_skill() {
                    let health = skill.use_on(enemy.as_ref());
                    debug!(
                        character_id = %character.id(),
                        enemy_id = %enemy.id(),
                        skill = skill.name(),
                        enemy_health = health,
                        "Character attacked"
                    );
                }
            }
        }
    }
}

async fn enemy_movement(portal: Arc<Portal>, enemy: Arc<Enemy>) {
    let engagement = portal.combat().engagement_distance;
    let mut ticker = ticker(portal.combat().move_interval());
    loop {
        tokio::select! {
            biased;
            () = enemy.defeated().cancelled() => break,
            _ = ticker.tick() => {
                let Some((explorer, distance)) = portal.closest_explorer(enemy.position()).await else {
                    continue;
                };
                if distance >= engagement {
                    let position = enemy.step_toward(explorer.position());
                    debug!(enemy_id = %enemy.id(), position, "Enemy moved");
                }
            }
        }
    }
}

async fn enemy_attack(portal: Arc<Portal>, enemy: Arc<Enemy>) {
    let engagement = portal.combat().engagement_distance;
    let mut ticker = ticker(portal.combat().attack_interval());
    loop {
        tokio::select! {
            biased;
            () = enemy.defeated().cancelled() => break,
            _ = ticker.tick() => {
                let Some((explorer, distance)) = portal.closest_explorer(enemy.position()).await else {
                    continue;
                };
                if distance >= engagement {
                    continue;
                }
                if let Some(skill) = enemy.available_skill() {
                    let health = skill.use_on(explorer.as_ref());
                    debug!(
                        enemy_id = %enemy.id(),
                        character_id = %explorer.character().id(),
                        skill = skill.name(),
                        character_health = health,
                        "Enemy attacked"
                    );
                }
            }
        }
    }
    debug!(enemy_id = %enemy.id(), health = enemy.health(), "Enemy loops stopped");
}
