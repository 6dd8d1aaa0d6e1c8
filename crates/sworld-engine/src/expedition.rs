//! A headless expedition through the service boundary.
//!
//! Logs a user in, sends their character through a default portal until
//! the session ends, then moves the loot to the stash and merges whatever
//! stones can be merged.

use std::time::Duration;

use serde::Serialize;
use sworld_core::{Character, User};
use sworld_service::{Credentials, Service, ServiceError};
use sworld_types::{BagView, CharacterView, ItemLocation, PortalView, UserView};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// How often progress is logged while the character explores.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of one expedition.
#[derive(Debug, Serialize)]
pub struct ExpeditionReport {
    /// The user after the expedition.
    pub user: UserView,
    /// The character after the expedition.
    pub character: CharacterView,
    /// The portal as it was when the character came back.
    pub portal: PortalView,
    /// Items moved from the character to the stash.
    pub looted: usize,
    /// Stone merges performed in the stash.
    pub merges: usize,
    /// The stash after looting and merging.
    pub stash: Vec<BagView>,
}

/// Run one expedition for the user identified by `credentials`.
pub async fn run_expedition(
    service: &Service,
    credentials: &Credentials,
) -> Result<ExpeditionReport, EngineError> {
    let user = service.authenticate(credentials).await?;
    let character = match user.living_character().await {
        Some(character) => character,
        None => service.spawn_character(&user).await?,
    };

    let portal = service.open_default_portal(&user)?;
    let explorer = service
        .explore_portal(&user, portal.id(), character.id())
        .await?;
    info!(
        user = user.username(),
        character_id = %character.id(),
        portal_id = %portal.id(),
        "Expedition started"
    );

    let mut progress = tokio::time::interval(PROGRESS_INTERVAL);
    loop {
        tokio::select! {
            () = explorer.wait_returned() => break,
            _ = progress.tick() => {
                debug!(
                    position = explorer.position(),
                    health = character.health(),
                    gold = character.gold(),
                    time_left_secs = portal.time_left().as_secs(),
                    "Expedition progress"
                );
            }
        }
    }
    let portal_view = portal.view().await;

    let looted = sweep_loot(service, &user, &character).await?;
    let merges = merge_all(service, &user).await?;

    Ok(ExpeditionReport {
        user: user.view(),
        character: character.view(),
        portal: portal_view,
        looted,
        merges,
        stash: service.view_user_inventory(&user).await,
    })
}

/// Move every item the character carries into the stash until it fills up.
async fn sweep_loot(
    service: &Service,
    user: &User,
    character: &Character,
) -> Result<usize, EngineError> {
    let mut moved = 0_usize;
    for bag in service.view_character_inventory(character.id()).await? {
        for slot in bag.slots.iter().filter(|slot| slot.item.is_some()) {
            match service
                .take_character_item(user, character.id(), bag.id, slot.slot)
                .await
            {
                Ok(_) => moved = moved.saturating_add(1),
                Err(ServiceError::Inventory(err)) => {
                    warn!(%err, "Stash full, leaving the rest with the character");
                    return Ok(moved);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(moved)
}

/// Merge stash stones pairwise until no pair merges.
async fn merge_all(service: &Service, user: &User) -> Result<usize, EngineError> {
    let mut merges = 0_usize;
    'scan: loop {
        let stones = stone_locations(&service.view_user_inventory(user).await);
        for (index, source) in stones.iter().enumerate() {
            for target in stones.iter().skip(index.saturating_add(1)) {
                match service.merge_stones(user, *source, *target).await {
                    Ok(at) => {
                        merges = merges.saturating_add(1);
                        debug!(%at, "Merged stash stones");
                        continue 'scan;
                    }
                    Err(ServiceError::Merge(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        return Ok(merges);
    }
}

fn stone_locations(bags: &[BagView]) -> Vec<ItemLocation> {
    bags.iter()
        .flat_map(|bag| {
            bag.slots
                .iter()
                .filter(|slot| {
                    slot.item
                        .as_ref()
                        .is_some_and(|item| item.as_stone().is_some())
                })
                .map(|slot| ItemLocation::new(bag.id, slot.slot))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use sworld_core::config::SimulationConfig;
    use sworld_types::{Item, PortalStone};

    use super::*;

    fn service() -> Service {
        let mut config = SimulationConfig::default();
        config.world.default_portal_duration_secs = 10;
        Service::new(config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn expedition_returns_character_to_town() {
        let service = service();
        let report = run_expedition(&service, &Credentials::new("alice"))
            .await
            .unwrap();

        assert_eq!(report.user.username, "alice");
        assert!(!report.character.exploring);
        assert_eq!(report.character.gold, 0);
        assert_eq!(report.portal.level, 1);
        assert_eq!(service.find_user(report.user.id).unwrap().gold(), report.user.gold);
    }

    #[tokio::test]
    async fn merge_all_folds_equal_stones() {
        let service = service();
        let user = service.authenticate(&Credentials::new("bob")).await.unwrap();
        let character = user.living_character().await.unwrap();
        for _ in 0..4 {
            let stone = Item::PortalStone(PortalStone {
                duration: Duration::from_secs(30),
                ..service.default_stone()
            });
            character.pickup_item(stone).await.unwrap();
        }

        assert_eq!(sweep_loot(&service, &user, &character).await.unwrap(), 4);
        // 1+1 -> 2, 1+1 -> 2, 2+2 -> 3.
        assert_eq!(merge_all(&service, &user).await.unwrap(), 3);

        let stones = stone_locations(&service.view_user_inventory(&user).await);
        assert_eq!(stones.len(), 1);
        let last = user.get_item(stones[0]).await.unwrap();
        assert_eq!(last.as_stone().unwrap().level, 3);
    }
}
