//! The service facade.
//!
//! Every operation validates its whole request before mutating anything,
//! then delegates to the core. Portals, characters and users live in
//! [`Registry`] instances; a portal removes itself from the registry when
//! it closes, through the callback handed to it at open time.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sworld_core::config::SimulationConfig;
use sworld_core::{
    Character, CloseCallback, Explorer, Portal, User, Zone, spawn_explorer,
};
use sworld_items::Inventory;
use sworld_types::{
    BagView, CharacterId, ItemLocation, PortalId, PortalStone, PortalView, UserId, ZoneId,
    ZoneView,
};
use tracing::info;

use crate::auth::Credentials;
use crate::character::CharacterFactory;
use crate::error::ServiceError;
use crate::registry::{Registry, Tombstones};

/// How many recently closed portals are remembered, so that late requests
/// for them report a closed portal instead of an unknown one.
const CLOSED_PORTAL_MEMORY: usize = 1024;

/// Entry point for every game operation.
#[derive(Debug)]
pub struct Service {
    config: SimulationConfig,
    zones: Vec<Arc<Zone>>,
    default_zone: Arc<Zone>,
    factory: CharacterFactory,
    users: Registry<UserId, User>,
    usernames: DashMap<String, UserId>,
    characters: Registry<CharacterId, Character>,
    portals: Registry<PortalId, Portal>,
    closed_portals: Tombstones<PortalId>,
}

impl Service {
    /// Build a service from validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ServiceError> {
        let zones: Vec<Arc<Zone>> = config
            .zones
            .iter()
            .map(|zone| Arc::new(Zone::from_config(zone)))
            .collect();
        let default_zone = zones
            .iter()
            .find(|zone| zone.name() == config.world.default_zone)
            .cloned()
            .ok_or_else(|| ServiceError::ZoneNotFound(config.world.default_zone.clone()))?;
        let factory = CharacterFactory::new(
            config.character.clone(),
            config.combat.clone(),
            config.inventory.clone(),
        );

        info!(
            zones = zones.len(),
            default_zone = default_zone.name(),
            "Service ready"
        );

        Ok(Self {
            config,
            zones,
            default_zone,
            factory,
            users: Registry::new(),
            usernames: DashMap::new(),
            characters: Registry::new(),
            portals: Registry::new(),
            closed_portals: Tombstones::new(CLOSED_PORTAL_MEMORY),
        })
    }

    /// Configuration the service runs with.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Users and characters
    // -----------------------------------------------------------------------

    /// Log a user in, creating the account and a first character the first
    /// time a username is seen.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Arc<User>, ServiceError> {
        let username = credentials.validate()?;
        if let Some(id) = self.usernames.get(username).map(|entry| *entry.value()) {
            return self.find_user(id);
        }

        let inventory = Inventory::new(
            self.config.inventory.user_bags,
            self.config.inventory.bag_capacity,
        );
        let user = Arc::new(User::new(username, inventory));
        let character = Arc::new(self.factory.build(user.id()));
        user.add_character(Arc::clone(&character)).await;

        match self.usernames.entry(username.to_owned()) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                drop(entry);
                self.find_user(id)
            }
            Entry::Vacant(entry) => {
                self.users.insert(user.id(), Arc::clone(&user));
                self.characters.insert(character.id(), character);
                entry.insert(user.id());
                info!(user_id = %user.id(), username, "User created");
                Ok(user)
            }
        }
    }

    /// Look up a user by ID.
    pub fn find_user(&self, id: UserId) -> Result<Arc<User>, ServiceError> {
        self.users.get(&id).ok_or(ServiceError::UserNotFound(id))
    }

    /// Give the user a new character. Only allowed once every existing
    /// character is dead.
    pub async fn spawn_character(&self, user: &User) -> Result<Arc<Character>, ServiceError> {
        if user.living_character().await.is_some() {
            return Err(ServiceError::LivingCharacterExists);
        }
        let character = Arc::new(self.factory.build(user.id()));
        user.add_character(Arc::clone(&character)).await;
        self.characters.insert(character.id(), Arc::clone(&character));
        info!(user_id = %user.id(), character_id = %character.id(), "Character spawned");
        Ok(character)
    }

    /// Every character of the user, dead ones included.
    pub async fn list_characters(&self, user: &User) -> Vec<Arc<Character>> {
        user.characters().await
    }

    /// Bags of a character.
    pub async fn view_character_inventory(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<BagView>, ServiceError> {
        let character = self
            .characters
            .get(&character_id)
            .ok_or(ServiceError::CharacterNotFound(character_id))?;
        Ok(character.inventory_view().await)
    }

    /// Bags of the user's stash.
    pub async fn view_user_inventory(&self, user: &User) -> Vec<BagView> {
        user.inventory_view().await
    }

    fn owned_character(
        &self,
        user: &User,
        character_id: CharacterId,
    ) -> Result<Arc<Character>, ServiceError> {
        let character = self
            .characters
            .get(&character_id)
            .ok_or(ServiceError::CharacterNotFound(character_id))?;
        if character.owner() != user.id() {
            return Err(ServiceError::NotCharacterOwner(character_id));
        }
        Ok(character)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Discard an item from one of the user's characters.
    pub async fn drop_character_item(
        &self,
        user: &User,
        character_id: CharacterId,
        bag_id: usize,
        slot: usize,
    ) -> Result<(), ServiceError> {
        self.owned_character(user, character_id)?;
        let item = user
            .drop_character_item(character_id, ItemLocation::new(bag_id, slot))
            .await?;
        info!(%character_id, bag_id, slot, item = item.kind(), "Item dropped");
        Ok(())
    }

    /// Move an item from one of the user's characters into the stash.
    pub async fn take_character_item(
        &self,
        user: &User,
        character_id: CharacterId,
        bag_id: usize,
        slot: usize,
    ) -> Result<ItemLocation, ServiceError> {
        self.owned_character(user, character_id)?;
        let location = user
            .take_character_item(character_id, ItemLocation::new(bag_id, slot))
            .await?;
        info!(%character_id, bag_id, slot, %location, "Item moved to stash");
        Ok(location)
    }

    /// Merge two stones of the user's stash. The result lands in `source`.
    pub async fn merge_stones(
        &self,
        user: &User,
        source: ItemLocation,
        target: ItemLocation,
    ) -> Result<ItemLocation, ServiceError> {
        Ok(user.merge_stones(source, target).await?)
    }

    // -----------------------------------------------------------------------
    // Zones and portals
    // -----------------------------------------------------------------------

    /// Every configured zone.
    pub fn list_zones(&self) -> Vec<ZoneView> {
        self.zones.iter().map(|zone| zone.view()).collect()
    }

    fn zone(&self, id: ZoneId) -> Result<Arc<Zone>, ServiceError> {
        self.zones
            .iter()
            .find(|zone| zone.id() == id)
            .cloned()
            .ok_or_else(|| ServiceError::ZoneNotFound(id.to_string()))
    }

    /// The stone used when a user opens a portal without one.
    pub fn default_stone(&self) -> PortalStone {
        PortalStone {
            level: self.config.world.default_stone_level,
            zone: self.default_zone.id(),
            duration: self.config.world.default_portal_duration(),
            drop_interval: self.config.world.default_drop_interval(),
        }
    }

    /// Open a portal with the default stone.
    pub fn open_default_portal(&self, user: &User) -> Result<Arc<Portal>, ServiceError> {
        self.open_portal(user, self.default_stone(), Arc::clone(&self.default_zone))
    }

    /// Consume the stone at `bag_id`/`slot` of the stash and open a portal
    /// with it.
    pub async fn open_portal_with_stone(
        &self,
        user: &User,
        bag_id: usize,
        slot: usize,
    ) -> Result<Arc<Portal>, ServiceError> {
        let location = ItemLocation::new(bag_id, slot);
        user.spend_stone(location, |stone| {
            let zone = self.zone(stone.zone)?;
            self.open_portal(user, stone, zone)
        })
        .await
    }

    fn open_portal(
        &self,
        user: &User,
        stone: PortalStone,
        zone: Arc<Zone>,
    ) -> Result<Arc<Portal>, ServiceError> {
        let portals = self.portals.clone();
        let closed = self.closed_portals.clone();
        let on_close: CloseCallback = Box::new(move |portal: &Portal| {
            closed.record(portal.id());
            portals.remove(&portal.id());
        });

        let portal = Portal::open(
            user.id(),
            stone,
            zone,
            self.config.combat.clone(),
            Some(on_close),
        )?;
        self.portals.insert(portal.id(), Arc::clone(&portal));
        if !portal.is_open() {
            self.portals.remove(&portal.id());
        }
        Ok(portal)
    }

    /// An open portal by ID.
    pub fn find_portal(&self, portal_id: PortalId) -> Result<Arc<Portal>, ServiceError> {
        self.portals.get(&portal_id).ok_or_else(|| {
            if self.closed_portals.contains(&portal_id) {
                ServiceError::PortalClosed(portal_id)
            } else {
                ServiceError::PortalNotFound(portal_id)
            }
        })
    }

    /// Send a character into a portal and start its loops.
    pub async fn explore_portal(
        &self,
        user: &Arc<User>,
        portal_id: PortalId,
        character_id: CharacterId,
    ) -> Result<Arc<Explorer>, ServiceError> {
        let portal = self.find_portal(portal_id)?;
        if !portal.is_open() {
            return Err(ServiceError::PortalClosed(portal_id));
        }
        if portal.owner() != user.id() {
            return Err(ServiceError::NotPortalOwner(portal_id));
        }
        let character = self.owned_character(user, character_id)?;
        if !character.is_alive() {
            return Err(ServiceError::CharacterDead(character_id));
        }
        if character.is_exploring() {
            return Err(ServiceError::CharacterBusy(character_id));
        }

        let explorer = Explorer::enter(Arc::clone(user), character, portal).await?;
        spawn_explorer(Arc::clone(&explorer));
        Ok(explorer)
    }

    /// Pull a character out of its portal and wait until it is back.
    pub async fn return_to_town(
        &self,
        user: &User,
        character_id: CharacterId,
    ) -> Result<(), ServiceError> {
        let character = self.owned_character(user, character_id)?;
        if !character.is_exploring() {
            return Err(ServiceError::CharacterIdle(character_id));
        }

        for portal in self.portals.filter(|portal| portal.owner() == user.id()) {
            if let Some(explorer) = portal.find_explorer(character_id).await {
                explorer.return_to_town();
                explorer.wait_returned().await;
                return Ok(());
            }
        }
        // The session ended between the check and the search.
        Ok(())
    }

    /// Close one of the user's portals now.
    pub fn close_portal(&self, user: &User, portal_id: PortalId) -> Result<(), ServiceError> {
        let portal = self.find_portal(portal_id)?;
        if portal.owner() != user.id() {
            return Err(ServiceError::NotPortalOwner(portal_id));
        }
        portal.close();
        Ok(())
    }

    /// Snapshot of any open portal.
    pub async fn view_portal(&self, portal_id: PortalId) -> Result<PortalView, ServiceError> {
        Ok(self.find_portal(portal_id)?.view().await)
    }

    /// Snapshots of the user's open portals, oldest first.
    pub async fn list_portals(&self, user: &User) -> Vec<PortalView> {
        let mut views = Vec::new();
        for portal in self.portals.filter(|portal| portal.owner() == user.id()) {
            views.push(portal.view().await);
        }
        views.sort_by_key(|view| view.opened_at);
        views
    }
}
