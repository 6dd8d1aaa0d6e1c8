//! User accounts: the stash, the bank and the roster of characters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sworld_items::{Inventory, InventoryError, merge};
use sworld_types::{BagView, CharacterId, Item, ItemLocation, PortalStone, UserId, UserView};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::character::Character;
use crate::error::WorldError;

/// A player account.
///
/// Lock order when both are needed: a character's inventory first, then
/// the user's.
#[derive(Debug)]
pub struct User {
    id: UserId,
    username: String,
    created_at: DateTime<Utc>,
    gold: AtomicU64,
    inventory: Mutex<Inventory>,
    characters: RwLock<Vec<Arc<Character>>>,
}

impl User {
    /// A new account with an empty stash and no characters.
    pub fn new(username: impl Into<String>, inventory: Inventory) -> Self {
        Self::with_id(UserId::new(), username, inventory)
    }

    /// Same as [`User::new`] with a preallocated identifier, so characters
    /// can be built for the user before it exists.
    pub fn with_id(id: UserId, username: impl Into<String>, inventory: Inventory) -> Self {
        Self {
            id,
            username: username.into(),
            created_at: Utc::now(),
            gold: AtomicU64::new(0),
            inventory: Mutex::new(inventory),
            characters: RwLock::new(Vec::new()),
        }
    }

    /// User identifier.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account creation time.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Banked gold.
    pub fn gold(&self) -> u64 {
        self.gold.load(Ordering::Acquire)
    }

    /// Bank gold brought back from an exploration.
    pub fn deposit_gold(&self, amount: u64) {
        let _ = self
            .gold
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |gold| {
                Some(gold.saturating_add(amount))
            });
    }

    // -----------------------------------------------------------------------
    // Characters
    // -----------------------------------------------------------------------

    /// Add a character to the roster.
    pub async fn add_character(&self, character: Arc<Character>) {
        info!(user = %self.username, character_id = %character.id(), "Character joined roster");
        self.characters.write().await.push(character);
    }

    /// All characters, dead ones included.
    pub async fn characters(&self) -> Vec<Arc<Character>> {
        self.characters.read().await.clone()
    }

    /// Look up one of this user's characters.
    pub async fn find_character(&self, id: CharacterId) -> Result<Arc<Character>, WorldError> {
        self.characters
            .read()
            .await
            .iter()
            .find(|character| character.id() == id)
            .cloned()
            .ok_or(WorldError::CharacterNotFound(id))
    }

    /// First character that is still alive.
    pub async fn living_character(&self) -> Option<Arc<Character>> {
        self.characters
            .read()
            .await
            .iter()
            .find(|character| character.is_alive())
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Stash
    // -----------------------------------------------------------------------

    /// Store `item` in the first free stash slot.
    pub async fn pickup_item(&self, item: Item) -> Result<ItemLocation, WorldError> {
        Ok(self.inventory.lock().await.pickup(item)?)
    }

    /// Copy of the item at `location`.
    pub async fn get_item(&self, location: ItemLocation) -> Result<Item, WorldError> {
        Ok(self.inventory.lock().await.get_item(location)?.clone())
    }

    /// Remove and return the item at `location`.
    pub async fn drop_item(&self, location: ItemLocation) -> Result<Item, WorldError> {
        Ok(self.inventory.lock().await.drop_item(location)?)
    }

    /// Spend the stone at `location` on `use_stone`.
    ///
    /// The stash stays locked from the lookup until the stone is removed,
    /// so the stone handed to `use_stone` is the one that leaves the slot.
    /// When `use_stone` fails the stone stays where it was.
    pub async fn spend_stone<T, E>(
        &self,
        location: ItemLocation,
        use_stone: impl FnOnce(PortalStone) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<WorldError>,
    {
        let mut inventory = self.inventory.lock().await;
        let stone = inventory
            .get_stone(location)
            .map_err(WorldError::from)?
            .clone();
        let spent = use_stone(stone)?;
        inventory.drop_item(location).map_err(WorldError::from)?;
        info!(user = %self.username, %location, "Stone spent");
        Ok(spent)
    }

    /// Merge the stones at `source` and `target`.
    ///
    /// The merged stone replaces the source and the target slot is left
    /// empty. Both inputs are validated before anything is removed.
    pub async fn merge_stones(
        &self,
        source: ItemLocation,
        target: ItemLocation,
    ) -> Result<ItemLocation, WorldError> {
        if source == target {
            return Err(InventoryError::SameSlot(source).into());
        }
        let mut inventory = self.inventory.lock().await;
        let merged = merge(inventory.get_stone(source)?, inventory.get_stone(target)?)?;

        inventory.drop_item(target)?;
        inventory.drop_item(source)?;
        inventory.store_item(Item::PortalStone(merged), source)?;
        info!(user = %self.username, %source, %target, "Stones merged");
        Ok(source)
    }

    /// Move an item from a character's bags into the first free stash slot.
    pub async fn take_character_item(
        &self,
        character_id: CharacterId,
        location: ItemLocation,
    ) -> Result<ItemLocation, WorldError> {
        let character = self.find_character(character_id).await?;
        if character.is_exploring() {
            return Err(WorldError::CharacterBusy(character_id));
        }

        let mut bags = character.inventory().lock().await;
        let mut stash = self.inventory.lock().await;
        let destination = stash.find_empty_slot(bags.get_item(location)?)?;
        let item = bags.drop_item(location)?;
        stash.store_item(item, destination)?;
        Ok(destination)
    }

    /// Discard an item from a character's bags.
    pub async fn drop_character_item(
        &self,
        character_id: CharacterId,
        location: ItemLocation,
    ) -> Result<Item, WorldError> {
        let character = self.find_character(character_id).await?;
        if character.is_exploring() {
            return Err(WorldError::CharacterBusy(character_id));
        }
        Ok(character.inventory().lock().await.drop_item(location)?)
    }

    /// Snapshot of the stash.
    pub async fn inventory_view(&self) -> Vec<BagView> {
        self.inventory.lock().await.view()
    }

    /// Read model.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            gold: self.gold(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use sworld_items::MergeError;
    use sworld_types::{Weapon, ZoneId};

    use super::*;
    use crate::combat::CombatStats;
    use crate::config::CharacterConfig;

    fn stone(zone: ZoneId, level: u32, secs: u64) -> Item {
        Item::PortalStone(PortalStone {
            level,
            zone,
            duration: Duration::from_secs(secs),
            drop_interval: Duration::from_secs(1),
        })
    }

    async fn user_with_character() -> (User, Arc<Character>) {
        let user = User::new("alice", Inventory::new(1, 4));
        let stats = Arc::new(CombatStats::for_character(&CharacterConfig::default()));
        let character = Arc::new(Character::new(
            user.id(),
            100,
            stats,
            Vec::new(),
            Inventory::new(2, 2),
        ));
        user.add_character(character.clone()).await;
        (user, character)
    }

    #[tokio::test]
    async fn merge_puts_result_in_source_slot() {
        let (user, _) = user_with_character().await;
        let zone = ZoneId::new();
        let a = user.pickup_item(stone(zone, 2, 30)).await.unwrap();
        let b = user.pickup_item(stone(zone, 2, 20)).await.unwrap();

        let at = user.merge_stones(b, a).await.unwrap();
        assert_eq!(at, b);
        let merged = user.get_item(b).await.unwrap();
        let merged = merged.as_stone().unwrap();
        assert_eq!(merged.level, 3);
        assert_eq!(merged.duration, Duration::from_secs(20));
        assert!(matches!(
            user.get_item(a).await,
            Err(WorldError::Inventory(InventoryError::EmptySlot { .. }))
        ));
    }

    #[tokio::test]
    async fn failed_merge_leaves_stash_untouched() {
        let (user, _) = user_with_character().await;
        let a = user.pickup_item(stone(ZoneId::new(), 1, 10)).await.unwrap();
        let b = user.pickup_item(stone(ZoneId::new(), 1, 10)).await.unwrap();
        let before = user.inventory_view().await;

        assert!(matches!(
            user.merge_stones(a, b).await,
            Err(WorldError::Merge(MergeError::IncompatibleZones))
        ));
        assert_eq!(user.inventory_view().await, before);
    }

    #[tokio::test]
    async fn merge_rejects_same_slot_and_weapons() {
        let (user, _) = user_with_character().await;
        let a = user.pickup_item(stone(ZoneId::new(), 1, 10)).await.unwrap();
        let w = user
            .pickup_item(Item::Weapon(Weapon { damage: 3 }))
            .await
            .unwrap();

        assert!(matches!(
            user.merge_stones(a, a).await,
            Err(WorldError::Inventory(InventoryError::SameSlot(_)))
        ));
        assert!(matches!(
            user.merge_stones(a, w).await,
            Err(WorldError::Inventory(InventoryError::WrongItem { .. }))
        ));
    }

    #[tokio::test]
    async fn spend_stone_only_takes_stones() {
        let (user, _) = user_with_character().await;
        let w = user
            .pickup_item(Item::Weapon(Weapon { damage: 3 }))
            .await
            .unwrap();
        let s = user.pickup_item(stone(ZoneId::new(), 4, 10)).await.unwrap();

        let wrong = user
            .spend_stone(w, |stone| Ok::<_, WorldError>(stone.level))
            .await;
        assert!(matches!(
            wrong,
            Err(WorldError::Inventory(InventoryError::WrongItem { .. }))
        ));
        assert!(user.get_item(w).await.is_ok());

        let level = user
            .spend_stone(s, |stone| Ok::<_, WorldError>(stone.level))
            .await
            .unwrap();
        assert_eq!(level, 4);
        assert!(user.get_item(s).await.is_err());
    }

    #[tokio::test]
    async fn spend_stone_keeps_stash_locked_and_restores_on_failure() {
        let (user, _) = user_with_character().await;
        let s = user.pickup_item(stone(ZoneId::new(), 2, 30)).await.unwrap();

        let failed = user
            .spend_stone(s, |_| {
                assert!(user.inventory.try_lock().is_err());
                Err::<(), _>(WorldError::PortalClosed(sworld_types::PortalId::new()))
            })
            .await;
        assert!(matches!(failed, Err(WorldError::PortalClosed(_))));
        assert_eq!(
            user.get_item(s).await.unwrap().as_stone().unwrap().level,
            2
        );
    }

    #[tokio::test]
    async fn take_character_item_moves_to_stash() {
        let (user, character) = user_with_character().await;
        let from = character
            .pickup_item(Item::Weapon(Weapon { damage: 9 }))
            .await
            .unwrap();

        let to = user.take_character_item(character.id(), from).await.unwrap();
        assert_eq!(to, ItemLocation::new(0, 0));
        assert_eq!(
            user.get_item(to).await.unwrap(),
            Item::Weapon(Weapon { damage: 9 })
        );
        assert!(character.inventory().lock().await.get_item(from).is_err());
    }

    #[tokio::test]
    async fn exploring_character_items_are_locked() {
        let (user, character) = user_with_character().await;
        let at = character
            .pickup_item(Item::Weapon(Weapon { damage: 9 }))
            .await
            .unwrap();
        character.begin_exploring().unwrap();

        assert!(matches!(
            user.take_character_item(character.id(), at).await,
            Err(WorldError::CharacterBusy(_))
        ));
        assert!(matches!(
            user.drop_character_item(character.id(), at).await,
            Err(WorldError::CharacterBusy(_))
        ));

        character.finish_exploring();
        assert_eq!(
            user.drop_character_item(character.id(), at).await.unwrap(),
            Item::Weapon(Weapon { damage: 9 })
        );
    }

    #[tokio::test]
    async fn unknown_character_is_not_found() {
        let (user, _) = user_with_character().await;
        assert!(matches!(
            user.find_character(CharacterId::new()).await,
            Err(WorldError::CharacterNotFound(_))
        ));
        assert!(user.living_character().await.is_some());
    }

    #[test]
    fn gold_is_banked() {
        let user = User::new("bob", Inventory::new(1, 1));
        user.deposit_gold(5);
        user.deposit_gold(2);
        assert_eq!(user.view().gold, 7);
    }
}
