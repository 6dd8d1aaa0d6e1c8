//! Events rolled by a portal when an explorer reaches new ground.

use std::sync::Arc;

use sworld_types::Item;

use crate::enemy::Enemy;

/// Outcome of one event draw.
#[derive(Debug)]
pub enum PortalEvent {
    /// An item for the explorer's bags.
    Item(Item),
    /// Gold for the explorer's purse.
    Gold(u64),
    /// A freshly rolled enemy, not yet registered with the portal.
    Enemy(Arc<Enemy>),
    /// Nothing happens.
    Nothing,
}

impl PortalEvent {
    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Item(_) => "item",
            Self::Gold(_) => "gold",
            Self::Enemy(_) => "enemy",
            Self::Nothing => "nothing",
        }
    }
}
