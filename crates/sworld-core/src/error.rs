//! Error types for the simulation engine.

use sworld_items::{InventoryError, MergeError};
use sworld_types::{CharacterId, PortalId};

use crate::sampling::SamplingError;

/// Errors raised by world operations (portals, characters, users).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The user owns no character with this ID.
    #[error("character not found: {0}")]
    CharacterNotFound(CharacterId),

    /// The character has no health left.
    #[error("character {0} is dead")]
    CharacterDead(CharacterId),

    /// The character is already inside a portal.
    #[error("character {0} is already exploring")]
    CharacterBusy(CharacterId),

    /// The portal has already closed.
    #[error("portal {0} is closed")]
    PortalClosed(PortalId),

    /// A bag or slot operation failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Two stones could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A drop table could not be compiled.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}
