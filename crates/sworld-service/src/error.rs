//! Error types for the service boundary.
//!
//! World-level failures are flattened into one enum so the transport layer
//! can map every failure to a category without reaching into the core
//! crates.

use sworld_core::{SamplingError, WorldError};
use sworld_items::{InventoryError, MergeError};
use sworld_types::{CharacterId, PortalId, UserId};

/// Broad failure class, for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Something referenced by ID does not exist.
    NotFound,
    /// The caller may not act on the resource.
    Authorization,
    /// The resource is in the wrong state for the request.
    Conflict,
    /// A bag or slot operation failed.
    Inventory,
    /// Two stones could not be merged.
    Merge,
    /// The request itself is malformed.
    Invalid,
}

/// Errors returned by [`Service`](crate::Service) operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The credentials were rejected.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials {
        /// Why the credentials were rejected.
        reason: &'static str,
    },

    /// No user with this ID.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No character with this ID.
    #[error("character not found: {0}")]
    CharacterNotFound(CharacterId),

    /// No open portal with this ID.
    #[error("portal not found: {0}")]
    PortalNotFound(PortalId),

    /// No zone with this name or ID.
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    /// The caller did not open this portal.
    #[error("not the owner of portal {0}")]
    NotPortalOwner(PortalId),

    /// The caller does not own this character.
    #[error("not the owner of character {0}")]
    NotCharacterOwner(CharacterId),

    /// The portal has closed.
    #[error("portal {0} is closed")]
    PortalClosed(PortalId),

    /// The character is inside a portal.
    #[error("character {0} is busy exploring")]
    CharacterBusy(CharacterId),

    /// The character is not inside a portal.
    #[error("character {0} is not exploring")]
    CharacterIdle(CharacterId),

    /// The character is dead.
    #[error("character {0} is dead")]
    CharacterDead(CharacterId),

    /// A new character was requested while one is still alive.
    #[error("user already has a living character")]
    LivingCharacterExists,

    /// A bag or slot operation failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Two stones could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A zone's drop tables could not be compiled.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

impl ServiceError {
    /// Failure class of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UserNotFound(_)
            | Self::CharacterNotFound(_)
            | Self::PortalNotFound(_)
            | Self::ZoneNotFound(_) => ErrorCategory::NotFound,
            Self::InvalidCredentials { .. }
            | Self::NotPortalOwner(_)
            | Self::NotCharacterOwner(_) => ErrorCategory::Authorization,
            Self::PortalClosed(_)
            | Self::CharacterBusy(_)
            | Self::CharacterIdle(_)
            | Self::CharacterDead(_)
            | Self::LivingCharacterExists => ErrorCategory::Conflict,
            Self::Inventory(_) => ErrorCategory::Inventory,
            Self::Merge(_) => ErrorCategory::Merge,
            Self::Sampling(_) => ErrorCategory::Invalid,
        }
    }
}

impl From<WorldError> for ServiceError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::CharacterNotFound(id) => Self::CharacterNotFound(id),
            WorldError::CharacterDead(id) => Self::CharacterDead(id),
            WorldError::CharacterBusy(id) => Self::CharacterBusy(id),
            WorldError::PortalClosed(id) => Self::PortalClosed(id),
            WorldError::Inventory(err) => Self::Inventory(err),
            WorldError::Merge(err) => Self::Merge(err),
            WorldError::Sampling(err) => Self::Sampling(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_errors_keep_their_category() {
        let id = CharacterId::new();
        assert_eq!(
            ServiceError::from(WorldError::CharacterBusy(id)).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            ServiceError::from(WorldError::CharacterNotFound(id)).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ServiceError::from(WorldError::Inventory(InventoryError::InventoryFull)).category(),
            ErrorCategory::Inventory
        );
        assert_eq!(
            ServiceError::from(WorldError::Merge(MergeError::IncompatibleZones)).category(),
            ErrorCategory::Merge
        );
    }
}
