//! Username-based authentication.
//!
//! Token issuance lives in the transport layer; the service only sees
//! validated credentials and creates accounts on first sight.

use crate::error::ServiceError;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 32;

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
}

impl Credentials {
    /// Credentials for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// The trimmed username, if acceptable.
    pub fn validate(&self) -> Result<&str, ServiceError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ServiceError::InvalidCredentials {
                reason: "username is empty",
            });
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ServiceError::InvalidCredentials {
                reason: "username is too long",
            });
        }
        Ok(username)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed() {
        assert_eq!(Credentials::new("  alice ").validate().unwrap(), "alice");
    }

    #[test]
    fn empty_and_long_names_are_rejected() {
        assert!(Credentials::new("").validate().is_err());
        assert!(Credentials::new("   ").validate().is_err());
        assert!(Credentials::new("a".repeat(33)).validate().is_err());
        assert!(Credentials::new("a".repeat(32)).validate().is_ok());
    }
}
