//! Service boundary of the Sworld simulation.
//!
//! [`Service`] is the only surface the transport layer talks to. It owns
//! the user, character and portal registries, validates every request and
//! wires agents into the core's loops.
//!
//! # Modules
//!
//! - [`service`] -- The [`Service`] facade
//! - [`auth`] -- [`Credentials`] validation
//! - [`character`] -- [`CharacterFactory`], which assembles characters and their skills
//! - [`registry`] -- Concurrent [`Registry`] maps and bounded [`Tombstones`]
//! - [`error`] -- [`ServiceError`] and its [`ErrorCategory`]

pub mod auth;
pub mod character;
pub mod error;
pub mod registry;
pub mod service;

pub use auth::Credentials;
pub use character::CharacterFactory;
pub use error::{ErrorCategory, ServiceError};
pub use registry::{Registry, Tombstones};
pub use service::Service;
