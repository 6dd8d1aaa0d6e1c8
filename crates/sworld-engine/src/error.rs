//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure `main` can propagate with `?`.

use sworld_core::ConfigError;
use sworld_service::ServiceError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A service operation failed.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: ServiceError,
    },

    /// The expedition report could not be encoded.
    #[error("report encoding failed: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
