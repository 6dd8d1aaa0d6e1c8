//! Simulation host binary for Sworld.
//!
//! Wires configuration, structured logging and the service together and
//! runs one headless expedition, logging the resulting report as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `SWORLD_CONFIG` (default `sworld-config.yaml`)
//! 2. Initialize structured logging (tracing), `RUST_LOG` overriding the
//!    configured level
//! 3. Build the service (zones, registries)
//! 4. Run an expedition for `SWORLD_USER` (default `alice`)
//! 5. Log the report

mod error;
mod expedition;

use std::path::PathBuf;

use sworld_core::config::SimulationConfig;
use sworld_service::{Credentials, Service};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config path used when `SWORLD_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "sworld-config.yaml";

/// Username used when `SWORLD_USER` is unset.
const DEFAULT_USER: &str = "alice";

/// Where the configuration came from.
enum ConfigSource {
    File(PathBuf),
    Defaults(PathBuf),
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the expedition fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so failures here are
    //    reported through the returned error only.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("sworld-engine starting");
    match &source {
        ConfigSource::File(path) => info!(
            path = %path.display(),
            default_zone = config.world.default_zone,
            portal_duration_secs = config.world.default_portal_duration_secs,
            zones = config.zones.len(),
            "Configuration loaded"
        ),
        ConfigSource::Defaults(path) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
        }
    }

    // 3. Build the service.
    let service = Service::new(config)?;

    // 4. Run the expedition.
    let username = std::env::var("SWORLD_USER").unwrap_or_else(|_| DEFAULT_USER.to_owned());
    let report = expedition::run_expedition(&service, &Credentials::new(username)).await?;

    // 5. Log the report.
    let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    info!(
        looted = report.looted,
        merges = report.merges,
        gold = report.user.gold,
        "Expedition finished"
    );
    info!("{json}");

    info!("sworld-engine shutdown complete");
    Ok(())
}

/// Load configuration from `SWORLD_CONFIG`, falling back to defaults when
/// the file does not exist.
fn load_config() -> Result<(SimulationConfig, ConfigSource), EngineError> {
    let path = std::env::var_os("SWORLD_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, ConfigSource::File(path)))
    } else {
        Ok((SimulationConfig::default(), ConfigSource::Defaults(path)))
    }
}
