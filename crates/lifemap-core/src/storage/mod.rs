mod config;

pub use config::{Config, FlowConfig, StrategyKind};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/lifemap[-dev]/` based on LIFEMAP_ENV.
///
/// Set LIFEMAP_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFEMAP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lifemap-dev")
    } else {
        base_dir.join("lifemap")
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DirUnavailable)?;
    Ok(dir)
}
