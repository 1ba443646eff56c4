mod config;
pub mod database;

pub use config::{
    BridgeConfig, Config, DeviceConfig, HeadConfig, SessionConfig, VideoConfig,
    VideoDisplayMode, VideoStartMode, DEFAULT_ESP32_URL,
};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nexus[-dev]/` based on NEXUS_ENV.
///
/// Set NEXUS_ENV=dev to use the development data directory, or
/// NEXUS_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("NEXUS_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NEXUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nexus-dev")
            } else {
                base_dir.join("nexus")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
