//! Path management for borg-overlay
//!
//! Resolves where the settings file lives.
//!
//! ## Path Resolution Order
//!
//! 1. `BORG_OVERLAY_CONFIG_DIR` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/borg-overlay`
//! 3. `~/.config/borg-overlay`

use std::path::PathBuf;

use crate::error::OverlayError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BORG_OVERLAY_CONFIG_DIR";

/// Manages all paths used by borg-overlay
#[derive(Debug, Clone)]
pub struct OverlayPaths {
    /// Directory holding config.json
    config_dir: PathBuf,
}

impl OverlayPaths {
    /// Create a new OverlayPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and neither
    /// override variable is set.
    pub fn new() -> Result<Self, OverlayError> {
        let config_dir = if let Ok(custom) = std::env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { config_dir })
    }

    /// Create OverlayPaths with a custom directory (useful for testing)
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory (~/.config/borg-overlay/ or equivalent)
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Ensure the config directory exists
    pub fn ensure_directories(&self) -> Result<(), OverlayError> {
        std::fs::create_dir_all(&self.config_dir).map_err(|e| {
            OverlayError::Io(format!("Failed to create config directory: {}", e))
        })?;
        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, OverlayError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("borg-overlay"));
        }
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("borg-overlay"))
        .ok_or_else(|| OverlayError::Config("Could not determine home directory".into()))
}
