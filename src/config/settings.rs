//! User settings for borg-overlay
//!
//! Names the external binaries, the archive timestamp format and the default
//! log level. Every field has a default, so a missing or partial config.json
//! is fine.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::paths::OverlayPaths;
use crate::error::OverlayError;

/// User settings for borg-overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup tool binary
    #[serde(default = "default_borg_command")]
    pub borg_command: String,

    /// Overlay filesystem binary
    #[serde(default = "default_overlay_command")]
    pub overlay_command: String,

    /// Mount-table query binary (exit 0 iff the path is a mount point)
    #[serde(default = "default_mountpoint_command")]
    pub mountpoint_command: String,

    /// Unmount program followed by its fixed arguments
    #[serde(default = "default_unmount_command")]
    pub unmount_command: Vec<String>,

    /// strftime format substituted for the wildcard when creating archives
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Options passed to every `borg create` before the passthrough arguments
    #[serde(default)]
    pub create_options: Vec<String>,

    /// Log filter used when neither RUST_LOG nor --log-level is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_borg_command() -> String {
    "borg".to_string()
}

fn default_overlay_command() -> String {
    "fuse-overlayfs".to_string()
}

fn default_mountpoint_command() -> String {
    "mountpoint".to_string()
}

fn default_unmount_command() -> Vec<String> {
    vec!["fusermount".to_string(), "-u".to_string()]
}

fn default_timestamp_format() -> String {
    "%Y%m%d%H%M%S".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            borg_command: default_borg_command(),
            overlay_command: default_overlay_command(),
            mountpoint_command: default_mountpoint_command(),
            unmount_command: default_unmount_command(),
            timestamp_format: default_timestamp_format(),
            create_options: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &OverlayPaths) -> Result<Self, OverlayError> {
        let settings_path = paths.settings_file();

        let settings = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                OverlayError::Io(format!("Failed to read settings file: {}", e))
            })?;

            serde_json::from_str(&contents).map_err(|e| {
                OverlayError::Config(format!("Failed to parse settings file: {}", e))
            })?
        } else {
            // Don't save yet - let caller decide when to persist
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &OverlayPaths) -> Result<(), OverlayError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            OverlayError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            OverlayError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Check that the settings are usable
    ///
    /// The timestamp format must render fixed-width ASCII digits, otherwise
    /// newly created archive names would not sort after older ones.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.borg_command.trim().is_empty() {
            return Err(OverlayError::Config("borg_command cannot be empty".into()));
        }
        if self.unmount_command.is_empty() {
            return Err(OverlayError::Config(
                "unmount_command needs at least a program name".into(),
            ));
        }

        self.timestamp_width().map(|_| ())
    }

    /// Number of characters the timestamp format renders to
    pub fn timestamp_width(&self) -> Result<usize, OverlayError> {
        timestamp_width(&self.timestamp_format)
    }
}

/// Width of a digits-only, fixed-width timestamp format
pub fn timestamp_width(format: &str) -> Result<usize, OverlayError> {
    let early = render(format, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0));
    let late = render(format, Utc.with_ymd_and_hms(2099, 12, 31, 23, 59, 59));

    let (early, late) = match (early, late) {
        (Some(e), Some(l)) => (e, l),
        _ => {
            return Err(OverlayError::Config(format!(
                "Invalid timestamp format '{}'",
                format
            )))
        }
    };

    let digits_only = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits_only(&early) || !digits_only(&late) || early.len() != late.len() {
        return Err(OverlayError::Config(format!(
            "Timestamp format '{}' must render fixed-width digits only",
            format
        )));
    }

    Ok(early.len())
}

fn render(format: &str, at: chrono::LocalResult<DateTime<Utc>>) -> Option<String> {
    use std::fmt::Write;

    let at = at.single()?;
    let mut out = String::new();
    // chrono reports unknown specifiers as a fmt::Error instead of panicking
    write!(out, "{}", at.format(format)).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.borg_command, "borg");
        assert_eq!(settings.overlay_command, "fuse-overlayfs");
        assert_eq!(settings.unmount_command, vec!["fusermount", "-u"]);
        assert_eq!(settings.timestamp_width().unwrap(), 14);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OverlayPaths::with_config_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.borg_command = "/usr/local/bin/borg".into();
        settings.create_options = vec!["--compression".into(), "zstd".into()];

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.borg_command, "/usr/local/bin/borg");
        assert_eq!(loaded.create_options, vec!["--compression", "zstd"]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OverlayPaths::with_config_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"overlay_command": "my-overlay"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.overlay_command, "my-overlay");
        assert_eq!(loaded.mountpoint_command, "mountpoint");
    }

    #[test]
    fn test_timestamp_width() {
        assert_eq!(timestamp_width("%Y%m%d").unwrap(), 8);
        assert!(timestamp_width("%Y-%m-%d").is_err());
        assert!(timestamp_width("%s").is_err());
        assert!(timestamp_width("").is_err());
    }

    #[test]
    fn test_invalid_format_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OverlayPaths::with_config_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"timestamp_format": "%Y-%m"}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));
    }
}
