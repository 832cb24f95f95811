//! Configuration module for borg-overlay
//!
//! This module provides configuration management including:
//! - XDG-style path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::OverlayPaths;
pub use settings::Settings;
