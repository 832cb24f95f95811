//! borg-overlay - timestamped borg archives and stacked overlay mounts
//!
//! This library wraps two external tools: borg, which stores deduplicated
//! archives, and fuse-overlayfs, which stacks directories into one view. It
//! adds archive naming (a pattern plus a UTC timestamp), listings grouped by
//! naming scheme, and mounting every archive that matches a pattern as one
//! overlay where newer archives shadow older ones.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Archives, patterns and mount plans
//! - `tools`: The `CommandRunner` seam and the borg/overlay/mount-table clients
//! - `services`: Listing, grouping, creation, deletion and mount orchestration
//! - `cli`: Command handlers
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use borg_overlay::config::Settings;
//! use borg_overlay::models::RepoPattern;
//! use borg_overlay::services::MountService;
//! use borg_overlay::tools::SystemRunner;
//!
//! let settings = Settings::default();
//! let target = RepoPattern::parse("/data/repo::myhome*")?;
//! let plan = MountService::new(&SystemRunner, &settings).mount("/mnt/home".as_ref(), &target)?;
//! println!("{}", plan.merged_dir.display());
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod tools;

pub use error::{OverlayError, OverlayResult};
