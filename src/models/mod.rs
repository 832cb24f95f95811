//! Core data models for borg-overlay
//!
//! - `Archive`: one backup snapshot and its derived specifier/mount point
//! - `ArchivePattern` / `RepoPattern`: validated glob selections
//! - `MountPlan`: per-archive directories, merged directory and lowerdir order

pub mod archive;
pub mod pattern;
pub mod plan;

pub use archive::{archive_mount_point, sort_by_start, Archive, ARCHIVES_DIR, MERGED_PREFIX};
pub use pattern::{archive_spec, matches, ArchivePattern, RepoPattern, SEPARATOR};
pub use plan::{merged_dir_name, repository_basename, MountLayer, MountPlan};
