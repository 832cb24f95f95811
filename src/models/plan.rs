//! Mount plan
//!
//! Computes where each archive is mounted, where the merged view goes, and
//! the overlay lowerdir option. The overlay tool gives the first-listed
//! lowerdir the highest precedence, so layers are listed newest first.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::archive::{archive_mount_point, Archive, MERGED_PREFIX};
use super::pattern::{archive_spec, ArchivePattern};
use crate::error::{OverlayError, OverlayResult};

/// Separator between layers in the lowerdir option
pub const LAYER_SEPARATOR: &str = ":";

/// One archive to be mounted as an overlay layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountLayer {
    pub name: String,
    pub spec: String,
    pub mount_point: PathBuf,
}

/// Everything needed to mount a set of archives as one merged view
#[derive(Debug, Clone, Serialize)]
pub struct MountPlan {
    /// Layers in ascending creation order (the order they get mounted)
    pub layers: Vec<MountLayer>,
    /// Target directory of the overlay mount
    pub merged_dir: PathBuf,
    /// Layer mount points joined newest first
    pub lowerdir: String,
}

impl MountPlan {
    /// Build a plan from archives sorted ascending by creation time
    ///
    /// # Errors
    ///
    /// Returns a validation error if a mount point is not UTF-8 or contains
    /// `:` or `,`, which the lowerdir option cannot express.
    pub fn new(
        mount_base: &Path,
        repository: &str,
        pattern: Option<&ArchivePattern>,
        archives: &[Archive],
    ) -> OverlayResult<Self> {
        let layers = archives
            .iter()
            .map(|archive| MountLayer {
                name: archive.name.clone(),
                spec: archive_spec(repository, &archive.name),
                mount_point: archive_mount_point(mount_base, &archive.name),
            })
            .collect::<Vec<_>>();

        let mut lowerdirs = Vec::with_capacity(layers.len());
        for layer in layers.iter().rev() {
            lowerdirs.push(layer_path(&layer.mount_point)?);
        }

        let merged_dir = mount_base.join(merged_dir_name(
            repository,
            pattern.map(|p| p.as_str()).unwrap_or(""),
        ));

        Ok(Self {
            layers,
            merged_dir,
            lowerdir: lowerdirs.join(LAYER_SEPARATOR),
        })
    }

    /// True when no archive matched
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The `-o` argument for the overlay tool
    pub fn overlay_option(&self) -> String {
        format!("lowerdir={}", self.lowerdir)
    }
}

/// `merged-<repo basename>-<sanitized pattern>`
pub fn merged_dir_name(repository: &str, pattern: &str) -> String {
    format!(
        "{}{}-{}",
        MERGED_PREFIX,
        repository_basename(repository),
        super::pattern::sanitize(pattern)
    )
}

/// Last path component of a repository, ignoring one trailing `/`
pub fn repository_basename(repository: &str) -> &str {
    let trimmed = repository.strip_suffix('/').unwrap_or(repository);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn layer_path(path: &Path) -> OverlayResult<String> {
    let s = path.to_str().ok_or_else(|| {
        OverlayError::Validation(format!("Mount point is not valid UTF-8: {}", path.display()))
    })?;

    if s.contains(LAYER_SEPARATOR) || s.contains(',') {
        return Err(OverlayError::Validation(format!(
            "Mount point '{}' contains ':' or ',' and cannot be used as an overlay layer",
            s
        )));
    }

    Ok(s.to_string())
}
