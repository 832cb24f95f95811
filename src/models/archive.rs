//! Archive model
//!
//! One immutable backup snapshot as reported by `borg list --json`, plus the
//! fields this tool attaches: the `REPO::NAME` specifier and, when mounting,
//! the directory the archive is exposed at.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::pattern::archive_spec;

/// Subdirectory of a mount base holding one directory per archive
pub const ARCHIVES_DIR: &str = "archives";

/// Name prefix of merged overlay directories under a mount base
pub const MERGED_PREFIX: &str = "merged-";

/// A backup archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Archive name, unique within its repository
    pub name: String,

    /// Archive id
    pub id: String,

    /// Creation time, ISO-8601
    pub start: String,

    /// Fully-qualified `REPO::NAME` specifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec: String,

    /// Where this archive is mounted, if a mount base was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<PathBuf>,
}

impl Archive {
    /// Create an archive record without derived fields
    pub fn new(name: impl Into<String>, id: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            start: start.into(),
            spec: String::new(),
            mount_point: None,
        }
    }

    /// Attach the specifier and, with a mount base, the mount point
    pub fn decorate(&mut self, repository: &str, mount_base: Option<&Path>) {
        self.spec = archive_spec(repository, &self.name);
        self.mount_point = mount_base.map(|base| archive_mount_point(base, &self.name));
    }

    /// Short form of the id for display
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(12)
            .map_or(self.id.len(), |(i, _)| i);
        &self.id[..end]
    }
}

/// `mount_base/archives/<name>`
pub fn archive_mount_point(mount_base: &Path, name: &str) -> PathBuf {
    mount_base.join(ARCHIVES_DIR).join(name)
}

/// Sort ascending by creation time
///
/// ISO-8601 strings order lexicographically. The sort is stable, so archives
/// sharing a start time keep their listing order.
pub fn sort_by_start(archives: &mut [Archive]) {
    archives.sort_by(|a, b| a.start.cmp(&b.start));
}
