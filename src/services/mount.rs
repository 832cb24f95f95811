//! Mount orchestration
//!
//! Mounting exposes every matched archive under `<base>/archives/<name>` and
//! then stacks them with the overlay tool into `<base>/merged-...`, newest
//! archive on top. Unmounting walks the same layout, overlay first, and only
//! touches directories the mount table reports as active.

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{OverlayError, OverlayResult};
use crate::models::{MountPlan, RepoPattern, ARCHIVES_DIR, MERGED_PREFIX};
use crate::services::ArchiveService;
use crate::tools::{Borg, CommandRunner, MountTable, Overlay};

/// Lifecycle of one mount base during an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounting,
    Mounted,
    Unmounting,
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unmounted => "unmounted",
            Self::Mounting => "mounting",
            Self::Mounted => "mounted",
            Self::Unmounting => "unmounting",
        };
        f.write_str(s)
    }
}

/// What an unmount pass did
#[derive(Debug, Clone, Default)]
pub struct UnmountReport {
    /// Candidate directories checked against the mount table
    pub checked: usize,
    /// Active mount points the unmount tool released
    pub unmounted: Vec<PathBuf>,
    /// Active mount points the unmount tool failed on
    pub failed: Vec<PathBuf>,
}

/// Service for mounting archive stacks
pub struct MountService<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
    state: Cell<MountState>,
}

impl<'a> MountService<'a> {
    /// Create a new mount service
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            settings,
            state: Cell::new(MountState::Unmounted),
        }
    }

    /// Current lifecycle state
    ///
    /// A failed mount leaves the state at `Mounting`: layers mounted before
    /// the failure stay mounted until the next unmount.
    pub fn state(&self) -> MountState {
        self.state.get()
    }

    fn transition(&self, to: MountState) {
        let from = self.state.replace(to);
        tracing::debug!(%from, %to, "Mount state changed");
    }

    /// Mount all archives matching `target` as one overlay under `mount_base`
    ///
    /// Returns the executed plan. With no matching archive nothing is
    /// mounted and the returned plan is empty.
    pub fn mount(&self, mount_base: &Path, target: &RepoPattern) -> OverlayResult<MountPlan> {
        self.unmount(mount_base, true)?;

        let archives = ArchiveService::new(self.runner, self.settings).list(
            &target.repository,
            target.pattern.as_ref(),
            Some(mount_base),
        )?;
        let plan = MountPlan::new(
            mount_base,
            &target.repository,
            target.pattern.as_ref(),
            &archives,
        )?;

        if plan.is_empty() {
            tracing::warn!(
                repository = %target.repository,
                pattern = target.pattern_str(),
                "No archives match, nothing to mount"
            );
            return Ok(plan);
        }

        self.transition(MountState::Mounting);

        let borg = Borg::new(self.runner, self.settings);
        for layer in &plan.layers {
            create_dir(&layer.mount_point)?;
            borg.mount(&layer.spec, &layer.mount_point)?;
        }

        create_dir(&plan.merged_dir)?;
        Overlay::new(self.runner, self.settings).mount(&plan.lowerdir, &plan.merged_dir)?;

        self.transition(MountState::Mounted);
        tracing::info!(
            merged = %plan.merged_dir.display(),
            layers = plan.layers.len(),
            "Archives mounted"
        );
        Ok(plan)
    }

    /// Unmount every active mount under `mount_base`
    ///
    /// With `failsafe`, a missing mount base or `archives` directory counts
    /// as nothing to do instead of an error.
    pub fn unmount(&self, mount_base: &Path, failsafe: bool) -> OverlayResult<UnmountReport> {
        self.transition(MountState::Unmounting);

        let table = MountTable::new(self.runner, self.settings);
        let mut report = UnmountReport::default();

        for candidate in mount_candidates(mount_base, failsafe)? {
            report.checked += 1;
            if !table.is_mount_point(&candidate)? {
                tracing::debug!(path = %candidate.display(), "Not a mount point, skipping");
                continue;
            }

            if table.unmount(&candidate)? {
                report.unmounted.push(candidate);
            } else {
                report.failed.push(candidate);
            }
        }

        self.transition(MountState::Unmounted);
        Ok(report)
    }
}

/// Directories under `mount_base` that may hold one of our mounts
///
/// Merged overlays come first since they sit on top of the archive mounts.
/// Each part is sorted by name.
pub fn mount_candidates(mount_base: &Path, failsafe: bool) -> OverlayResult<Vec<PathBuf>> {
    let mut merged = match subdirectories(mount_base) {
        Ok(dirs) => dirs,
        Err(e) if failsafe && e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_dir_error(mount_base, e)),
    };
    merged.retain(|dir| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(MERGED_PREFIX))
    });
    merged.sort();

    let archives_dir = mount_base.join(ARCHIVES_DIR);
    let mut archives = match subdirectories(&archives_dir) {
        Ok(dirs) => dirs,
        Err(e) if failsafe && e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(read_dir_error(&archives_dir, e)),
    };
    archives.sort();

    merged.extend(archives);
    Ok(merged)
}

fn subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // file_type() does not follow symlinks
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn read_dir_error(dir: &Path, e: std::io::Error) -> OverlayError {
    OverlayError::Io(format!("Failed to read {}: {}", dir.display(), e))
}

fn create_dir(dir: &Path) -> OverlayResult<()> {
    fs::create_dir_all(dir)
        .map_err(|e| OverlayError::Io(format!("Failed to create {}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::runner::fake::{fail, ok, FakeRunner};
    use tempfile::TempDir;

    const LIST_JSON: &str = r#"{"archives": [
        {"name": "home20240101000000", "id": "1", "start": "2024-01-01T00:00:00"},
        {"name": "home20240601000000", "id": "2", "start": "2024-06-01T00:00:00"},
        {"name": "home20240301000000", "id": "3", "start": "2024-03-01T00:00:00"},
        {"name": "etc20240101000000", "id": "4", "start": "2024-01-01T00:00:00"}
    ]}"#;

    /// borg lists LIST_JSON; nothing is a mount point; everything else succeeds
    fn runner() -> FakeRunner {
        FakeRunner::new(|program, args| match (program, args[0].as_str()) {
            ("borg", "list") => ok(LIST_JSON),
            ("mountpoint", _) => fail(32, ""),
            _ => ok(""),
        })
    }

    #[test]
    fn test_mount_sequence() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("mnt");
        let runner = runner();
        let settings = Settings::default();
        let service = MountService::new(&runner, &settings);

        let target = RepoPattern::parse("/data/repo/::home*").unwrap();
        let plan = service.mount(&base, &target).unwrap();

        assert_eq!(service.state(), MountState::Mounted);
        assert_eq!(plan.merged_dir, base.join("merged-repo-home"));
        assert!(plan.merged_dir.is_dir());

        let a = |name: &str| base.join("archives").join(name).to_str().unwrap().to_string();
        let oldest = a("home20240101000000");
        assert!(Path::new(&oldest).is_dir());

        // failsafe pass found no base dir, so the first call is the listing
        let calls = runner.calls();
        assert_eq!(calls[0], vec!["borg", "list", "--json", "/data/repo/"]);
        assert_eq!(
            calls[1],
            vec!["borg", "mount", "/data/repo/::home20240101000000", oldest.as_str()]
        );
        assert_eq!(calls[2][2], "/data/repo/::home20240301000000");
        assert_eq!(calls[3][2], "/data/repo/::home20240601000000");
        assert_eq!(
            calls[4],
            vec![
                "fuse-overlayfs".to_string(),
                "-o".to_string(),
                format!(
                    "lowerdir={}:{}:{}",
                    a("home20240601000000"),
                    a("home20240301000000"),
                    a("home20240101000000")
                ),
                plan.merged_dir.to_str().unwrap().to_string(),
            ]
        );
        assert_eq!(calls.len(), 5);
    }

    #[test]
    fn test_remount_runs_failsafe_unmount_first() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().to_path_buf();
        fs::create_dir_all(base.join("archives").join("home20240101000000")).unwrap();
        fs::create_dir_all(base.join("merged-repo-home")).unwrap();

        let runner = FakeRunner::new(|program, args| match (program, args[0].as_str()) {
            ("borg", "list") => ok(LIST_JSON),
            ("mountpoint", _) => ok(""),
            _ => ok(""),
        });
        let settings = Settings::default();
        MountService::new(&runner, &settings)
            .mount(&base, &RepoPattern::parse("/data/repo::home*").unwrap())
            .unwrap();

        let unmounts = runner.calls_to("fusermount");
        assert_eq!(unmounts.len(), 2);
        assert!(unmounts[0][2].ends_with("merged-repo-home"));
        assert!(unmounts[1][2].ends_with("home20240101000000"));

        let calls = runner.calls();
        let first_borg = calls.iter().position(|c| c[0] == "borg").unwrap();
        let last_unmount = calls.iter().rposition(|c| c[0] == "fusermount").unwrap();
        assert!(last_unmount < first_borg);
    }

    #[test]
    fn test_mount_with_no_matches() {
        let temp = TempDir::new().unwrap();
        let runner = runner();
        let settings = Settings::default();
        let service = MountService::new(&runner, &settings);

        let plan = service
            .mount(temp.path(), &RepoPattern::parse("/data/repo::nothing*").unwrap())
            .unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.lowerdir, "");
        assert_eq!(service.state(), MountState::Unmounted);
        assert!(runner.calls_to("fuse-overlayfs").is_empty());
        assert!(!plan.merged_dir.exists());
    }

    #[test]
    fn test_mount_failure_is_not_rolled_back() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new(|program, args| match (program, args[0].as_str()) {
            ("borg", "list") => ok(LIST_JSON),
            ("borg", "mount") if args[1].ends_with("home20240301000000") => {
                fail(2, "Mountpoint must be a writable directory")
            }
            ("mountpoint", _) => fail(32, ""),
            _ => ok(""),
        });
        let settings = Settings::default();
        let service = MountService::new(&runner, &settings);

        let err = service
            .mount(temp.path(), &RepoPattern::parse("/r::home*").unwrap())
            .unwrap_err();

        assert!(err.is_external_tool());
        assert_eq!(service.state(), MountState::Mounting);
        assert_eq!(runner.calls_to("borg").len(), 3);
        assert!(runner.calls_to("fusermount").is_empty());
    }

    #[test]
    fn test_unmount_only_active_mounts() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().to_path_buf();
        for dir in ["archives/a", "archives/b", "merged-repo-home", "unrelated"] {
            fs::create_dir_all(base.join(dir)).unwrap();
        }
        fs::write(base.join("merged-file"), "").unwrap();

        let runner = FakeRunner::new(|program, args| match program {
            "mountpoint" if args[1].ends_with("/b") => fail(32, ""),
            _ => ok(""),
        });
        let settings = Settings::default();
        let report = MountService::new(&runner, &settings)
            .unmount(&base, false)
            .unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(
            report.unmounted,
            vec![base.join("merged-repo-home"), base.join("archives").join("a")]
        );
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_unmount_with_nothing_mounted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("archives").join("a")).unwrap();

        let runner = runner();
        let settings = Settings::default();
        let report = MountService::new(&runner, &settings)
            .unmount(temp.path(), false)
            .unwrap();

        assert_eq!(report.checked, 1);
        assert!(report.unmounted.is_empty());
        assert!(runner.calls_to("fusermount").is_empty());
    }

    #[test]
    fn test_unmount_failure_is_tolerated() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("archives").join("a")).unwrap();

        let runner = FakeRunner::new(|program, _| match program {
            "fusermount" => fail(1, "fusermount: entry not found"),
            _ => ok(""),
        });
        let settings = Settings::default();
        let report = MountService::new(&runner, &settings)
            .unmount(temp.path(), false)
            .unwrap();

        assert_eq!(report.failed, vec![temp.path().join("archives").join("a")]);
    }

    #[test]
    fn test_failsafe_tolerates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        assert!(mount_candidates(&missing, true).unwrap().is_empty());
        assert!(mount_candidates(&missing, false).is_err());

        // base exists, archives/ does not
        assert!(mount_candidates(temp.path(), true).unwrap().is_empty());
        assert!(matches!(
            mount_candidates(temp.path(), false),
            Err(OverlayError::Io(_))
        ));
    }
}
