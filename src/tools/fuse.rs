//! Overlay and mount-table tools
//!
//! `Overlay` composes mounted archives into one merged view. `MountTable`
//! answers "is this path a mount point" and unmounts, best-effort.

use std::path::Path;

use super::runner::{path_arg, CommandRunner};
use crate::config::Settings;
use crate::error::{OverlayError, OverlayResult};

/// Client for the overlay filesystem binary
pub struct Overlay<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
}

impl<'a> Overlay<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            program: &settings.overlay_command,
        }
    }

    /// Mount `lowerdir` layers (first listed wins) at `merged`
    pub fn mount(&self, lowerdir: &str, merged: &Path) -> OverlayResult<()> {
        tracing::info!(merged = %merged.display(), lowerdir, "Mounting overlay");

        let args = vec![
            "-o".to_string(),
            format!("lowerdir={}", lowerdir),
            path_arg(merged)?,
        ];
        self.runner.execute(self.program, &args)?.check(self.program)?;
        Ok(())
    }
}

/// Queries and edits the mount table
pub struct MountTable<'a> {
    runner: &'a dyn CommandRunner,
    mountpoint_program: &'a str,
    unmount_command: &'a [String],
}

impl<'a> MountTable<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            mountpoint_program: &settings.mountpoint_command,
            unmount_command: &settings.unmount_command,
        }
    }

    /// Whether `path` is currently an active mount point
    ///
    /// Only a failure to run the query tool is an error; any non-zero exit
    /// means "not a mount point".
    pub fn is_mount_point(&self, path: &Path) -> OverlayResult<bool> {
        let args = vec!["-q".to_string(), path_arg(path)?];
        let output = self.runner.execute(self.mountpoint_program, &args)?;
        Ok(output.success())
    }

    /// Unmount `path`, returning whether the unmount tool succeeded
    ///
    /// Failures are logged, never returned.
    pub fn unmount(&self, path: &Path) -> OverlayResult<bool> {
        let (program, fixed) = self.unmount_command.split_first().ok_or_else(|| {
            OverlayError::Config("unmount_command needs at least a program name".into())
        })?;

        let mut args = fixed.to_vec();
        args.push(path_arg(path)?);

        tracing::info!(path = %path.display(), "Unmounting");
        match self.runner.execute(program, &args) {
            Ok(output) if output.success() => Ok(true),
            Ok(output) => {
                tracing::warn!(
                    path = %path.display(),
                    code = ?output.code,
                    stderr = %output.stderr_lossy().trim(),
                    "Unmount failed, continuing"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unmount failed, continuing");
                Ok(false)
            }
        }
    }
}
