//! Mount CLI commands
//!
//! Implements `mount` and `umount`.

use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::display::{format_mount_plan, format_unmount_report};
use crate::error::OverlayResult;
use crate::models::RepoPattern;
use crate::services::MountService;
use crate::tools::CommandRunner;

/// Arguments for `mount`
#[derive(Args, Debug)]
pub struct MountArgs {
    /// Repository and archive pattern, e.g. /data/repo::myhome*
    pub target: String,

    /// Directory that receives archives/ and the merged view
    pub mount_base: PathBuf,
}

/// Arguments for `umount`
#[derive(Args, Debug)]
pub struct UmountArgs {
    /// Directory previously passed to `mount`
    pub mount_base: PathBuf,

    /// Treat a missing mount base or archives/ directory as nothing mounted
    #[arg(long)]
    pub failsafe: bool,
}

/// Handle `mount`
pub fn handle_mount_command(
    runner: &dyn CommandRunner,
    settings: &Settings,
    args: MountArgs,
) -> OverlayResult<()> {
    let target = RepoPattern::parse(&args.target)?;

    let service = MountService::new(runner, settings);
    let plan = service.mount(&args.mount_base, &target)?;

    print!("{}", format_mount_plan(&plan));
    Ok(())
}

/// Handle `umount`
pub fn handle_umount_command(
    runner: &dyn CommandRunner,
    settings: &Settings,
    args: UmountArgs,
) -> OverlayResult<()> {
    let service = MountService::new(runner, settings);
    let report = service.unmount(&args.mount_base, args.failsafe)?;

    print!("{}", format_unmount_report(&report));
    Ok(())
}
