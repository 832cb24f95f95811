//! Archive CLI commands
//!
//! Implements `create`, `list` and `delete`.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use clap::Args;

use crate::config::Settings;
use crate::display::{format_archive_groups, format_archive_list};
use crate::error::{OverlayError, OverlayResult};
use crate::models::RepoPattern;
use crate::services::{ArchiveService, NamingScheme};
use crate::tools::CommandRunner;

/// Arguments for `create`
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Repository and name pattern ending in '*', e.g. /data/repo::myhome*
    pub target: String,

    /// Don't ask for confirmation when the pattern matches no existing archive
    #[arg(short, long)]
    pub yes: bool,

    /// Print the borg command instead of running it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Arguments passed to `borg create` after the archive (paths, options)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub borg_args: Vec<String>,
}

/// Arguments for `list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Repository and archive pattern, e.g. /data/repo::myhome*
    pub target: String,

    /// One flat table instead of naming-scheme groups
    #[arg(long)]
    pub flat: bool,

    /// Print the grouped archives as JSON
    #[arg(long, conflicts_with = "flat")]
    pub json: bool,
}

/// Arguments for `delete`
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Repository and archive pattern, e.g. /data/repo::myhome2023*
    pub target: String,

    /// Show which archives would be deleted without deleting them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Handle `create`
///
/// `now` is the creation time the pattern's wildcard expands to.
pub fn handle_create_command(
    runner: &dyn CommandRunner,
    settings: &Settings,
    args: CreateArgs,
    now: DateTime<Utc>,
) -> OverlayResult<()> {
    let target = RepoPattern::parse(&args.target)?;

    let service = ArchiveService::new(runner, settings);
    let request = service.prepare_create(&target, now, &args.borg_args)?;

    if args.dry_run {
        println!("{}", service.create_command_line(&request));
        return Ok(());
    }

    if !args.yes && io::stdin().is_terminal() {
        let existing = service.list(&target.repository, target.pattern.as_ref(), None)?;
        if existing.is_empty() {
            let question = format!(
                "No archive in {} matches '{}'. Create {}? (yes/no): ",
                target.repository,
                target.pattern_str(),
                request.name
            );
            if !prompt_confirm(&question)? {
                return Err(OverlayError::Aborted("archive not created".into()));
            }
        }
    }

    service.create(&request)?;
    println!("Created archive: {}", request.spec);
    Ok(())
}

/// Handle `list`
pub fn handle_list_command(
    runner: &dyn CommandRunner,
    settings: &Settings,
    args: ListArgs,
) -> OverlayResult<()> {
    let target = RepoPattern::parse(&args.target)?;
    let archives = ArchiveService::new(runner, settings).list(
        &target.repository,
        target.pattern.as_ref(),
        None,
    )?;

    if target.pattern.is_none() {
        eprintln!(
            "No archive pattern given; use '{}::*' to list every archive.",
            target.repository
        );
    }

    if args.flat {
        if !archives.is_empty() {
            print!("{}", format_archive_list(&archives));
        }
        return Ok(());
    }

    let groups = NamingScheme::for_format(&settings.timestamp_format)?.group(&archives);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else if !groups.is_empty() {
        print!("{}", format_archive_groups(&groups));
    }

    Ok(())
}

/// Handle `delete`
pub fn handle_delete_command(
    runner: &dyn CommandRunner,
    settings: &Settings,
    args: DeleteArgs,
) -> OverlayResult<()> {
    let target = RepoPattern::parse(&args.target)?;
    let service = ArchiveService::new(runner, settings);
    let archives = service.list(&target.repository, target.pattern.as_ref(), None)?;

    if archives.is_empty() {
        println!("No archives match; nothing deleted.");
        return Ok(());
    }

    if args.dry_run {
        println!("Would delete {} archive(s):", archives.len());
        for archive in &archives {
            println!("  {}", archive.spec);
        }
        return Ok(());
    }

    for archive in &archives {
        println!("Deleting {}", archive.spec);
    }
    let deleted = service.delete(&archives)?;
    println!("Deleted {} archive(s).", deleted);

    Ok(())
}

/// Ask a yes/no question on the terminal
fn prompt_confirm(question: &str) -> OverlayResult<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
