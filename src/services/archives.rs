//! Archive service
//!
//! Lists, creates and deletes archives selected by a `REPO::PATTERN`
//! argument. Listing is the basis for everything else: borg's output is
//! sorted by creation time, filtered by the pattern and decorated with the
//! archive specifier (and mount point, when mounting).

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::error::{OverlayError, OverlayResult};
use crate::models::{matches, sort_by_start, Archive, ArchivePattern, RepoPattern};
use crate::tools::{Borg, CommandRunner};

/// A fully resolved `borg create` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Name the wildcard expanded to
    pub name: String,
    /// `REPO::NAME`
    pub spec: String,
    /// Arguments after the borg program name
    pub args: Vec<String>,
}

/// Service for archive selection and lifecycle
pub struct ArchiveService<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
}

impl<'a> ArchiveService<'a> {
    /// Create a new archive service
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self { runner, settings }
    }

    fn borg(&self) -> Borg<'a> {
        Borg::new(self.runner, self.settings)
    }

    /// Archives matching `pattern`, ascending by creation time
    pub fn list(
        &self,
        repository: &str,
        pattern: Option<&ArchivePattern>,
        mount_base: Option<&Path>,
    ) -> OverlayResult<Vec<Archive>> {
        let archives = self.borg().list_archives(repository)?;
        let selected = select(archives, repository, pattern, mount_base);

        tracing::debug!(
            repository,
            pattern = pattern.map(|p| p.as_str()).unwrap_or(""),
            matched = selected.len(),
            "Selected archives"
        );
        Ok(selected)
    }

    /// Resolve the archive name and arguments for a new archive
    ///
    /// `now` is the creation time the wildcard expands to.
    pub fn prepare_create(
        &self,
        target: &RepoPattern,
        now: DateTime<Utc>,
        params: &[String],
    ) -> OverlayResult<CreateRequest> {
        let pattern = creation_pattern(target)?;
        let name = pattern.expand(now, &self.settings.timestamp_format)?;
        let spec = target.spec_for(&name);
        let args = Borg::create_args(&self.settings.create_options, &spec, params);

        Ok(CreateRequest { name, spec, args })
    }

    /// Run a prepared create
    pub fn create(&self, request: &CreateRequest) -> OverlayResult<()> {
        self.borg().create(&request.spec, &request.args)
    }

    /// Printable command line for a prepared create
    pub fn create_command_line(&self, request: &CreateRequest) -> String {
        self.borg().command_line(&request.args)
    }

    /// Delete archives one by one, oldest first
    ///
    /// Stops at the first failure; archives already deleted stay deleted.
    pub fn delete(&self, archives: &[Archive]) -> OverlayResult<usize> {
        let borg = self.borg();
        for archive in archives {
            borg.delete(&archive.spec)?;
        }
        Ok(archives.len())
    }
}

/// Pattern of a create target, checked for creation use
pub fn creation_pattern(target: &RepoPattern) -> OverlayResult<&ArchivePattern> {
    let pattern = target.pattern.as_ref().ok_or_else(|| {
        OverlayError::invalid_pattern(
            "",
            "an archive pattern ending in '*' is required (REPO::NAME*)",
        )
    })?;
    pattern.validate_for_create()?;
    Ok(pattern)
}

/// Sort, filter and decorate a raw archive listing
pub fn select(
    mut archives: Vec<Archive>,
    repository: &str,
    pattern: Option<&ArchivePattern>,
    mount_base: Option<&Path>,
) -> Vec<Archive> {
    sort_by_start(&mut archives);
    archives.retain(|a| matches(&a.name, pattern));
    for archive in &mut archives {
        archive.decorate(repository, mount_base);
    }
    archives
}
