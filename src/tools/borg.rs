//! Backup tool client
//!
//! Wraps the `list --json`, `create`, `delete` and `mount` operations of
//! borg. Archive selection and naming happen in the services layer; this
//! module only speaks the command-line and JSON contract.

use std::path::Path;

use serde::Deserialize;

use super::runner::{path_arg, CommandOutput, CommandRunner};
use crate::config::Settings;
use crate::error::{OverlayError, OverlayResult};
use crate::models::Archive;

#[derive(Debug, Deserialize)]
struct ListResponse {
    archives: Vec<Archive>,
}

/// Client for the borg binary
pub struct Borg<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
}

impl<'a> Borg<'a> {
    /// Create a client using the configured borg binary
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            program: &settings.borg_command,
        }
    }

    /// All archives in a repository, in the order borg reports them
    pub fn list_archives(&self, repository: &str) -> OverlayResult<Vec<Archive>> {
        let args = vec!["list".to_string(), "--json".to_string(), repository.to_string()];
        let output = self.run("borg list", &args)?;

        let response: ListResponse = serde_json::from_slice(&output.stdout).map_err(|e| {
            OverlayError::external("borg list", format!("unparsable JSON output: {}", e))
        })?;

        tracing::debug!(repository, count = response.archives.len(), "Listed archives");
        Ok(response.archives)
    }

    /// Arguments for `borg create`
    ///
    /// Options come first, then the archive specifier, then the passthrough
    /// parameters (paths and any further options).
    pub fn create_args(options: &[String], spec: &str, params: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(options.len() + params.len() + 2);
        args.push("create".to_string());
        args.extend(options.iter().cloned());
        args.push(spec.to_string());
        args.extend(params.iter().cloned());
        args
    }

    /// Create a new archive from arguments built by `create_args`
    ///
    /// borg's progress and statistics go straight to the terminal.
    pub fn create(&self, spec: &str, args: &[String]) -> OverlayResult<()> {
        tracing::info!(spec, "Creating archive");
        self.runner
            .execute_attached(self.program, args)?
            .check("borg create")?;
        Ok(())
    }

    /// Delete one archive
    pub fn delete(&self, spec: &str) -> OverlayResult<()> {
        tracing::info!(spec, "Deleting archive");
        self.run("borg delete", &["delete".to_string(), spec.to_string()])?;
        Ok(())
    }

    /// Expose an archive read-only at `target`
    pub fn mount(&self, spec: &str, target: &Path) -> OverlayResult<()> {
        tracing::info!(spec, target = %target.display(), "Mounting archive");
        self.run(
            "borg mount",
            &["mount".to_string(), spec.to_string(), path_arg(target)?],
        )?;
        Ok(())
    }

    /// The program and arguments as one printable line
    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, tool: &str, args: &[String]) -> OverlayResult<CommandOutput> {
        self.runner.execute(self.program, args)?.check(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::runner::fake::{fail, ok, FakeRunner};

    const LIST_JSON: &str = r#"{
        "archives": [
            {"name": "home20240601000000", "id": "b2", "start": "2024-06-01T00:00:00.000000"},
            {"name": "home20240101000000", "id": "a1", "start": "2024-01-01T00:00:00.000000"}
        ],
        "encryption": {"mode": "repokey"},
        "repository": {"id": "r", "location": "/data/repo"}
    }"#;

    #[test]
    fn test_list_archives() {
        let runner = FakeRunner::new(|_, _| ok(LIST_JSON));
        let settings = Settings::default();
        let borg = Borg::new(&runner, &settings);

        let archives = borg.list_archives("/data/repo").unwrap();
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].name, "home20240601000000");
        assert_eq!(runner.calls(), vec![vec!["borg", "list", "--json", "/data/repo"]]);
    }

    #[test]
    fn test_list_failure() {
        let runner = FakeRunner::new(|_, _| fail(2, "Repository /nope does not exist."));
        let settings = Settings::default();
        let err = Borg::new(&runner, &settings).list_archives("/nope").unwrap_err();
        assert!(err.is_external_tool());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_list_unparsable_output() {
        let runner = FakeRunner::new(|_, _| ok("not json"));
        let settings = Settings::default();
        let err = Borg::new(&runner, &settings).list_archives("/data/repo").unwrap_err();
        assert!(err.is_external_tool());
    }

    #[test]
    fn test_create_args_order() {
        let args = Borg::create_args(
            &["--stats".to_string()],
            "/data/repo::home20240101000000",
            &["/home".to_string(), "--exclude".to_string(), "*.tmp".to_string()],
        );
        assert_eq!(
            args,
            vec!["create", "--stats", "/data/repo::home20240101000000", "/home", "--exclude", "*.tmp"]
        );
    }

    #[test]
    fn test_create_runs_prepared_args() {
        let runner = FakeRunner::new(|_, _| fail(2, "Repository is locked"));
        let settings = Settings::default();
        let borg = Borg::new(&runner, &settings);
        let args = Borg::create_args(&[], "/r::a1", &["/home".to_string()]);

        let err = borg.create("/r::a1", &args).unwrap_err();
        assert!(err.to_string().starts_with("borg create failed"));
        assert_eq!(runner.calls(), vec![vec!["borg", "create", "/r::a1", "/home"]]);
    }

    #[test]
    fn test_mount_and_delete() {
        let runner = FakeRunner::succeeding();
        let mut settings = Settings::default();
        settings.borg_command = "borg1".into();
        let borg = Borg::new(&runner, &settings);

        borg.mount("/r::a", Path::new("/mnt/archives/a")).unwrap();
        borg.delete("/r::a").unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                vec!["borg1", "mount", "/r::a", "/mnt/archives/a"],
                vec!["borg1", "delete", "/r::a"],
            ]
        );
        assert_eq!(borg.command_line(&["delete".into(), "/r::a".into()]), "borg1 delete /r::a");
    }
}
