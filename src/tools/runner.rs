//! Process execution
//!
//! Every external binary is reached through `CommandRunner`, so tests can
//! swap in a fake that records invocations instead of spawning processes.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{OverlayError, OverlayResult};

/// Captured result of one process run
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a non-zero exit into an `ExternalTool` error
    pub fn check(self, tool: &str) -> OverlayResult<Self> {
        if self.success() {
            return Ok(self);
        }

        let status = match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr_lossy();
        let stderr = stderr.trim();

        Err(OverlayError::external(
            tool,
            if stderr.is_empty() {
                status
            } else {
                format!("{}: {}", status, stderr)
            },
        ))
    }
}

/// Executes a program and captures its output
pub trait CommandRunner {
    /// Run `program` with `args` to completion
    ///
    /// A non-zero exit is not an error here; only failing to spawn is.
    fn execute(&self, program: &str, args: &[String]) -> OverlayResult<CommandOutput>;

    /// Run `program` with its output going straight to the terminal
    ///
    /// Used for long-running commands whose progress the user watches. The
    /// returned output carries only the exit code.
    fn execute_attached(&self, program: &str, args: &[String]) -> OverlayResult<CommandOutput> {
        self.execute(program, args)
    }
}

/// Runs real processes found on the search path
///
/// Stdin is inherited so the backup tool can still prompt for a passphrase.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, program: &str, args: &[String]) -> OverlayResult<CommandOutput> {
        tracing::debug!(program, ?args, "Running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|e| OverlayError::external(program, format!("failed to start: {}", e)))?;

        tracing::debug!(program, code = ?output.status.code(), "External command finished");

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn execute_attached(&self, program: &str, args: &[String]) -> OverlayResult<CommandOutput> {
        tracing::debug!(program, ?args, "Running attached external command");

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| OverlayError::external(program, format!("failed to start: {}", e)))?;

        tracing::debug!(program, code = ?status.code(), "External command finished");

        Ok(CommandOutput {
            code: status.code(),
            ..CommandOutput::default()
        })
    }
}

/// Render a path as a command-line argument
pub fn path_arg(path: &Path) -> OverlayResult<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        OverlayError::Validation(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording stand-in for `SystemRunner`

    use std::cell::RefCell;

    use super::{CommandOutput, CommandRunner};
    use crate::error::OverlayResult;

    type Responder = Box<dyn Fn(&str, &[String]) -> CommandOutput>;

    pub struct FakeRunner {
        calls: RefCell<Vec<Vec<String>>>,
        responder: Responder,
    }

    impl FakeRunner {
        pub fn new(responder: impl Fn(&str, &[String]) -> CommandOutput + 'static) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                responder: Box::new(responder),
            }
        }

        /// A runner where every command succeeds with no output
        pub fn succeeding() -> Self {
            Self::new(|_, _| ok(""))
        }

        /// Every invocation as `[program, args...]`
        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        /// Invocations of one program
        pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter(|call| call[0] == program)
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn execute(&self, program: &str, args: &[String]) -> OverlayResult<CommandOutput> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().cloned());
            self.calls.borrow_mut().push(call);
            Ok((self.responder)(program, args))
        }
    }

    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }
}
