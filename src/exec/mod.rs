//! Capabilities used to touch the outside world: running shell commands,
//! creating directories and reading a monotonic clock.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use derive_more::{Display, Error};

mod clock;

pub use clock::{Clock, MonotonicClock, Stopwatch};

use crate::backends::shell;

/// A command failed to run or exited unsuccessfully.
///
/// `command` is [redacted](shell::redact), it never contains passwords.
#[derive(Debug, Display, Error)]
pub enum ToolError {
    /// The shell itself couldn't be started.
    #[display("Failed to invoke command: {command}")]
    NotRun { command: String, source: io::Error },
    /// The command exited with a non-zero status.
    #[display("Failed to execute command (exit status {}): {command}", code.map_or_else(|| "none".to_owned(), |c| c.to_string()))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ToolError {
    /// Exit code of a [Failed](Self::Failed) command.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::NotRun { .. } => None,
            Self::Failed { code, .. } => *code,
        }
    }

    /// Captured error output of a [Failed](Self::Failed) command.
    pub fn stderr(&self) -> &str {
        match self {
            Self::NotRun { .. } => "",
            Self::Failed { stderr, .. } => stderr,
        }
    }
}

/// A destination directory couldn't be created.
#[derive(Debug, Display, Error)]
#[display("Failed to create directory {}", path.display())]
pub struct DirectoryError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// Runs external commands on behalf of the orchestrator.
pub trait Executor: Send + Sync {
    /// Runs `command` in a shell and returns its standard output line by line.
    fn execute(&self, command: &str) -> Result<Vec<String>, ToolError>;

    /// Creates `path` and all of its parents.
    ///
    /// An already existing directory is not an error.
    fn create_directory(&self, path: &Path) -> Result<(), DirectoryError>;

    /// Commands are only logged, their output is always empty.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// [Executor] running commands with `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shell;

impl Executor for Shell {
    fn execute(&self, command: &str) -> Result<Vec<String>, ToolError> {
        log::trace!(target: "shell", "Execute command: {command}");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| ToolError::NotRun {
                command: shell::redact(command).into_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stdout.lines() {
            log::debug!(target: "shell", "{line}");
        }
        log::debug!(target: "shell", "Return status: {}", output.status);

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: shell::redact(command).into_owned(),
                code: output.status.code(),
                stderr: stderr.trim_end().to_owned(),
            });
        }

        // relay stderr
        if !stderr.is_empty() {
            log::warn!(target: "shell", "{}", stderr.trim_end());
        }

        Ok(stdout.lines().map(str::to_owned).collect())
    }

    fn create_directory(&self, path: &Path) -> Result<(), DirectoryError> {
        std::fs::create_dir_all(path).map_err(|source| DirectoryError {
            path: path.to_owned(),
            source,
        })
    }
}

/// [Executor] that only logs what would be done.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl Executor for DryRun {
    fn execute(&self, command: &str) -> Result<Vec<String>, ToolError> {
        log::info!(target: "shell", "Dry run, skipping: {}", shell::redact(command));
        Ok(Vec::new())
    }

    fn create_directory(&self, path: &Path) -> Result<(), DirectoryError> {
        log::info!(target: "shell", "Dry run, not creating directory: {}", path.display());
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Size of `path` in bytes as reported by `du -sb`.
///
/// Failures are logged and result in [None].
pub fn disk_usage(executor: &dyn Executor, path: &Path) -> Option<u64> {
    let command = format!("du -sb {}", shell::quote(&path.to_string_lossy()));

    match executor.execute(&command) {
        Ok(lines) => {
            let size = lines
                .first()
                .and_then(|line| line.split_whitespace().next())
                .and_then(|size| size.parse().ok());
            if size.is_none() {
                log::debug!(target: "shell", "No size reported for {}", path.display());
            }
            size
        }
        Err(e) => {
            log::error!(target: "shell", "Measuring the size of {} failed: {e}", path.display());
            log::debug!(target: "shell", "{e:?}");
            None
        }
    }
}
