//! The run loop driving the backup of every configured target.
//!
//! Targets are processed class by class: directories, then databases, then
//! servers. Within a class the targets may be spread over a bounded number of
//! worker threads, the outcomes are still reported in configuration order.
//!
//! A failing target is turned into an [`Status::Error`] outcome and never
//! stops the run.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use derive_more::{Display, Error};

mod database;
mod directory;
mod server;

use crate::archive::{Archiver, Compression};
use crate::backends::DumpUnit;
use crate::exec::{Clock, DirectoryError, Executor, ToolError};
use crate::report::{Outcome, Report, Status};
use crate::target::{BackupTarget, TargetClass, Targets};

/// Settings shared by every target of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Destination root, every target path is resolved against it.
    pub root: PathBuf,
    pub compression: Compression,
    /// Maximum number of targets of a class backed up at the same time.
    pub jobs: usize,
}

/// Hook of a directory target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum HookStage {
    #[display("before")]
    Before,
    #[display("after")]
    After,
}

/// Failure that ends the backup of a target, or of one of its schemas.
#[derive(Debug, Display, Error)]
pub enum BackupError {
    #[display("Failed to prepare the destination of \"{name}\"")]
    Destination { name: String, source: DirectoryError },
    #[display("Command {stage} the backup of \"{name}\" failed")]
    Hook {
        name: String,
        stage: HookStage,
        source: ToolError,
    },
    #[display("Failed to list the schemas of database \"{name}\"")]
    Enumeration { name: String, source: ToolError },
    #[display("Failed to dump {unit} of database \"{name}\"")]
    Dump {
        name: String,
        unit: DumpUnit,
        source: ToolError,
    },
    #[display("Failed to dump {unit} of database \"{name}\": \"{file_name}\" is no valid file name")]
    FileName {
        name: String,
        unit: DumpUnit,
        file_name: String,
    },
    #[display("Failed to download from server \"{name}\"")]
    Transfer { name: String, source: ToolError },
}

/// Message of `err` followed by all of its causes.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Resolves the target path of a target against the destination root.
///
/// Target paths are always relative to the root, a leading `/` is ignored.
pub fn destination(root: &Path, target: &str) -> PathBuf {
    root.join(target.trim_start_matches('/'))
}

fn log_target(class: TargetClass) -> &'static str {
    match class {
        TargetClass::Directory => "backup::directory",
        TargetClass::Database => "backup::database",
        TargetClass::Server => "backup::server",
    }
}

fn plural(class: TargetClass) -> &'static str {
    match class {
        TargetClass::Directory => "directories",
        TargetClass::Database => "databases",
        TargetClass::Server => "servers",
    }
}

/// Backs up [Targets] with the tools run by an [Executor].
pub struct Orchestrator<'a> {
    executor: &'a dyn Executor,
    clock: &'a dyn Clock,
    settings: RunSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: &'a dyn Executor, clock: &'a dyn Clock, settings: RunSettings) -> Self {
        Self {
            executor,
            clock,
            settings,
        }
    }

    /// Backs up all targets of the selected `classes`.
    pub fn run(&self, targets: &Targets, classes: &[TargetClass]) -> Report {
        let mut report = Report::new();

        for class in TargetClass::ALL {
            if !classes.contains(&class) {
                log::debug!(target: log_target(class), "Skipping all {}", plural(class));
                continue;
            }

            let outcomes = match class {
                TargetClass::Directory => {
                    self.run_class(&targets.directories, |d| self.backup_directory(d))
                }
                TargetClass::Database => {
                    self.run_class(&targets.databases, |d| self.backup_database(d))
                }
                TargetClass::Server => self.run_class(&targets.servers, |s| self.backup_server(s)),
            };
            report.extend(outcomes);
        }

        report
    }

    /// Runs `backup` for every target, at most [jobs](RunSettings::jobs) at once.
    fn run_class<T, F>(&self, targets: &[T], backup: F) -> Vec<Outcome>
    where
        T: BackupTarget + Sync,
        F: Fn(&T) -> Result<Vec<Outcome>, BackupError> + Sync,
    {
        if targets.is_empty() {
            log::warn!(target: log_target(T::CLASS), "No {} set in configuration.", plural(T::CLASS));
            return Vec::new();
        }

        let process = |target: &T| -> Vec<Outcome> {
            if target.is_disabled() {
                log::info!(target: log_target(T::CLASS), "Backup of \"{}\" is disabled", target.name());
                return vec![Outcome::new(
                    Status::Info,
                    T::CLASS,
                    target.name(),
                    "Backup disabled.",
                )];
            }

            log::info!(target: log_target(T::CLASS), "Backup of \"{}\" started", target.name());
            match backup(target) {
                Ok(outcomes) => outcomes,
                Err(e) => vec![self.failed(T::CLASS, target.name(), &e)],
            }
        };

        let workers = self.settings.jobs.clamp(1, targets.len());
        if workers == 1 {
            return targets.iter().flat_map(&process).collect();
        }

        // one slot per target keeps the configuration order
        let slots: Vec<Mutex<Vec<Outcome>>> = targets.iter().map(|_| Mutex::default()).collect();
        let next = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(target) = targets.get(index) else {
                        break;
                    };
                    let outcomes = process(target);
                    *slots[index].lock().expect("no panic while holding an outcome slot") = outcomes;
                });
            }
        });

        slots
            .into_iter()
            .flat_map(|slot| {
                slot.into_inner()
                    .expect("no panic while holding an outcome slot")
            })
            .collect()
    }

    /// Logs `err` and turns it into an [Status::Error] outcome.
    fn failed(&self, class: TargetClass, name: &str, err: &BackupError) -> Outcome {
        let message = error_chain(err);
        log::error!(target: log_target(class), "{message}");
        log::debug!(target: log_target(class), "{err:?}");

        Outcome::new(Status::Error, class, name, message)
    }

    /// Creates the destination directory of `target`.
    fn prepare<T: BackupTarget>(&self, target: &T) -> Result<PathBuf, BackupError> {
        let path = destination(&self.settings.root, &target.common().target);
        log::debug!(target: log_target(T::CLASS), "Destination of \"{}\": {}", target.name(), path.display());

        self.executor
            .create_directory(&path)
            .map_err(|source| BackupError::Destination {
                name: target.name().to_owned(),
                source,
            })?;

        Ok(path)
    }

    fn archiver(&self) -> Archiver<'a> {
        Archiver::new(self.executor, self.settings.compression)
    }
}
