use super::{error_chain, BackupError, HookStage, Orchestrator};
use crate::exec::{disk_usage, Stopwatch};
use crate::report::{Outcome, Status};
use crate::target::{BackupTarget, DirectoryTarget, TargetClass};

impl Orchestrator<'_> {
    /// Archives a local directory, surrounded by its hooks.
    ///
    /// Archiving is best-effort: a failing `tar` results in a
    /// [Status::Warning] and the after hook still runs.
    pub(super) fn backup_directory(
        &self,
        directory: &DirectoryTarget,
    ) -> Result<Vec<Outcome>, BackupError> {
        let stopwatch = Stopwatch::start(self.clock);
        let destination = self.prepare(directory)?;

        if let Some(command) = directory.command_before() {
            self.run_hook(directory, HookStage::Before, command)?;
        }

        let archive = destination.join(directory.archive_name(self.settings.compression));
        let archived = self
            .archiver()
            .create_archive(&directory.common().source, &archive);

        if let Some(command) = directory.command_after() {
            self.run_hook(directory, HookStage::After, command)?;
        }

        let outcome = match archived {
            Ok(()) => {
                let duration = stopwatch.elapsed();
                log::info!(target: "backup::directory", "Directory \"{}\" archived", directory.name());
                Outcome::new(Status::Ok, TargetClass::Directory, directory.name(), "Files archived.")
                    .with_duration(duration)
                    .with_size(disk_usage(self.executor, &destination))
            }
            Err(e) => {
                let message = error_chain(&e);
                log::warn!(target: "backup::directory", "{message}");
                log::debug!(target: "backup::directory", "{e:?}");
                Outcome::new(Status::Warning, TargetClass::Directory, directory.name(), message)
                    .with_duration(stopwatch.elapsed())
            }
        };

        Ok(vec![outcome])
    }

    fn run_hook(
        &self,
        directory: &DirectoryTarget,
        stage: HookStage,
        command: &str,
    ) -> Result<(), BackupError> {
        log::debug!(target: "backup::directory", "Running command {stage} the backup of \"{}\"", directory.name());

        self.executor
            .execute(command)
            .map(|_| ())
            .map_err(|source| BackupError::Hook {
                name: directory.name().to_owned(),
                stage,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::exec::testing::{FakeClock, FakeExecutor};
    use crate::orchestrator::tests::{settings, statuses, targets};
    use crate::orchestrator::Orchestrator;
    use crate::report::Status;
    use crate::target::TargetClass;

    const LOGS: &str = r#"
        [[directories]]
        name = "logs"
        source = "/var/log/app"
        target = "/logs"
        commands = { before = "systemctl stop app", after = "systemctl start app" }
        "#;

    #[test]
    fn archives_into_destination() {
        let executor = FakeExecutor::new().output("du -sb", &["2048\t/backup/logs"]);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(LOGS), &TargetClass::ALL);

        let outcome = &report.outcomes()[0];
        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(outcome.target_name, "logs");
        assert_eq!(outcome.message, "Files archived.");
        assert_eq!(outcome.size_bytes, Some(2048));
        assert!(outcome.duration_nanos.is_some_and(|d| d > 0));

        assert_eq!(executor.directories(), [Path::new("/backup/logs")]);
        assert_eq!(
            executor.commands(),
            [
                "systemctl stop app",
                "tar -czf '/backup/logs/logs.tar.gz' '/var/log/app'",
                "systemctl start app",
                "du -sb '/backup/logs'",
            ]
        );
    }

    #[test]
    fn failing_hook_stops_the_target() {
        let executor = FakeExecutor::new().fail("systemctl stop", 1);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(LOGS), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Error]);
        let message = &report.outcomes()[0].message;
        assert!(message.starts_with("Command before the backup of \"logs\" failed"), "{message}");
        assert_eq!(executor.commands(), ["systemctl stop app"]);
    }

    #[test]
    fn failed_archive_is_a_warning_and_runs_after_hook() {
        let executor = FakeExecutor::new().fail("tar -czf", 1);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(LOGS), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Warning]);
        let message = &report.outcomes()[0].message;
        assert!(message.contains("Some files changed while archiving."), "{message}");
        assert_eq!(executor.commands().last().unwrap(), "systemctl start app");
    }

    #[test]
    fn unwritable_destination() {
        let executor = FakeExecutor::new().fail_directory("/backup/logs");
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(
            &targets(
                r#"
                [[directories]]
                name = "logs"
                source = "/var/log/app"
                target = "/logs"

                [[directories]]
                name = "etc"
                source = "/etc"
                target = "/etc"
                "#,
            ),
            &TargetClass::ALL,
        );

        assert_eq!(statuses(&report), [Status::Error, Status::Ok]);
        assert!(report.outcomes()[0].message.contains("Failed to create directory /backup/logs"));
        assert!(executor.commands().iter().all(|c| !c.contains("/var/log/app")));
    }

    #[test]
    fn bzip2_archive_name() {
        let executor = FakeExecutor::new();
        let clock = FakeClock::new(1_000);
        let mut settings = settings(1);
        settings.compression = crate::archive::Compression::Bzip2;

        Orchestrator::new(&executor, &clock, settings).run(
            &targets(
                r#"
                [[directories]]
                name = "web root"
                source = "/var/www"
                "#,
            ),
            &TargetClass::ALL,
        );

        assert_eq!(executor.commands()[0], "tar -cjf '/backup/web_root.tar.bz2' '/var/www'");
    }
}
