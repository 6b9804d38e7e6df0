use std::ffi::OsStr;
use std::path::Path;

use super::{error_chain, BackupError, Orchestrator};
use crate::backends::{DatabaseBackend, DumpUnit};
use crate::exec::Stopwatch;
use crate::report::{Outcome, Status};
use crate::target::{BackupTarget, DatabaseTarget, TargetClass};

/// Stands in for the schemas a dry run doesn't list.
const DRY_RUN_SCHEMA: &str = "<schema>";

impl Orchestrator<'_> {
    /// Dumps a database, one file per [DumpUnit] of its engine.
    ///
    /// Only a failed enumeration ends the whole target. A failing unit is
    /// reported and the remaining units are still dumped.
    pub(super) fn backup_database(&self, db: &DatabaseTarget) -> Result<Vec<Outcome>, BackupError> {
        let destination = self.prepare(db)?;
        let backend = db.engine().backend();

        let units = match backend.enumerate_command(db) {
            Some(command) => {
                let output = self
                    .executor
                    .execute(&command)
                    .map_err(|source| BackupError::Enumeration {
                        name: db.name().to_owned(),
                        source,
                    })?;
                backend.parse_units(&output)
            }
            None => vec![DumpUnit::Whole],
        };

        let units = if units.is_empty() && self.executor.is_dry_run() {
            log::info!(target: "backup::database", "Dry run, schemas of \"{}\" are not listed", db.name());
            vec![DumpUnit::Schema(DRY_RUN_SCHEMA.to_owned())]
        } else {
            units
        };

        if units.is_empty() {
            log::warn!(target: "backup::database", "No schemas found in database \"{}\"", db.name());
            return Ok(vec![Outcome::new(
                Status::Warning,
                TargetClass::Database,
                db.name(),
                "No schemas found to dump.",
            )]);
        }
        log::debug!(target: "backup::database", "Dumping {} unit(s) of \"{}\"", units.len(), db.name());

        Ok(units
            .iter()
            .map(|unit| self.dump_unit(db, backend, unit, &destination))
            .collect())
    }

    fn dump_unit(
        &self,
        db: &DatabaseTarget,
        backend: &dyn DatabaseBackend,
        unit: &DumpUnit,
        destination: &Path,
    ) -> Outcome {
        let stopwatch = Stopwatch::start(self.clock);
        let dump = backend.dump_file(db, unit);
        if Path::new(&dump.file_name).file_name() != Some(OsStr::new(&dump.file_name)) {
            let err = BackupError::FileName {
                name: db.name().to_owned(),
                unit: unit.clone(),
                file_name: dump.file_name,
            };
            return self.failed(TargetClass::Database, db.name(), &err);
        }
        let file = destination.join(&dump.file_name);

        if let Err(source) = self.executor.execute(&backend.dump_command(db, unit, &file)) {
            let err = BackupError::Dump {
                name: db.name().to_owned(),
                unit: unit.clone(),
                source,
            };
            return self.failed(TargetClass::Database, db.name(), &err);
        }

        let message = match unit {
            DumpUnit::Whole => "Database dumped.".to_owned(),
            DumpUnit::Schema(schema) => format!("Schema \"{schema}\" dumped."),
        };

        if dump.compressed {
            log::info!(target: "backup::database", "Dumped {unit} of \"{}\" to {}", db.name(), file.display());
            return Outcome::new(Status::Ok, TargetClass::Database, db.name(), message)
                .with_duration(stopwatch.elapsed());
        }

        let outcome = match self.archiver().compress_file(&file) {
            Ok(archive) => {
                log::info!(target: "backup::database", "Dumped {unit} of \"{}\" to {}", db.name(), archive.display());
                Outcome::new(Status::Ok, TargetClass::Database, db.name(), message)
            }
            Err(e) => {
                // the uncompressed dump is still usable
                log::warn!(target: "backup::database", "{}", error_chain(&e));
                log::debug!(target: "backup::database", "{e:?}");
                Outcome::new(
                    Status::Warning,
                    TargetClass::Database,
                    db.name(),
                    format!("{message} {e}"),
                )
            }
        };

        outcome.with_duration(stopwatch.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use crate::exec::testing::{FakeClock, FakeExecutor};
    use crate::exec::DryRun;
    use crate::orchestrator::tests::{settings, statuses, targets};
    use crate::orchestrator::Orchestrator;
    use crate::report::Status;
    use crate::target::TargetClass;

    const APP: &str = r#"
        [[databases]]
        name = "app"
        target = "/db"
        "#;

    #[test]
    fn one_failing_schema_does_not_stop_the_others() {
        let executor = FakeExecutor::new()
            .output("GROUP_CONCAT", &["shop,blog,wiki"])
            .fail("'blog' >", 2);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Ok, Status::Error, Status::Ok]);
        assert!(report.outcomes().iter().all(|o| o.target_name == "app"));
        assert_eq!(report.outcomes()[0].message, "Schema \"shop\" dumped.");
        assert!(report.outcomes()[1].message.starts_with("Failed to dump schema \"blog\" of database \"app\""));
        assert_eq!(report.outcomes()[2].message, "Schema \"wiki\" dumped.");

        let commands = executor.commands();
        assert!(commands.iter().any(|c| c.ends_with("'wiki' > '/backup/db/app_wiki.sql'")), "{commands:?}");
        assert!(commands.contains(&"gzip -f '/backup/db/app_shop.sql'".to_owned()));
        assert!(!commands.iter().any(|c| c.contains("gzip -f '/backup/db/app_blog.sql'")));
    }

    #[test]
    fn failed_enumeration_is_one_error() {
        let executor = FakeExecutor::new().fail("GROUP_CONCAT", 1);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Error]);
        assert!(report.outcomes()[0].message.starts_with("Failed to list the schemas of database \"app\""));
        assert_eq!(executor.commands().len(), 1);
    }

    #[test]
    fn no_schemas_is_a_warning() {
        let executor = FakeExecutor::new().output("GROUP_CONCAT", &["NULL"]);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Warning]);
        assert_eq!(executor.commands().len(), 1);
    }

    #[test]
    fn failed_compression_keeps_the_dump() {
        let executor = FakeExecutor::new()
            .output("GROUP_CONCAT", &["shop"])
            .fail("gzip -f", 1);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Warning]);
        let outcome = &report.outcomes()[0];
        assert!(outcome.message.starts_with("Schema \"shop\" dumped. Failed to create archive"), "{}", outcome.message);
        assert!(outcome.duration_nanos.is_some());
    }

    #[test]
    fn whole_dumps_of_postgres_and_mongodb() {
        let executor = FakeExecutor::new();
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(
            &targets(
                r#"
                [[databases]]
                name = "pg"
                engine = "postgres"

                [[databases]]
                name = "events"
                engine = "mongodb"
                "#,
            ),
            &TargetClass::ALL,
        );

        assert_eq!(statuses(&report), [Status::Ok, Status::Ok]);
        assert_eq!(report.outcomes()[0].message, "Database dumped.");
        assert_eq!(report.outcomes()[0].size_bytes, None);

        let commands = executor.commands();
        assert_eq!(commands.len(), 3, "{commands:?}");
        assert!(commands[0].starts_with("pg_dumpall"));
        assert_eq!(commands[1], "gzip -f '/backup/pg.sql'");
        assert!(commands[2].starts_with("mongodump"));
    }

    #[test]
    fn durations_are_per_schema() {
        let executor = FakeExecutor::new().output("GROUP_CONCAT", &["a,b"]);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        for outcome in report.outcomes() {
            assert_eq!(outcome.duration_nanos, Some(1_000));
        }
    }

    #[test]
    fn failed_dump_hides_password() {
        let executor = FakeExecutor::new()
            .output("GROUP_CONCAT", &["shop"])
            .fail("mysqldump", 2);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(
            &targets(
                r#"
                [[databases]]
                name = "app"
                user = "backup"
                password = "TopSecret42"
                "#,
            ),
            &TargetClass::ALL,
        );

        assert_eq!(statuses(&report), [Status::Error]);
        let message = &report.outcomes()[0].message;
        assert!(!message.contains("TopSecret42"), "{message}");
        assert!(message.contains("-u'backup' -p*** --single-transaction 'shop'"), "{message}");

        let json = serde_json::to_string(&report.summary(chrono::Local::now())).unwrap();
        assert!(!json.contains("TopSecret42"), "{json}");
        assert!(executor.commands()[1].contains("-p'TopSecret42'"));
    }

    #[test]
    fn schema_that_is_no_file_name() {
        let executor = FakeExecutor::new().output("GROUP_CONCAT", &["shop,a/b,.."]);
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Ok, Status::Error, Status::Ok]);
        assert_eq!(
            report.outcomes()[1].message,
            "Failed to dump schema \"a/b\" of database \"app\": \"app_a/b.sql\" is no valid file name"
        );
        assert!(executor.commands().iter().all(|c| !c.contains("'a/b'")));
    }

    #[test]
    fn dry_run_dumps_a_placeholder_schema() {
        let executor = FakeExecutor::new().dry_run();
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&executor, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Ok]);
        assert_eq!(report.outcomes()[0].message, "Schema \"<schema>\" dumped.");
        let commands = executor.commands();
        assert!(commands[1].ends_with("'<schema>' > '/backup/db/app_<schema>.sql'"), "{commands:?}");
    }

    #[test]
    fn dry_run_executor_is_detected() {
        let clock = FakeClock::new(1_000);

        let report = Orchestrator::new(&DryRun, &clock, settings(1)).run(&targets(APP), &TargetClass::ALL);

        assert_eq!(statuses(&report), [Status::Ok]);
    }
}
