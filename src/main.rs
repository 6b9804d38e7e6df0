use std::path::Path;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use mbackup_lib::cli::Cli;
use mbackup_lib::config::Configuration;
use mbackup_lib::exec::{DryRun, Executor, MonotonicClock, Shell};
use mbackup_lib::orchestrator::{Orchestrator, RunSettings};
use mbackup_lib::report::Report;
use mbackup_lib::target::Targets;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    env_logger.try_init().expect("env_logger should not fail");

    if run(&cli) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Backs up everything `cli` selects and tells whether the run succeeded.
///
/// A run fails on an invalid configuration, an unusable backup root, an
/// [ERROR](mbackup_lib::report::Status::Error) outcome or a report that can't
/// be written.
fn run(cli: &Cli) -> bool {
    let config = match Configuration::load_or_init(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Reading the config file failed: {e}");
            return false;
        }
    };

    let targets = match Targets::from_sources(&config.sources) {
        Ok(targets) => targets,
        Err(e) => {
            log::error!("Invalid target in {}: {e}", cli.config.display());
            return false;
        }
    };

    let executor: &dyn Executor = if cli.dry_run {
        log::warn!("Running in dry-run mode");
        &DryRun
    } else {
        &Shell
    };

    let root = config.target.directory;
    if let Err(e) = executor.create_directory(&root) {
        log::error!("Backup root can't be established. {e}: {}", e.source);
        return false;
    }

    let settings = RunSettings {
        root,
        compression: cli.compression.unwrap_or(config.compression),
        jobs: cli.jobs.map_or(config.jobs, usize::from),
    };
    log::debug!("Run settings: {settings:?}");

    let clock = MonotonicClock::new();
    let report = Orchestrator::new(executor, &clock, settings).run(&targets, &cli.selected_classes());

    for outcome in report.outcomes() {
        println!("{outcome}");
    }

    let mut success = !report.has_errors();

    if let Some(path) = &cli.report {
        if let Err(e) = write_report(path, &report) {
            log::error!(target: "report", "Writing the report to {} failed: {e}", path.display());
            success = false;
        }
    }

    success
}

fn write_report(path: &Path, report: &Report) -> std::io::Result<()> {
    let summary = report.summary(Local::now());
    let json = serde_json::to_string_pretty(&summary).expect("summary should be serializable");
    std::fs::write(path, json)?;
    log::info!(target: "report", "Summary written to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    struct Setup {
        dir: tempfile::TempDir,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        /// Writes a configuration with the backup root inside the temporary
        /// directory, followed by `sources`.
        fn config(&self, sources: &str) -> PathBuf {
            let config = self.path("config.toml");
            let content = format!(
                "[target]\ndirectory = '{}'\n{sources}",
                self.path("backup").display()
            );
            fs::write(&config, content).unwrap();
            config
        }

        fn cli(&self, config: &Path, extra: &[&str]) -> Cli {
            let config = config.to_string_lossy();
            let mut args = vec!["mbackup", "--config", &config];
            args.extend_from_slice(extra);
            Cli::try_parse_from(args).unwrap()
        }
    }

    fn report_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn successful_run_writes_report() {
        let setup = Setup::new();
        let source = setup.path("source");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("app.log"), "started").unwrap();
        let config = setup.config(&format!(
            "[[sources.directories]]\nname = 'logs'\nsource = '{}'\ntarget = '/logs'\n",
            source.display()
        ));
        let report = setup.path("report.json");

        assert!(run(&setup.cli(&config, &["--report", &report.to_string_lossy()])));

        assert!(setup.path("backup/logs/logs.tar.gz").is_file());
        let json = report_json(&report);
        assert_eq!(json["error_occurred"], false);
        assert_eq!(json["sections"][0]["tasks"][0]["status"], "OK");
    }

    #[test]
    fn error_outcome_fails() {
        let setup = Setup::new();
        let config = setup.config(
            "[[sources.directories]]\nname = 'app'\nsource = '/srv/app'\ncommands = { before = 'exit 3' }\n",
        );
        let report = setup.path("report.json");

        assert!(!run(&setup.cli(&config, &["--report", &report.to_string_lossy()])));
        assert_eq!(report_json(&report)["error_occurred"], true);
    }

    #[test]
    fn invalid_configuration_fails() {
        let setup = Setup::new();
        let config = setup.path("config.toml");
        fs::write(&config, "jobs = ").unwrap();

        assert!(!run(&setup.cli(&config, &[])));
    }

    #[test]
    fn invalid_target_fails() {
        let setup = Setup::new();
        let config = setup.config("[[sources.directories]]\nname = 'no source'\n");

        assert!(!run(&setup.cli(&config, &[])));
        assert!(!setup.path("backup").exists());
    }

    #[test]
    fn unusable_root_fails() {
        let setup = Setup::new();
        fs::write(setup.path("backup"), "not a directory").unwrap();
        let config = setup.config("");

        assert!(!run(&setup.cli(&config, &[])));
    }

    #[test]
    fn unwritable_report_fails() {
        let setup = Setup::new();
        let config = setup.config("");
        let report = setup.path("missing/report.json");

        assert!(!run(&setup.cli(&config, &["--report", &report.to_string_lossy()])));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let setup = Setup::new();
        let config = setup.config(
            "[[sources.databases]]\nname = 'app'\n\n[[sources.directories]]\nname = 'etc'\nsource = '/etc'\n",
        );

        assert!(run(&setup.cli(&config, &["--dry-run"])));
        assert!(!setup.path("backup").exists());
    }
}
