//! Command builders for the targets delegated to external tools.
//!
//! Currently the following backends are implemented:
//!
//! - [MySql]: One dump per schema of a MySQL or MariaDB server.
//! - [Postgres]: Dump of the whole cluster with `pg_dumpall`.
//! - [MongoDb]: Compressed archive created by `mongodump`.
//! - [rsync]: Transfer of a remote directory over SSH.

use std::fmt;
use std::path::Path;

pub mod mongodb;
pub mod mysql;
pub mod postgres;
pub mod rsync;
pub mod shell;

pub use mongodb::MongoDb;
pub use mysql::MySql;
pub use postgres::Postgres;

use crate::target::{DatabaseTarget, Engine, DEFAULT_HOST};

/// Part of a database that is dumped into its own file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpUnit {
    /// Everything the dump tool can reach.
    Whole,
    /// A single schema.
    Schema(String),
}

impl fmt::Display for DumpUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => f.write_str("database"),
            Self::Schema(schema) => write!(f, "schema \"{schema}\""),
        }
    }
}

/// File written by a dump command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub file_name: String,
    /// The dump tool compresses on its own, no further archiving needed.
    pub compressed: bool,
}

/// Engine specific commands to dump a [DatabaseTarget].
pub trait DatabaseBackend: Sync {
    /// Command listing the [DumpUnit]s, [None] if the engine is dumped as a whole.
    fn enumerate_command(&self, _db: &DatabaseTarget) -> Option<String> {
        None
    }

    /// Extracts the units from the output of the [enumerate_command](Self::enumerate_command).
    fn parse_units(&self, _output: &[String]) -> Vec<DumpUnit> {
        vec![DumpUnit::Whole]
    }

    /// Name of the file `unit` is dumped to.
    fn dump_file(&self, db: &DatabaseTarget, unit: &DumpUnit) -> DumpFile;

    /// Command writing the dump of `unit` to `file`.
    fn dump_command(&self, db: &DatabaseTarget, unit: &DumpUnit, file: &Path) -> String;
}

static MYSQL: MySql = MySql::MYSQL;
static MARIADB: MySql = MySql::MARIADB;

impl Engine {
    /// The [DatabaseBackend] handling this engine.
    pub fn backend(self) -> &'static dyn DatabaseBackend {
        match self {
            Engine::Mysql => &MYSQL,
            Engine::Mariadb => &MARIADB,
            Engine::Postgres => &Postgres,
            Engine::Mongodb => &MongoDb,
        }
    }
}

/// Wraps `command` in `docker exec` for containerized databases.
fn in_container(db: &DatabaseTarget, command: &str) -> String {
    match db.container() {
        Some(container) if db.is_docker() => shell::docker_exec(container, command),
        _ => command.to_owned(),
    }
}

/// The default host is passed as is, everything else quoted.
fn host_value(host: &str) -> String {
    if host == DEFAULT_HOST {
        host.to_owned()
    } else {
        shell::quote(host)
    }
}

/// Quotes `value` unless it names one of `env_names` of a containerized
/// database, in which case the variable of the container is referenced.
fn credential(db: &DatabaseTarget, value: &str, env_names: &[&str]) -> String {
    if db.is_docker() && env_names.contains(&value) {
        shell::env_reference(value)
    } else {
        shell::quote(value)
    }
}
