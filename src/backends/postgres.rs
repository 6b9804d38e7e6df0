//! Dumps of a whole PostgreSQL cluster.

use std::path::Path;

use super::{credential, host_value, in_container, shell, DatabaseBackend, DumpFile, DumpUnit};
use crate::target::{BackupTarget, DatabaseTarget};

const DEFAULT_USER: &str = "postgres";
const ENV_USERS: &[&str] = &["POSTGRES_USER"];
const ENV_PASSWORDS: &[&str] = &["POSTGRES_PASSWORD"];

/// [DatabaseBackend] using `pg_dumpall`.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl DatabaseBackend for Postgres {
    fn dump_file(&self, db: &DatabaseTarget, _unit: &DumpUnit) -> DumpFile {
        DumpFile {
            file_name: format!("{}.sql", db.common().sanitized_name()),
            compressed: false,
        }
    }

    fn dump_command(&self, db: &DatabaseTarget, _unit: &DumpUnit, file: &Path) -> String {
        let mut args = Vec::new();

        let password = db.password();
        if !password.is_empty() {
            args.push(format!("PGPASSWORD={}", credential(db, password, ENV_PASSWORDS)));
        }

        args.push("pg_dumpall".to_owned());
        if !db.is_docker() {
            args.push("-h".to_owned());
            args.push(host_value(db.host()));
        }

        let user = db.user().unwrap_or(DEFAULT_USER);
        args.push("-U".to_owned());
        args.push(credential(db, user, ENV_USERS));

        shell::redirect(&in_container(db, &args.join(" ")), file)
    }
}
