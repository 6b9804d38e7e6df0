//! Schema-wise dumps of MySQL and MariaDB servers.

use std::path::Path;

use super::{credential, host_value, in_container, shell, DatabaseBackend, DumpFile, DumpUnit};
use crate::target::{BackupTarget, DatabaseTarget};

/// Schemata of the server itself, never dumped.
pub const EXCLUDED_SCHEMATA: [&str; 4] = ["information_schema", "mysql", "performance_schema", "sys"];

const DEFAULT_USER: &str = "root";

/// Users that are environment variables of the official container images.
const ENV_USERS: &[&str] = &["MYSQL_USER", "MARIADB_USER"];
/// Passwords that are environment variables of the official container images.
const ENV_PASSWORDS: &[&str] = &[
    "MYSQL_ROOT_PASSWORD",
    "MYSQL_PASSWORD",
    "MARIADB_ROOT_PASSWORD",
    "MARIADB_PASSWORD",
];
/// Containers started with these variables have no password at all.
const EMPTY_PASSWORD: &[&str] = &["MYSQL_ALLOW_EMPTY_PASSWORD", "MARIADB_ALLOW_EMPTY_ROOT_PASSWORD"];

/// [DatabaseBackend] for MySQL compatible servers.
///
/// The schemata are listed first, then every schema is dumped on its own.
#[derive(Debug, Clone, Copy)]
pub struct MySql {
    client: &'static str,
    dump: &'static str,
}

impl MySql {
    pub const MYSQL: Self = Self {
        client: "mysql",
        dump: "mysqldump",
    };

    pub const MARIADB: Self = Self {
        client: "mariadb",
        dump: "mariadb-dump",
    };

    /// Query returning all user schemata as one comma separated line.
    pub fn schemata_query() -> String {
        let excluded = EXCLUDED_SCHEMATA
            .iter()
            .map(|schema| format!("'{schema}'"))
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "SELECT GROUP_CONCAT(schema_name) FROM information_schema.schemata WHERE schema_name NOT IN ({excluded})"
        )
    }

    /// Host, user and password flags.
    fn connection_args(db: &DatabaseTarget) -> Vec<String> {
        let mut args = Vec::new();

        if !db.is_docker() {
            args.push(format!("-h{}", host_value(db.host())));
        }

        let user = db.user().unwrap_or(DEFAULT_USER);
        args.push(format!("-u{}", credential(db, user, ENV_USERS)));

        let password = db.password();
        let no_password = password.is_empty() || (db.is_docker() && EMPTY_PASSWORD.contains(&password));
        if !no_password {
            args.push(format!("-p{}", credential(db, password, ENV_PASSWORDS)));
        }

        args
    }
}

impl DatabaseBackend for MySql {
    fn enumerate_command(&self, db: &DatabaseTarget) -> Option<String> {
        let mut args = vec![self.client.to_owned()];
        args.extend(Self::connection_args(db));
        args.push("--skip-column-names".to_owned());
        args.push("-e".to_owned());
        args.push(shell::quote(&format!("{};", Self::schemata_query())));

        Some(in_container(db, &args.join(" ")))
    }

    fn parse_units(&self, output: &[String]) -> Vec<DumpUnit> {
        let Some(line) = output.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty()) else {
            return Vec::new();
        };
        if line.eq_ignore_ascii_case("NULL") {
            return Vec::new();
        }

        line.split(',')
            .map(str::trim)
            .filter(|schema| !schema.is_empty())
            .map(|schema| DumpUnit::Schema(schema.to_owned()))
            .collect()
    }

    fn dump_file(&self, db: &DatabaseTarget, unit: &DumpUnit) -> DumpFile {
        let name = db.common().sanitized_name();
        let file_name = match unit {
            DumpUnit::Whole => format!("{name}.sql"),
            DumpUnit::Schema(schema) => format!("{name}_{schema}.sql"),
        };

        DumpFile {
            file_name,
            compressed: false,
        }
    }

    fn dump_command(&self, db: &DatabaseTarget, unit: &DumpUnit, file: &Path) -> String {
        let mut args = vec![self.dump.to_owned()];
        args.extend(Self::connection_args(db));
        args.push("--single-transaction".to_owned());
        match unit {
            DumpUnit::Whole => args.push("--all-databases".to_owned()),
            DumpUnit::Schema(schema) => args.push(shell::quote(schema)),
        }

        shell::redirect(&in_container(db, &args.join(" ")), file)
    }
}
