//! Compressed archives of MongoDB servers.

use std::path::Path;

use super::{host_value, in_container, shell, DatabaseBackend, DumpFile, DumpUnit};
use crate::target::{BackupTarget, DatabaseTarget};

/// [DatabaseBackend] using `mongodump --gzip --archive`.
///
/// Credentials are always quoted, there is no pass through of container
/// environment variables.
#[derive(Debug, Clone, Copy)]
pub struct MongoDb;

impl DatabaseBackend for MongoDb {
    fn dump_file(&self, db: &DatabaseTarget, _unit: &DumpUnit) -> DumpFile {
        DumpFile {
            file_name: format!("{}.mongo.gz", db.common().sanitized_name()),
            compressed: true,
        }
    }

    fn dump_command(&self, db: &DatabaseTarget, _unit: &DumpUnit, file: &Path) -> String {
        let mut args = vec!["mongodump".to_owned()];

        if !db.is_docker() {
            args.push(format!("--host={}", host_value(db.host())));
        }
        if let Some(user) = db.user() {
            args.push(format!("--username={}", shell::quote(user)));
        }
        if !db.password().is_empty() {
            args.push(format!("--password={}", shell::quote(db.password())));
        }
        // without a file name the archive is written to stdout
        args.push("--gzip".to_owned());
        args.push("--archive".to_owned());

        shell::redirect(&in_container(db, &args.join(" ")), file)
    }
}
