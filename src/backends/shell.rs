//! Helpers to assemble shell command lines.
//!
//! Every interpolated value has to pass [quote]. Only references to
//! environment variables of a container ([env_reference]) are emitted as is.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Value of a password flag: quoted parts, escaped quotes and bare characters
/// up to the next whitespace.
static SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s-p|PGPASSWORD=|--password=)(?:'\\''|'[^']*'|\\'|[^\s'])+"#)
        .expect("secret pattern should be valid")
});

/// Quotes `value` as a single shell word.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Reference to the environment variable `name`, resolved by the shell that
/// runs the command.
pub fn env_reference(name: &str) -> String {
    format!("${name}")
}

/// Runs `command` with `sh -c` inside of `container`.
///
/// The inner command is quoted as a whole, so variable references are only
/// expanded by the shell of the container.
pub fn docker_exec(container: &str, command: &str) -> String {
    format!("docker exec {} sh -c {}", quote(container), quote(command))
}

/// Redirects the standard output of `command` into `file`.
pub fn redirect(command: &str, file: &Path) -> String {
    format!("{command} > {}", quote(&file.to_string_lossy()))
}

/// Appends a single trailing `/` unless already present.
pub fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}

/// Masks the values of password flags in `command`.
///
/// Commands end up in error messages, reports and logs. Only the shell gets
/// to see the passwords.
pub fn redact(command: &str) -> Cow<'_, str> {
    SECRET.replace_all(command, "${1}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_plain_and_single_quotes() {
        assert_eq!(quote("secret"), "'secret'");
        assert_eq!(quote("it's"), "'it'\\''s'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("$HOME `id`"), "'$HOME `id`'");
    }

    #[test]
    fn quoted_values_survive_the_shell() {
        for value in ["it's", "a b", "$HOME", "\"x\"", "back\\slash"] {
            let out = std::process::Command::new("sh")
                .arg("-c")
                .arg(format!("printf %s {}", quote(value)))
                .output()
                .unwrap();
            assert_eq!(String::from_utf8_lossy(&out.stdout), value);
        }
    }

    #[test]
    fn docker_exec_quotes_inner_command() {
        assert_eq!(
            docker_exec("db", "mysql -u$MYSQL_USER"),
            "docker exec 'db' sh -c 'mysql -u$MYSQL_USER'"
        );
    }

    #[test]
    fn redirect_quotes_file() {
        assert_eq!(
            redirect("pg_dumpall", Path::new("/backup/my db.sql")),
            "pg_dumpall > '/backup/my db.sql'"
        );
    }

    #[test]
    fn trailing_separator_is_added_once() {
        assert_eq!(with_trailing_separator("/srv"), "/srv/");
        assert_eq!(with_trailing_separator("/srv/"), "/srv/");
    }

    #[test]
    fn redact_password_flags() {
        assert_eq!(
            redact("mysqldump -hlocalhost -u'backup' -p'TopSecret42' --single-transaction 'shop'"),
            "mysqldump -hlocalhost -u'backup' -p*** --single-transaction 'shop'"
        );
        assert_eq!(
            redact("mysql -u'root' -p'it'\\''s $ecret' -e 'SELECT 1;'"),
            "mysql -u'root' -p*** -e 'SELECT 1;'"
        );
        assert_eq!(
            redact("PGPASSWORD='pw' pg_dumpall -h localhost -U 'postgres'"),
            "PGPASSWORD=*** pg_dumpall -h localhost -U 'postgres'"
        );
        assert_eq!(
            redact("mongodump --host=localhost --password='pw' --gzip --archive"),
            "mongodump --host=localhost --password=*** --gzip --archive"
        );
    }

    #[test]
    fn redact_inside_docker_exec() {
        let command = docker_exec("db", &format!("mongodump --password={} --gzip", quote("pw")));
        assert_eq!(
            redact(&command),
            "docker exec 'db' sh -c 'mongodump --password=*** --gzip'"
        );

        assert_eq!(
            redact("docker exec 'db' sh -c 'mysqldump -u$MYSQL_USER -p$MYSQL_PASSWORD x'"),
            "docker exec 'db' sh -c 'mysqldump -u$MYSQL_USER -p*** x'"
        );
    }

    #[test]
    fn redact_leaves_other_commands() {
        for command in [
            "rsync -r -t -e 'ssh -q -p 22 -i '\\''/key'\\''' 'root@web:/srv/' '/backup/'",
            "tar -czf '/backup/logs.tar.gz' '/var/log/app'",
            "du -sb '/backup'",
        ] {
            assert_eq!(redact(command), command);
        }
    }
}
