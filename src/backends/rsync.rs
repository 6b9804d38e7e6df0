//! Transfer of a remote directory with `rsync` over SSH.

use std::path::Path;

use super::shell::{quote, with_trailing_separator};
use crate::target::{BackupTarget, ServerTarget};

/// Command pulling the source of `server` into `destination`.
///
/// - `rsync -r -t`: recursive, keeps modification times.
/// - `ssh -q`: quiet, connects to the configured port with the configured
///   identity file and doesn't check the host key.
///
/// Source and destination both end with `/`, so the content of the source is
/// copied, not the directory itself.
pub fn transfer_command(server: &ServerTarget, destination: &Path) -> String {
    let ssh = server.ssh();
    let ssh_command = format!(
        "ssh -q -o StrictHostKeyChecking=no -p {} -i {}",
        ssh.port(),
        quote(&ssh.private_key().to_string_lossy())
    );
    let remote = format!(
        "{}@{}:{}",
        ssh.user(),
        server.host(),
        with_trailing_separator(&server.common().source)
    );
    let destination = with_trailing_separator(&destination.to_string_lossy());

    format!(
        "rsync -r -t -e {} {} {}",
        quote(&ssh_command),
        quote(&remote),
        quote(&destination)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(toml: &str) -> ServerTarget {
        ServerTarget::from_raw(0, &toml::from_str(toml).unwrap()).unwrap()
    }

    #[test]
    fn transfer_with_defaults() {
        let server = server(
            r#"
            name = "web"
            host = "web.example.com"
            source = "/srv/backup"
            ssh = { key = "/root/.ssh/id_ed25519" }
            "#,
        );

        assert_eq!(
            transfer_command(&server, Path::new("/backup/web")),
            "rsync -r -t -e 'ssh -q -o StrictHostKeyChecking=no -p 22 -i '\\''/root/.ssh/id_ed25519'\\''' \
             'root@web.example.com:/srv/backup/' '/backup/web/'"
        );
    }

    #[test]
    fn custom_port_and_user() {
        let server = server(
            r#"
            name = "web"
            host = "10.1.2.3"
            source = "/data/"
            ssh = { port = 2222, user = "backup", key = "/keys/web" }
            "#,
        );

        let cmd = transfer_command(&server, Path::new("/backup/web/"));
        assert!(cmd.contains("-p 2222"), "{cmd}");
        assert!(cmd.contains("'backup@10.1.2.3:/data/'"), "{cmd}");
        assert!(cmd.ends_with("'/backup/web/'"), "{cmd}");
        assert!(!cmd.contains("//"), "{cmd}");
    }
}
