use super::{BackupError, Orchestrator};
use crate::backends::rsync;
use crate::exec::{disk_usage, Stopwatch};
use crate::report::{Outcome, Status};
use crate::target::{BackupTarget, ServerTarget, TargetClass};

impl Orchestrator<'_> {
    /// Downloads the source directory of a remote server with `rsync`.
    pub(super) fn backup_server(&self, server: &ServerTarget) -> Result<Vec<Outcome>, BackupError> {
        let stopwatch = Stopwatch::start(self.clock);
        let destination = self.prepare(server)?;

        if !server.ssh().passphrase().is_empty() {
            log::warn!(
                target: "backup::server",
                "Passphrase of {} is ignored, ssh runs non-interactively",
                server.ssh().private_key().display()
            );
        }

        self.executor
            .execute(&rsync::transfer_command(server, &destination))
            .map_err(|source| BackupError::Transfer {
                name: server.name().to_owned(),
                source,
            })?;
        let duration = stopwatch.elapsed();
        log::info!(target: "backup::server", "Downloaded {}:{} to {}", server.host(), server.common().source, destination.display());

        Ok(vec![Outcome::new(
            Status::Ok,
            TargetClass::Server,
            server.name(),
            "Files downloaded.",
        )
        .with_duration(duration)
        .with_size(disk_usage(self.executor, &destination))])
    }
}
