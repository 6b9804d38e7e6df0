//! Compression of directories and dump files with `tar`, `gzip` and `bzip2`.

use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

use crate::backends::shell::quote;
use crate::exec::{Executor, ToolError};

/// Compression method used for every archive of a run.
///
/// The compressor and the file suffix are always chosen together.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Display, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    #[display("gzip")]
    Gzip,
    #[display("bzip2")]
    Bzip2,
}

impl Compression {
    /// Suffix of compressed files, without the leading dot.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
        }
    }

    /// Flag selecting the compressor in `tar`.
    fn tar_flag(self) -> char {
        match self {
            Self::Gzip => 'z',
            Self::Bzip2 => 'j',
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }
}

/// Creating an archive or compressing a file failed.
#[derive(Debug, Display, Error)]
#[display("Failed to create archive {}. {reason}", archive.display())]
pub struct ArchiveError {
    pub archive: PathBuf,
    pub reason: &'static str,
    pub source: ToolError,
}

fn tar_failure_reason(code: Option<i32>) -> &'static str {
    match code {
        Some(1) => "Some files changed while archiving.",
        Some(2) => "A fatal, unrecoverable error occurred.",
        _ => "Unknown error occurred.",
    }
}

/// Runs the compression tools through an [Executor].
pub struct Archiver<'a> {
    executor: &'a dyn Executor,
    compression: Compression,
}

impl<'a> Archiver<'a> {
    pub fn new(executor: &'a dyn Executor, compression: Compression) -> Self {
        Self {
            executor,
            compression,
        }
    }

    pub fn archive_command(&self, source: &str, archive: &Path) -> String {
        format!(
            "tar -c{}f {} {}",
            self.compression.tar_flag(),
            quote(&archive.to_string_lossy()),
            quote(source)
        )
    }

    /// Archives the directory `source` into `archive`.
    pub fn create_archive(&self, source: &str, archive: &Path) -> Result<(), ArchiveError> {
        self.executor
            .execute(&self.archive_command(source, archive))
            .map_err(|e| ArchiveError {
                archive: archive.to_owned(),
                reason: tar_failure_reason(e.code()),
                source: e,
            })?;
        log::info!(target: "archive", "Archive {} created", archive.display());

        Ok(())
    }

    pub fn compress_command(&self, file: &Path) -> String {
        format!(
            "{} -f {}",
            self.compression.program(),
            quote(&file.to_string_lossy())
        )
    }

    /// Compresses `file` in place and returns the path of the compressed file.
    ///
    /// On failure the uncompressed file is left untouched.
    pub fn compress_file(&self, file: &Path) -> Result<PathBuf, ArchiveError> {
        let mut compressed = file.as_os_str().to_owned();
        compressed.push(".");
        compressed.push(self.compression.suffix());
        let compressed = PathBuf::from(compressed);

        self.executor
            .execute(&self.compress_command(file))
            .map_err(|source| ArchiveError {
                archive: compressed.clone(),
                reason: "Compression failed.",
                source,
            })?;
        log::info!(target: "archive", "Archive {} created", compressed.display());

        Ok(compressed)
    }
}
