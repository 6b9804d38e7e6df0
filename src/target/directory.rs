use serde::Deserialize;

use super::{deserialize_flag, parse_raw, require_name, BackupTarget, Common, TargetClass};
use crate::archive::Compression;
use crate::config::ConfigurationError;

/// A local directory that is archived with `tar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTarget {
    common: Common,
    command_before: Option<String>,
    command_after: Option<String>,
}

#[derive(Deserialize)]
struct RawDirectory {
    name: String,
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    disabled: bool,
    #[serde(default)]
    commands: RawCommands,
}

#[derive(Deserialize, Default)]
struct RawCommands {
    before: Option<String>,
    after: Option<String>,
}

impl DirectoryTarget {
    pub fn from_raw(index: usize, raw: &toml::Table) -> Result<Self, ConfigurationError> {
        let RawDirectory {
            name,
            source,
            target,
            disabled,
            commands,
        } = parse_raw(TargetClass::Directory, index, raw)?;
        let name = require_name(TargetClass::Directory, index, name)?;

        if source.trim().is_empty() {
            return Err(ConfigurationError::MissingField {
                class: TargetClass::Directory,
                name,
                field: "source",
            });
        }

        Ok(Self {
            common: Common {
                name,
                source,
                target,
                disabled,
            },
            command_before: commands.before.filter(|cmd| !cmd.trim().is_empty()),
            command_after: commands.after.filter(|cmd| !cmd.trim().is_empty()),
        })
    }

    /// Shell command run before the directory is archived.
    pub fn command_before(&self) -> Option<&str> {
        self.command_before.as_deref()
    }

    /// Shell command run after the directory is archived.
    pub fn command_after(&self) -> Option<&str> {
        self.command_after.as_deref()
    }

    /// File name of the archive, e.g. `logs.tar.gz`.
    pub fn archive_name(&self, compression: Compression) -> String {
        format!(
            "{}.tar.{}",
            self.common.sanitized_name(),
            compression.suffix()
        )
    }
}

impl BackupTarget for DirectoryTarget {
    const CLASS: TargetClass = TargetClass::Directory;

    fn common(&self) -> &Common {
        &self.common
    }
}
