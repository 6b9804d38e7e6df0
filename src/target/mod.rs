//! Typed and validated backup targets.
//!
//! Targets are built from the raw tables of the [configuration](crate::config)
//! at the start of every run. A malformed table is rejected with a
//! [`ConfigurationError`] before anything is executed.

use std::collections::HashSet;
use std::sync::LazyLock;

use derive_more::Display;
use regex::Regex;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;

mod database;
mod directory;
mod server;

pub use database::{DatabaseTarget, DeploymentMode, Engine, DEFAULT_HOST};
pub use directory::DirectoryTarget;
pub use server::{ServerTarget, SshSettings};

use crate::config::{ConfigurationError, Sources};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("whitespace pattern should be valid"));
static UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("unsafe pattern should be valid"));

/// Turns a human readable name into a token usable as a file name.
///
/// Whitespace becomes `_`, every other character outside of `[a-zA-Z0-9_-]`
/// becomes `-`.
pub fn sanitize(name: &str) -> String {
    let name = WHITESPACE.replace_all(name, "_");
    UNSAFE.replace_all(&name, "-").into_owned()
}

/// The kind of a [Target].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetClass {
    /// A local directory archived with `tar`.
    #[display("directory")]
    Directory,
    /// A database dumped with the tools of its engine.
    #[display("database")]
    Database,
    /// A remote server synchronized with `rsync`.
    #[display("server")]
    Server,
}

impl TargetClass {
    /// All classes in the order they are backed up.
    pub const ALL: [TargetClass; 3] = [Self::Directory, Self::Database, Self::Server];
}

/// Fields shared by every [Target].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    /// Unique name within the class of the target.
    pub name: String,
    /// Path that is backed up. Empty for databases.
    pub source: String,
    /// Destination relative to the backup root.
    pub target: String,
    /// Disabled targets are reported but never executed.
    pub disabled: bool,
}

impl Common {
    /// [sanitize]d name of the target.
    pub fn sanitized_name(&self) -> String {
        sanitize(&self.name)
    }
}

/// Access to the [Common] fields of a concrete target type.
pub trait BackupTarget {
    /// Class of the implementing target type.
    const CLASS: TargetClass;

    fn common(&self) -> &Common;

    fn name(&self) -> &str {
        &self.common().name
    }

    fn is_disabled(&self) -> bool {
        self.common().disabled
    }
}

/// A single configured unit to backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Directory(DirectoryTarget),
    Database(DatabaseTarget),
    Server(ServerTarget),
}

impl Target {
    /// Parses the raw table at `index` of the target list of `class`.
    pub fn from_raw(
        class: TargetClass,
        index: usize,
        raw: &toml::Table,
    ) -> Result<Self, ConfigurationError> {
        let target = match class {
            TargetClass::Directory => Self::Directory(DirectoryTarget::from_raw(index, raw)?),
            TargetClass::Database => Self::Database(DatabaseTarget::from_raw(index, raw)?),
            TargetClass::Server => Self::Server(ServerTarget::from_raw(index, raw)?),
        };

        Ok(target)
    }

    pub fn class(&self) -> TargetClass {
        match self {
            Self::Directory(_) => TargetClass::Directory,
            Self::Database(_) => TargetClass::Database,
            Self::Server(_) => TargetClass::Server,
        }
    }

    pub fn common(&self) -> &Common {
        match self {
            Self::Directory(directory) => directory.common(),
            Self::Database(database) => database.common(),
            Self::Server(server) => server.common(),
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }
}

/// All targets of a run, grouped by class in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub directories: Vec<DirectoryTarget>,
    pub databases: Vec<DatabaseTarget>,
    pub servers: Vec<ServerTarget>,
}

impl Targets {
    /// Validates every raw target definition.
    ///
    /// The first invalid definition aborts with a [ConfigurationError].
    pub fn from_sources(sources: &Sources) -> Result<Self, ConfigurationError> {
        let mut targets = Self::default();

        for class in TargetClass::ALL {
            let mut names = HashSet::new();
            for (index, raw) in sources.of(class).iter().enumerate() {
                let target = Target::from_raw(class, index, raw)?;
                if !names.insert(target.name().to_owned()) {
                    return Err(ConfigurationError::DuplicateName {
                        class,
                        name: target.name().to_owned(),
                    });
                }
                targets.push(target);
            }
        }

        log::debug!(
            target: "config",
            "Loaded {} directories, {} databases and {} servers",
            targets.directories.len(),
            targets.databases.len(),
            targets.servers.len()
        );

        Ok(targets)
    }

    pub fn push(&mut self, target: Target) {
        match target {
            Target::Directory(directory) => self.directories.push(directory),
            Target::Database(database) => self.databases.push(database),
            Target::Server(server) => self.servers.push(server),
        }
    }
}

fn parse_raw<T: DeserializeOwned>(
    class: TargetClass,
    index: usize,
    raw: &toml::Table,
) -> Result<T, ConfigurationError> {
    toml::Value::Table(raw.clone())
        .try_into()
        .map_err(|source| ConfigurationError::Invalid {
            class,
            index: index + 1,
            source,
        })
}

fn require_name(class: TargetClass, index: usize, name: String) -> Result<String, ConfigurationError> {
    if name.trim().is_empty() {
        Err(ConfigurationError::EmptyName {
            class,
            index: index + 1,
        })
    } else {
        Ok(name)
    }
}

/// Accepts `true`/`false` as well as `"yes"`/`"no"`.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => Ok(flag),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" | "" => Ok(false),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &"a boolean or \"yes\"/\"no\"",
            )),
        },
    }
}
