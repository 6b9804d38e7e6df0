//! Configuration file of a backup run.
//!
//! Target definitions are kept as raw tables here and validated by
//! [`Targets::from_sources`](crate::target::Targets::from_sources).

use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

use crate::archive::Compression;
use crate::target::TargetClass;

const DEFAULT_TARGET_DIRECTORY: &str = "/var/backups/mbackup";

/// Everything read from the configuration file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Configuration {
    /// Compression used for archives and dumps.
    #[serde(default)]
    pub compression: Compression,

    /// Number of targets backed up at the same time.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Root of all backups.
    pub target: TargetRoot,

    /// Raw target definitions.
    #[serde(default)]
    pub sources: Sources,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            jobs: default_jobs(),
            target: TargetRoot {
                directory: PathBuf::from(DEFAULT_TARGET_DIRECTORY),
            },
            sources: Sources::default(),
        }
    }
}

fn default_jobs() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TargetRoot {
    /// Every target path is resolved relative to this directory.
    pub directory: PathBuf,
}

/// Raw target definitions per [TargetClass], in configuration order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sources {
    #[serde(default)]
    pub directories: Vec<toml::Table>,
    #[serde(default)]
    pub databases: Vec<toml::Table>,
    #[serde(default)]
    pub servers: Vec<toml::Table>,
}

impl Sources {
    pub fn of(&self, class: TargetClass) -> &[toml::Table] {
        match class {
            TargetClass::Directory => &self.directories,
            TargetClass::Database => &self.databases,
            TargetClass::Server => &self.servers,
        }
    }
}

/// Malformed or missing configuration. Fatal for the whole run.
#[derive(Debug, Display, Error)]
pub enum ConfigurationError {
    /// The configuration file can't be read.
    #[display("Reading the configuration {} failed: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// The configuration file is no valid TOML or misses required keys.
    #[display("Parsing the configuration {} failed: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A target definition doesn't match its schema.
    #[display("{class} #{index}: {source}")]
    Invalid {
        class: TargetClass,
        index: usize,
        source: toml::de::Error,
    },
    /// A target has no name.
    #[display("{class} #{index}: the name must not be empty")]
    EmptyName { class: TargetClass, index: usize },
    /// A field required by the target's settings is missing.
    #[display("{class} \"{name}\": `{field}` is required")]
    MissingField {
        class: TargetClass,
        name: String,
        field: &'static str,
    },
    /// Two targets of the same class share a name.
    #[display("{class} \"{name}\" is configured more than once")]
    DuplicateName { class: TargetClass, name: String },
}

impl Configuration {
    /// Reads the configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_owned(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigurationError::Parse {
            path: path.to_owned(),
            source,
        })?;
        log::info!(target: "config", "Configuration loaded from {}", path.display());

        Ok(config)
    }

    /// Like [load](Self::load), but writes and uses the default configuration
    /// if `path` doesn't exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigurationError> {
        match Self::load(path) {
            Err(ConfigurationError::Read { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                log::debug!(
                    target: "config",
                    "Writing default config to {} because it doesn't exist yet",
                    path.display()
                );
                let default_config = Self::default();
                let config_str = toml::to_string_pretty(&default_config)
                    .expect("default config should be serializable");
                if let Err(e) = std::fs::write(path, config_str) {
                    log::warn!(
                        target: "config",
                        "Writing default config to {} failed {e}",
                        path.display(),
                    );
                }

                Ok(default_config)
            }
            other => other,
        }
    }
}
