use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{deserialize_flag, parse_raw, require_name, BackupTarget, Common, TargetClass};
use crate::config::ConfigurationError;

const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_SSH_USER: &str = "root";

/// How to reach a [ServerTarget] over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSettings {
    port: u16,
    user: String,
    private_key: PathBuf,
    passphrase: String,
}

impl SshSettings {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Identity file passed to `ssh -i`.
    pub fn private_key(&self) -> &Path {
        &self.private_key
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

/// A remote server whose source directory is pulled with `rsync` over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    common: Common,
    host: String,
    ssh: SshSettings,
}

#[derive(Deserialize)]
struct RawServer {
    name: String,
    source: String,
    host: String,
    ssh: RawSsh,
    #[serde(default)]
    target: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    disabled: bool,
}

#[derive(Deserialize)]
struct RawSsh {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_user")]
    user: String,
    key: PathBuf,
    #[serde(default)]
    passphrase: String,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_user() -> String {
    DEFAULT_SSH_USER.to_owned()
}

impl ServerTarget {
    pub fn from_raw(index: usize, raw: &toml::Table) -> Result<Self, ConfigurationError> {
        let RawServer {
            name,
            source,
            host,
            ssh,
            target,
            disabled,
        } = parse_raw(TargetClass::Server, index, raw)?;
        let name = require_name(TargetClass::Server, index, name)?;

        let missing = if host.trim().is_empty() {
            Some("host")
        } else if source.trim().is_empty() {
            Some("source")
        } else if ssh.key.as_os_str().is_empty() {
            Some("ssh.key")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(ConfigurationError::MissingField {
                class: TargetClass::Server,
                name,
                field,
            });
        }

        Ok(Self {
            common: Common {
                name,
                source,
                target,
                disabled,
            },
            host,
            ssh: SshSettings {
                port: ssh.port,
                user: ssh.user,
                private_key: ssh.key,
                passphrase: ssh.passphrase,
            },
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ssh(&self) -> &SshSettings {
        &self.ssh
    }
}

impl BackupTarget for ServerTarget {
    const CLASS: TargetClass = TargetClass::Server;

    fn common(&self) -> &Common {
        &self.common
    }
}
