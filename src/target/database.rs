use derive_more::Display;
use serde::Deserialize;

use super::{deserialize_flag, parse_raw, require_name, BackupTarget, Common, TargetClass};
use crate::config::ConfigurationError;

/// Host of databases running in [DeploymentMode::Host] if none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Database technology of a [DatabaseTarget].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    #[display("MySQL")]
    Mysql,
    #[display("MariaDB")]
    Mariadb,
    #[serde(alias = "postgresql")]
    #[display("PostgreSQL")]
    Postgres,
    #[display("MongoDB")]
    Mongodb,
}

/// Where the database server runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Reachable from the host, by default on [DEFAULT_HOST].
    #[default]
    #[display("host")]
    Host,
    /// Inside a container, dump tools are run with `docker exec`.
    #[display("docker")]
    Docker,
}

/// A database dumped with the tools of its [Engine].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    common: Common,
    engine: Engine,
    mode: DeploymentMode,
    container: Option<String>,
    host: String,
    user: Option<String>,
    password: String,
}

#[derive(Deserialize)]
struct RawDatabase {
    name: String,
    #[serde(default)]
    target: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    disabled: bool,
    #[serde(default)]
    engine: Engine,
    #[serde(default)]
    mode: DeploymentMode,
    container: Option<String>,
    host: Option<String>,
    user: Option<String>,
    #[serde(default)]
    password: String,
}

impl DatabaseTarget {
    pub fn from_raw(index: usize, raw: &toml::Table) -> Result<Self, ConfigurationError> {
        let RawDatabase {
            name,
            target,
            disabled,
            engine,
            mode,
            container,
            host,
            user,
            password,
        } = parse_raw(TargetClass::Database, index, raw)?;
        let name = require_name(TargetClass::Database, index, name)?;

        let container = container.filter(|c| !c.trim().is_empty());
        if mode == DeploymentMode::Docker && container.is_none() {
            return Err(ConfigurationError::MissingField {
                class: TargetClass::Database,
                name,
                field: "container",
            });
        }

        let host = host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        Ok(Self {
            common: Common {
                name,
                source: String::new(),
                target,
                disabled,
            },
            engine,
            mode,
            container,
            host,
            user: user.filter(|u| !u.is_empty()),
            password,
        })
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn is_docker(&self) -> bool {
        self.mode == DeploymentMode::Docker
    }

    /// Name of the container, always present in [DeploymentMode::Docker].
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Configured user, every engine has its own default.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl BackupTarget for DatabaseTarget {
    const CLASS: TargetClass = TargetClass::Database;

    fn common(&self) -> &Common {
        &self.common
    }
}
