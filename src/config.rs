use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{PubflowError, Result};

/// Default Dropbox endpoint used to check that a credential record is usable.
pub const DEFAULT_REACHABILITY_ENDPOINT: &str = "https://api.dropboxapi.com/2/users/get_current_account";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// store config
    pub store: StoreConfig,
    /// upper bound for a single persistence load/save, in milliseconds, defaults to 5000
    pub persist_timeout_ms: u64,
    /// credential reachability check config
    pub reachability: ReachabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// store type
    pub store_type: StoreType,
    /// file store config
    pub file: Option<FileConfig>,
    /// postgres config
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    /// directory holding one json document per store key
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// postgres database url
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    /// endpoint probed with the credential's access token
    pub endpoint: String,
    /// upper bound for one check, in milliseconds, defaults to 10000
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            persist_timeout_ms: 5000,
            reachability: ReachabilityConfig::default(),
        }
    }
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REACHABILITY_ENDPOINT.to_string(),
            timeout_ms: 10000,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|err| PubflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), err)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn reachability_timeout(&self) -> Duration {
        Duration::from_millis(self.reachability.timeout_ms)
    }
}
