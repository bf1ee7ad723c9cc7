//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. Config file (TOML)
//! 2. Environment variables (`TALLY_` prefix, `__` separates nested keys,
//!    e.g. `TALLY_CACHE__MAX_SCORE`)
//! 3. Defaults

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tally_net_servers::{ServerCacheConfig, StaticServerList};

/// Default snapshot location, relative to the working directory.
const DEFAULT_CACHE_PATH: &str = "servers.json";

/// Complete CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TallyConfig {
    /// Where the reputation snapshot lives.
    pub(crate) cache_path: PathBuf,

    /// Authoritative server list.
    pub(crate) servers: Vec<String>,

    /// Scoring and selection tunables.
    pub(crate) cache: ServerCacheConfig,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            servers: Vec::new(),
            cache: ServerCacheConfig::default(),
        }
    }
}

impl TallyConfig {
    /// Load configuration from defaults, environment, and config file.
    pub(crate) fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(TallyConfig::default()))
            .merge(Env::prefixed("TALLY_").ignore(&["config"]).split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                eyre::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.extract().wrap_err("Failed to load configuration")?;
        config.cache.validate().wrap_err("Invalid cache configuration")?;
        Ok(config)
    }

    pub(crate) fn server_list(&self) -> StaticServerList {
        StaticServerList::new(self.servers.iter().cloned())
    }
}
