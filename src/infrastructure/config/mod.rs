//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::errors::ConfigError;

/// Host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub host: HostConfig,
    pub addons: AddonsConfig,
    pub database: DatabaseConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostConfig {
    pub name: String,
    /// Prefix recognized by the console adapter for command input
    pub prefix: String,
    pub verbose: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddonsConfig {
    pub directory: PathBuf,
    pub load_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig {
                name: "addon-host".to_string(),
                prefix: "/".to_string(),
                verbose: false,
            },
            addons: AddonsConfig {
                directory: PathBuf::from("./addons"),
                load_timeout_secs: 30,
            },
            database: DatabaseConfig {
                path: PathBuf::from("addon-host.db"),
            },
            adapters: AdaptersConfig {
                console: Some(ConsoleConfig { enabled: true }),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Fallback configuration from environment variables
    pub fn load_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("ADDON_HOST_ADDONS_DIR") {
            config.addons.directory = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("ADDON_HOST_LOAD_TIMEOUT") {
            if let Ok(secs) = secs.parse() {
                config.addons.load_timeout_secs = secs;
            }
        }
        if let Ok(path) = std::env::var("ADDON_HOST_DB") {
            config.database.path = PathBuf::from(path);
        }
        if std::env::var("ADDON_HOST_VERBOSE").is_ok() {
            config.host.verbose = true;
        }
        config
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.host.name, "addon-host");
        assert_eq!(parsed.addons.load_timeout_secs, 30);
    }
}
