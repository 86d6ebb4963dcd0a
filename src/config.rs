use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_NAME, DEFAULT_LOG_FILE, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_BLOCKCHAIN_AGE_SECS,
};
use crate::models::{ClientAccount, Endpoints};
use crate::network::PollerSettings;

const CONFIG_FILE: &str = "config.yaml";

/// User configuration, read from `~/.chainwatch/config.yaml`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    pub client_account: Option<ClientAccount>,
    pub use_market_cache: bool,
    pub max_blockchain_age_secs: i64,
    pub request_timeout_secs: u64,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoints: Endpoints::default(),
            client_account: None,
            use_market_cache: false,
            max_blockchain_age_secs: MAX_BLOCKCHAIN_AGE_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_file: String::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Directory holding the config file
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!(".{}", APP_NAME))
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.select().is_none() {
            bail!("no daemon endpoint configured: set endpoints.local or endpoints.hosted");
        }
        if self.max_blockchain_age_secs <= 0 {
            bail!("max_blockchain_age_secs must be positive");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            endpoints: self.endpoints.clone(),
            client_account: self.client_account.clone(),
            use_market_cache: self.use_market_cache,
            max_blockchain_age_secs: self.max_blockchain_age_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.endpoints.select(), Some("http://localhost:8545"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            client_account: Some(ClientAccount {
                address: "0xabc".into(),
                private_key: "00ff".into(),
                handle: Some("bob".into()),
            }),
            use_market_cache: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "use_market_cache: true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.use_market_cache);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.max_blockchain_age_secs, MAX_BLOCKCHAIN_AGE_SECS);
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_hosted_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "endpoints:\n  local: null\n  hosted:\n    - https://node.example\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoints.local, None);
        assert_eq!(config.endpoints.select(), Some("https://node.example"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "request_timeout_secs: 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_no_endpoint_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "endpoints:\n  local: null\n  hosted: []\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
