use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use dao_core::{parse_units, Amount, DEFAULT_DECIMALS};

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to write file: {0}")]
    FileWriteError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable naming a YAML configuration file
pub const CONFIG_FILE_ENV: &str = "DAO_SIM_CONFIG_FILE";

/// Defaults applied to every DAO the simulator deploys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoDefaults {
    #[serde(default = "default_challenge_period")]
    pub challenge_period_seconds: u64,
    #[serde(default)]
    pub extend_challenge_period_seconds: u64,
    #[serde(default = "default_extension_window")]
    pub extension_window_seconds: u64,
    /// Native currency per vote, in whole units (e.g. "1" or "0.5")
    #[serde(default = "default_native_collateral")]
    pub native_collateral: String,
    /// Governance tokens per vote, in whole tokens
    #[serde(default = "default_token_collateral")]
    pub token_collateral: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
    /// NFTs per vote
    #[serde(default = "default_nft_token_collateral")]
    pub nft_token_collateral: u64,
}

fn default_challenge_period() -> u64 {
    15
}

fn default_extension_window() -> u64 {
    3_600
}

fn default_native_collateral() -> String {
    "1".to_string()
}

fn default_token_collateral() -> String {
    "100".to_string()
}

fn default_token_decimals() -> u32 {
    DEFAULT_DECIMALS
}

fn default_nft_token_collateral() -> u64 {
    1
}

impl Default for DaoDefaults {
    fn default() -> Self {
        Self {
            challenge_period_seconds: default_challenge_period(),
            extend_challenge_period_seconds: 0,
            extension_window_seconds: default_extension_window(),
            native_collateral: default_native_collateral(),
            token_collateral: default_token_collateral(),
            token_decimals: default_token_decimals(),
            nft_token_collateral: default_nft_token_collateral(),
        }
    }
}

impl DaoDefaults {
    /// Native collateral in wei
    pub fn native_collateral_amount(&self) -> Result<Amount> {
        positive_units("native_collateral", &self.native_collateral, DEFAULT_DECIMALS)
    }

    /// Token collateral in base units
    pub fn token_collateral_amount(&self) -> Result<Amount> {
        positive_units("token_collateral", &self.token_collateral, self.token_decimals)
    }
}

fn positive_units(field: &str, text: &str, decimals: u32) -> Result<Amount> {
    let amount = parse_units(text, decimals)
        .map_err(|e| ConfigError::InvalidValue(field.to_string(), e.to_string()))?;
    if amount == 0 {
        return Err(ConfigError::InvalidValue(field.to_string(), "must be positive".to_string()));
    }
    Ok(amount)
}

/// Main simulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Network name used in deployment file names
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory receiving deployment metadata
    #[serde(default = "default_deployments_dir")]
    pub deployments_dir: String,
    #[serde(default)]
    pub dao: DaoDefaults,
}

fn default_network() -> String {
    "localhost".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_deployments_dir() -> String {
    "deployments".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            log_level: default_log_level(),
            deployments_dir: default_deployments_dir(),
            dao: DaoDefaults::default(),
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from the environment.
    ///
    /// A file named by `DAO_SIM_CONFIG_FILE` is read first when it exists;
    /// `DAO_SIM_*` variables then override individual fields.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_FILE_ENV) {
            Ok(path) if Path::new(&path).exists() => Self::from_file(&path)?,
            Ok(path) => return Err(ConfigError::FileNotFound(path)),
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: SimulatorConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as YAML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_yaml()?)
            .map_err(|e| ConfigError::FileWriteError(format!("Failed to write {}: {}", path.display(), e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply `DAO_SIM_*` overrides looked up through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(network) = lookup("DAO_SIM_NETWORK") {
            self.network = network;
        }
        if let Some(level) = lookup("DAO_SIM_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(dir) = lookup("DAO_SIM_DEPLOYMENTS_DIR") {
            self.deployments_dir = dir;
        }
        if let Some(value) = lookup("DAO_SIM_CHALLENGE_PERIOD") {
            self.dao.challenge_period_seconds = parse_env("DAO_SIM_CHALLENGE_PERIOD", &value)?;
        }
        if let Some(value) = lookup("DAO_SIM_EXTEND_CHALLENGE_PERIOD") {
            self.dao.extend_challenge_period_seconds = parse_env("DAO_SIM_EXTEND_CHALLENGE_PERIOD", &value)?;
        }
        if let Some(value) = lookup("DAO_SIM_EXTENSION_WINDOW") {
            self.dao.extension_window_seconds = parse_env("DAO_SIM_EXTENSION_WINDOW", &value)?;
        }
        if let Some(value) = lookup("DAO_SIM_NATIVE_COLLATERAL") {
            self.dao.native_collateral = value;
        }
        if let Some(value) = lookup("DAO_SIM_TOKEN_COLLATERAL") {
            self.dao.token_collateral = value;
        }
        Ok(())
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.dao.challenge_period_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "challenge_period_seconds".to_string(),
                "must be positive".to_string(),
            ));
        }
        if self.dao.nft_token_collateral == 0 {
            return Err(ConfigError::InvalidValue(
                "nft_token_collateral".to_string(),
                "must be positive".to_string(),
            ));
        }
        self.dao.native_collateral_amount()?;
        self.dao.token_collateral_amount()?;
        Ok(())
    }
}

fn parse_env(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use dao_core::ether;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.network, "localhost");
        assert_eq!(config.dao.challenge_period_seconds, 15);
        assert_eq!(config.dao.extension_window_seconds, 3_600);
        assert_eq!(config.dao.native_collateral_amount().unwrap(), ether(1));
        assert_eq!(config.dao.token_collateral_amount().unwrap(), ether(100));
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network: sepolia\ndao:\n  challenge_period_seconds: 86400\n  native_collateral: \"0.5\"").unwrap();

        let config = SimulatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.network, "sepolia");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.dao.challenge_period_seconds, 86_400);
        assert_eq!(config.dao.native_collateral_amount().unwrap(), ether(1) / 2);
        assert_eq!(config.dao.token_collateral, "100");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = SimulatorConfig::default();
        config.dao.extend_challenge_period_seconds = 1_000;
        config.save(&path).unwrap();
        assert_eq!(SimulatorConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SimulatorConfig::from_file("/nonexistent/dao-sim.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DAO_SIM_NETWORK", "hardhat"),
            ("DAO_SIM_CHALLENGE_PERIOD", "60"),
            ("DAO_SIM_TOKEN_COLLATERAL", "50"),
        ]
        .into_iter()
        .collect();
        let mut config = SimulatorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.network, "hardhat");
        assert_eq!(config.dao.challenge_period_seconds, 60);
        assert_eq!(config.dao.token_collateral_amount().unwrap(), ether(50));
    }

    #[test]
    fn test_invalid_override() {
        let mut config = SimulatorConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "DAO_SIM_CHALLENGE_PERIOD").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_zero_collateral_rejected() {
        let mut config = SimulatorConfig::default();
        config.dao.native_collateral = "0".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_, _))));
    }
}
