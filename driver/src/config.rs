use std::path::Path;

use cnc_motion::MachineConfig;
use serde::Deserialize;
use thiserror::Error;

/// Settings file of the host driver.
///
/// ```toml
/// [machine]
/// steps_per_unit = 1280.0
/// acceleration = 100.0
///
/// [transport]
/// port = "/dev/ttyUSB0"
/// baud = 115200
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub machine: MachineConfig,
    pub transport: TransportConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub port: String,
    pub baud: u32,
    pub response_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
            response_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid machine config: {0}")]
    Invalid(#[from] cnc_motion::ConfigError),
}

impl DriverConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = toml::from_str(text)?;
        config.machine.validate()?;
        Ok(config)
    }
}

/// Loads the config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DriverConfig, ConfigError> {
    match path {
        Some(path) => DriverConfig::from_toml(&std::fs::read_to_string(path)?),
        None => Ok(DriverConfig::default()),
    }
}
