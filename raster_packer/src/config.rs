use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_POOL_DEPTH: usize = 2;
pub const MAX_POOL_DEPTH: usize = 16;
/// Delay before a device session released by one packer may be opened by another.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_DEVICE_PORT: u16 = 9100;

/// Runtime settings of job packers created by a [`Device`](crate::device::Device).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Size of the transmission buffers requested from the memory handler.
    pub buffer_size: usize,
    /// Buffers owned by a transmission agent.
    pub pool_depth: usize,
    pub cooldown_secs: u64,
    pub connect_timeout_ms: u64,
    /// Write timeout of the device connection, `None` to block until the device drains.
    pub transport_timeout_ms: Option<u64>,
    /// Port used when the device address carries none.
    pub device_port: u16,
}

impl Default for PackerConfig {
    fn default() -> Self {
        PackerConfig {
            buffer_size: DEFAULT_BUFFER_SIZE,
            pool_depth: DEFAULT_POOL_DEPTH,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            connect_timeout_ms: 5000,
            transport_timeout_ms: Some(30_000),
            device_port: DEFAULT_DEVICE_PORT,
        }
    }
}

impl PackerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must not be zero".to_string()));
        }
        if !(1..=MAX_POOL_DEPTH).contains(&self.pool_depth) {
            return Err(ConfigError::Invalid(format!(
                "pool_depth must be between 1 and {}",
                MAX_POOL_DEPTH
            )));
        }
        if self.connect_timeout_ms == 0 || self.transport_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("timeouts must not be zero".to_string()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn transport_timeout(&self) -> Option<Duration> {
        self.transport_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config = PackerConfig::from_json(r#"{"buffer_size": 4096, "cooldown_secs": 2}"#)
            .unwrap();
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.cooldown(), Duration::from_secs(2));
        assert_eq!(config.pool_depth, DEFAULT_POOL_DEPTH);
        assert_eq!(config.transport_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            PackerConfig::from_json(r#"{"buffer_size": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PackerConfig::from_json(r#"{"pool_depth": 17}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PackerConfig::from_json(r#"{"transport_timeout_ms": null}"#),
            Ok(PackerConfig {
                transport_timeout_ms: None,
                ..
            })
        ));
    }
}
