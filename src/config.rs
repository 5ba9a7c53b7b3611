use crate::emulator::basics::{LOAD_OFFSET, MEMORY_SIZE, RESET_VECTOR, SCREEN_HEIGHT, SCREEN_WIDTH};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

/// Runtime settings of the emulator. Every field may be omitted from a
/// config file, in which case the built-in default is used.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub memory_size: usize,
    pub load_offset: usize,
    pub reset_pc: u32,
    pub tick_interval_ms: u64,
    pub refresh_interval_ms: u64,
    pub scale: u32,
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl Default for Config {
    fn default() -> Config {
        Config {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            memory_size: MEMORY_SIZE,
            load_offset: LOAD_OFFSET,
            reset_pc: RESET_VECTOR,
            tick_interval_ms: 33,
            refresh_interval_ms: 33,
            scale: 2,
            shutdown_timeout_ms: 500,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)?;
        Config::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("display size must be non-zero"));
        }
        if self.memory_size == 0 {
            return Err(ConfigError::Invalid("memory size must be non-zero"));
        }
        if self.load_offset > self.memory_size {
            return Err(ConfigError::Invalid("load offset lies outside of memory"));
        }
        if self.tick_interval_ms == 0 || self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("intervals must be non-zero"));
        }
        if self.scale == 0 {
            return Err(ConfigError::Invalid("scale must be non-zero"));
        }
        if self.window_size().is_none() {
            return Err(ConfigError::Invalid("scaled window size overflows"));
        }
        Ok(())
    }

    /// Display size multiplied by the scale, if it fits in `u32`.
    pub fn window_size(&self) -> Option<(u32, u32)> {
        let width = self.width.checked_mul(self.scale)?;
        let height = self.height.checked_mul(self.scale)?;
        Some((width, height))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.memory_size, 0x80_0000);
        assert_eq!(config.load_offset, 0x10_0000);
        assert_eq!(config.tick_interval(), Duration::from_millis(33));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml("scale = 3\ntick_interval_ms = 10\n").unwrap();
        assert_eq!(config.scale, 3);
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.width, 320);
    }

    #[test]
    fn test_empty_toml() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            Config::from_toml("colour = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml("width = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("memory_size = 16\nload_offset = 32"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("refresh_interval_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_scale_overflow() {
        assert!(matches!(
            Config::from_toml("scale = 4294967295"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("width = 100000\nscale = 50000"),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(Config::default().window_size(), Some((640, 480)));
    }
}
