//! Application configuration
//!
//! Loaded from TOML. Every field has a default, so a partial file or no
//! file at all is fine.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::mixer::MixerSettings;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mixer: MixerConfig,
}

/// HTTP / WebSocket listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Loudness report period on the control connection
    pub loudness_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            loudness_interval_ms: DEFAULT_LOUDNESS_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| ConfigError::Invalid {
            field: "server.bind_address",
            reason: format!("{:?} is not an IP address", self.bind_address),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn loudness_interval(&self) -> Duration {
        Duration::from_millis(self.loudness_interval_ms)
    }
}

/// Mixing and packet settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Lanes silent on the wire for this long drop out of mixes
    pub stale_after_ms: u64,
    /// Lanes at or under this loudness drop out of mixes
    pub silence_threshold_dbfs: f32,
    /// Outgoing frames at or under this loudness go out as silent packets
    pub silent_packet_threshold_dbfs: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            silence_threshold_dbfs: f32::NEG_INFINITY,
            silent_packet_threshold_dbfs: DEFAULT_SILENT_PACKET_THRESHOLD_DBFS,
        }
    }
}

impl MixerConfig {
    pub fn settings(&self) -> MixerSettings {
        MixerSettings {
            stale_after: Duration::from_millis(self.stale_after_ms),
            silence_threshold_dbfs: self.silence_threshold_dbfs,
        }
    }
}

impl AppConfig {
    /// Platform config file location, e.g. `~/.config/lan-intercom-mixer/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "lan-intercom-mixer").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load a config file, or the defaults if it doesn't exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(write_err)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                reason: "port 0 is not allowed".to_string(),
            });
        }
        if self.server.loudness_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "server.loudness_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.mixer.silence_threshold_dbfs <= 0.0) {
            return Err(ConfigError::Invalid {
                field: "mixer.silence_threshold_dbfs",
                reason: format!("must be 0 or negative, but got {}", self.mixer.silence_threshold_dbfs),
            });
        }
        if !(self.mixer.silent_packet_threshold_dbfs <= 0.0) {
            return Err(ConfigError::Invalid {
                field: "mixer.silent_packet_threshold_dbfs",
                reason: format!(
                    "must be 0 or negative, but got {}",
                    self.mixer.silent_packet_threshold_dbfs
                ),
            });
        }

        Ok(())
    }
}
