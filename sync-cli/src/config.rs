//! Configuration loading for roomsync.
//!
//! Configuration is loaded from a TOML file (default: `roomsync.toml`).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roomsync_client::{HttpTransportConfig, SyncConfig};
use roomsync_types::RoomUuid;

/// Root configuration for roomsync.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service connection.
    pub server: ServerConfig,
    /// Paging and polling.
    #[serde(default)]
    pub sync: SyncSection,
}

/// Service connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Service origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Application identifier.
    pub app_id: String,
    /// Room to synchronize.
    pub room_uuid: String,
    /// Headers sent with every request (region, authorization).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Paging and polling.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// Records per page (default: 1000).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pages after which a traversal is abandoned (default: 10000).
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Seconds between rounds in `sync --watch` (default: 30).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// out-of-range values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.room()?;
        self.sync_config()?;
        if self.server.base_url.is_empty() {
            return Err(ConfigError::Invalid("server.base_url must not be empty".into()));
        }
        if self.sync.interval_secs == 0 {
            return Err(ConfigError::Invalid("sync.interval_secs must be positive".into()));
        }
        Ok(())
    }

    /// The configured room.
    pub fn room(&self) -> Result<RoomUuid, ConfigError> {
        RoomUuid::new(self.server.room_uuid.as_str())
            .ok_or_else(|| ConfigError::Invalid("server.room_uuid must not be empty".into()))
    }

    /// Paging settings for the client.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let page_size = NonZeroU32::new(self.sync.page_size)
            .ok_or_else(|| ConfigError::Invalid("sync.page_size must be positive".into()))?;
        if self.sync.max_pages == 0 {
            return Err(ConfigError::Invalid("sync.max_pages must be positive".into()));
        }
        Ok(SyncConfig::new()
            .with_page_size(page_size)
            .with_max_pages(self.sync.max_pages))
    }

    /// Connection settings for the HTTP transport.
    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut config = HttpTransportConfig::new(&self.server.base_url, &self.server.app_id)
            .with_timeout(Duration::from_secs(self.server.timeout_secs));
        for (name, value) in &self.server.headers {
            config = config.with_header(name, value);
        }
        config
    }

    /// Delay between `sync --watch` rounds.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[server]
base_url = "https://api.example.com"
app_id = "app-1"
room_uuid = "r1"
"#;

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.sync.page_size, 1000);
        assert_eq!(config.sync.max_pages, 10_000);
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.server.timeout_secs, 30);
        assert!(config.server.headers.is_empty());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
base_url = "https://api.example.com"
app_id = "app-1"
room_uuid = "r1"
timeout_secs = 5

[server.headers]
region = "us-sv"
authorization = "Bearer token"

[sync]
page_size = 50
interval_secs = 10
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.headers["region"], "us-sv");
        assert_eq!(config.room().unwrap().as_str(), "r1");

        let sync = config.sync_config().unwrap();
        assert_eq!(sync.page_size.get(), 50);
        assert_eq!(sync.max_pages, 10_000);

        let transport = config.transport_config();
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.headers.len(), 2);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let toml = format!("{MINIMAL}\n[sync]\npage_size = 0\n");
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_room_is_invalid() {
        let toml = MINIMAL.replace("\"r1\"", "\"\"");
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(matches!(config.room(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_server_section_fails_to_parse() {
        let result: Result<Config, _> = toml::from_str("[sync]\npage_size = 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/roomsync.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn from_file_loads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roomsync.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.app_id, "app-1");
    }
}
