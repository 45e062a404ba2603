//! Configuration for the scribe service.
//!
//! Loaded from `scribe.toml` (or the path given with `--config`). Every
//! section is optional:
//!
//! - [`ServerConfig`] - bind address
//! - [`StoreSettings`] - backend, database path, TTL policy, upload limit
//! - [`SweeperConfig`] - background expiry sweeping
//! - [`LoggingConfig`] - output format
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [store]
//! backend = "redb"
//! ttl_hours = 24
//!
//! [sweeper]
//! interval_secs = 300
//! ```

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::daemon::paths;
use crate::daemon::services::kv::KvStore;
use crate::daemon::services::transcription::StoreConfig;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Root of `scribe.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreSettings,
    pub sweeper: SweeperConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
        }
    }
}

/// Which KV backend holds the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Redb,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    pub backend: BackendKind,
    /// Database file for the redb backend. Defaults to the scribe data dir.
    pub path: Option<PathBuf>,
    /// Record lifetime in hours.
    pub ttl_hours: u64,
    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            ttl_hours: constants::DEFAULT_TTL_HOURS,
            max_file_size: constants::MAX_FILE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: constants::DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Config {
    /// Loads `path` if given, else `scribe.toml` in the working directory
    /// if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if any
    /// file found cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None if Path::new(constants::CONFIG_FILE).exists() => {
                Self::load_from(constants::CONFIG_FILE)
            },
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields are unknown or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every fatal problem:
    /// - Invalid host or port 0
    /// - Zero TTL, zero max file size or zero sweep interval
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Server
        if self.server.host.parse::<IpAddr>().is_err() {
            errors.push(format!(
                "server.host '{}' is not an IP address (e.g. 127.0.0.1 or 0.0.0.0)",
                self.server.host
            ));
        }
        if self.server.port == 0 {
            errors.push("server.port cannot be 0. Use a valid port number (1-65535)".to_string());
        } else if self.server.port < 1024 {
            warnings.push(format!(
                "server.port {} is a privileged port (< 1024)\n  \
                 Recommendation: use a port >= 1024 such as {}",
                self.server.port,
                constants::DEFAULT_PORT
            ));
        }

        // 2. Store
        if self.store.ttl_hours == 0 {
            errors.push("store.ttl_hours cannot be 0; records must outlive their creation".to_string());
        } else if self.store.ttl_hours > constants::LONG_TTL_HOURS {
            warnings.push(format!(
                "store.ttl_hours {} keeps records longer than 30 days",
                self.store.ttl_hours
            ));
        }
        if i64::try_from(self.store.ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .is_none()
        {
            errors.push(format!("store.ttl_hours {} is too large", self.store.ttl_hours));
        }
        if self.store.max_file_size == 0 {
            errors.push("store.max_file_size cannot be 0".to_string());
        } else if self.store.max_file_size > constants::MAX_FILE_SIZE {
            warnings.push(format!(
                "store.max_file_size {} is above the usual 25 MiB limit",
                self.store.max_file_size
            ));
        }
        if self.store.backend == BackendKind::Memory && self.store.path.is_some() {
            warnings.push("store.path is ignored by the memory backend".to_string());
        }

        // 3. Sweeper
        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            errors.push("sweeper.interval_secs cannot be 0 while the sweeper is enabled".to_string());
        }
        if !self.sweeper.enabled {
            warnings.push(
                "sweeper is disabled; expired records are only reclaimed by backend TTL".to_string(),
            );
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server.host '{}'", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Store policy derived from `[store]`.
    ///
    /// Call [`validate`](Self::validate) first; an out-of-range TTL falls
    /// back to the default.
    pub fn store_config(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            ttl: i64::try_from(self.store.ttl_hours)
                .ok()
                .and_then(TimeDelta::try_hours)
                .unwrap_or(defaults.ttl),
            max_file_size: self.store.max_file_size,
        }
    }

    /// Database path for the redb backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the default data
    /// directory cannot be determined.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => paths::get_store_path(),
        }
    }

    /// Opens the configured KV backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the redb database cannot be opened.
    pub fn open_kv(&self) -> Result<KvStore> {
        match self.store.backend {
            BackendKind::Memory => Ok(KvStore::memory()),
            BackendKind::Redb => {
                let path = self.store_path()?;
                tracing::debug!(path = %path.display(), "Opening redb store");
                KvStore::file(&path)
            },
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweeper.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.backend, BackendKind::Redb);
        assert_eq!(config.store.ttl_hours, 24);
        assert_eq!(config.store.max_file_size, 25 * 1024 * 1024);
        assert!(config.sweeper.enabled);
        assert!(!config.logging.json);
        assert!(!config.validate().unwrap().has_warnings());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[store]
backend = "memory"
ttl_hours = 720
max_file_size = 1048576

[sweeper]
interval_secs = 60

[logging]
json = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.store_config().ttl, TimeDelta::days(30));
        assert_eq!(config.store_config().max_file_size, 1_048_576);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[store]\nttl = 5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_port_zero() {
        let config: Config = toml::from_str("[server]\nport = 0\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("port cannot be 0"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let toml_str = r#"
[server]
host = "localhost"

[store]
ttl_hours = 0
max_file_size = 0

[sweeper]
interval_secs = 0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.host"));
        assert!(err.contains("ttl_hours cannot be 0"));
        assert!(err.contains("max_file_size cannot be 0"));
        assert!(err.contains("interval_secs cannot be 0"));
    }

    #[test]
    fn test_validate_warnings() {
        let toml_str = r#"
[server]
port = 80

[store]
backend = "memory"
path = "/tmp/ignored.redb"
ttl_hours = 2000
max_file_size = 104857600

[sweeper]
enabled = false
interval_secs = 0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let result = config.validate().unwrap();
        assert_eq!(result.warnings.len(), 5);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scribe.toml");
        let db = dir.path().join("data").join("t.redb");
        fs::write(
            &path,
            format!("[store]\npath = {:?}\n", db.display().to_string()),
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store_path().unwrap(), db);
    }

    #[tokio::test]
    async fn test_open_kv_memory() {
        let config: Config = toml::from_str("[store]\nbackend = \"memory\"\n").unwrap();
        let kv = config.open_kv().unwrap();
        kv.put("k", b"v", None).await.unwrap();
        assert!(kv.get("k").await.unwrap().is_some());
    }
}
