//! Configuration loading for the Stockroom client.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockroom_storage::CacheConfig;

pub const CONFIG_ENV_VAR: &str = "STOCKROOM_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `https://abc.supabase.co`.
    pub backend_url: String,
    /// Public API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Session token; the anon key is used as bearer when absent.
    pub access_token: Option<String>,
    pub request_timeout_ms: u64,
    pub cache: CacheSection,
    pub preferences: PreferencesSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    pub stale_time_ms: u64,
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferencesBackend {
    /// One JSON file per store in `path`.
    File,
    /// An LMDB environment at `path`.
    Lmdb,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesSection {
    pub backend: PreferencesBackend,
    pub path: PathBuf,
    /// Required when `backend = "lmdb"`.
    pub lmdb_max_size_mb: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or STOCKROOM_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backend_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "anon_key",
                reason: "must not be empty".to_string(),
            });
        }
        if matches!(&self.access_token, Some(token) if token.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "access_token",
                reason: "must not be empty when provided".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.event_capacity",
                reason: "must be > 0".to_string(),
            });
        }
        if self.preferences.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "preferences.path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.preferences.backend == PreferencesBackend::Lmdb {
            match self.preferences.lmdb_max_size_mb {
                None => {
                    return Err(ConfigError::InvalidValue {
                        field: "preferences.lmdb_max_size_mb",
                        reason: "required for the lmdb backend".to_string(),
                    })
                }
                Some(0) => {
                    return Err(ConfigError::InvalidValue {
                        field: "preferences.lmdb_max_size_mb",
                        reason: "must be > 0".to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_stale_time(Duration::from_millis(self.cache.stale_time_ms))
            .with_event_capacity(self.cache.event_capacity)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
backend_url = "https://stock.example.com"
anon_key = "anon"
request_timeout_ms = 5000

[cache]
stale_time_ms = 30000
event_capacity = 64

[preferences]
backend = "file"
path = "/tmp/stockroom"
"#;

    #[test]
    fn test_valid_config_parses() {
        let config = ClientConfig::from_toml(VALID).unwrap();
        config.validate().unwrap();
        assert_eq!(config.preferences.backend, PreferencesBackend::File);
        assert!(config.access_token.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_config().stale_time, Duration::from_secs(30));
        assert_eq!(config.cache_config().event_capacity, 64);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = format!("{}\nretries = 3\n", VALID.replace("[cache]", "extra = 1\n[cache]"));
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let toml = VALID.replace("request_timeout_ms = 5000\n", "");
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let toml = VALID.replace("request_timeout_ms = 5000", "request_timeout_ms = 0");
        let config = ClientConfig::from_toml(&toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_backend_url_scheme_checked() {
        let toml = VALID.replace("https://stock.example.com", "stock.example.com");
        let config = ClientConfig::from_toml(&toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "backend_url",
                ..
            })
        ));
    }

    #[test]
    fn test_lmdb_requires_size() {
        let toml = VALID.replace("backend = \"file\"", "backend = \"lmdb\"");
        let config = ClientConfig::from_toml(&toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "preferences.lmdb_max_size_mb",
                ..
            })
        ));

        let toml = toml.replace(
            "path = \"/tmp/stockroom\"",
            "path = \"/tmp/stockroom\"\nlmdb_max_size_mb = 16",
        );
        ClientConfig::from_toml(&toml).unwrap().validate().unwrap();
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.toml");
        std::fs::write(&path, VALID).unwrap();
        let config = ClientConfig::from_path(&path).unwrap();
        assert_eq!(config.anon_key, "anon");

        assert!(matches!(
            ClientConfig::from_path(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
