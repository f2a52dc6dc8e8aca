//! Configuration file (`~/.config/geolocator/config.toml` by default).
//!
//! ```toml
//! update_interval_secs = 3600
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8686
//!
//! [[instances]]
//! id = "home"
//! provider = "google"
//! api_key = "..."
//! language = "en"
//! latitude = 48.8566
//! longitude = 2.3522
//! enable_public_lands = false
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::location::{Coordinate, ProviderConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Seconds between scheduled refreshes; 0 disables them.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// One configured home location. Replaced wholesale on reconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub id: String,

    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key, or the username for GeoNames.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    pub latitude: f64,
    pub longitude: f64,

    #[serde(default)]
    pub enable_public_lands: bool,

    /// Client identifier sent to Nominatim.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_update_interval_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8686
}

fn default_provider() -> String {
    "offline".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            update_interval_secs: default_update_interval_secs(),
            instances: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("geolocator")
            .join("config.toml")
    }

    /// Load from an explicit path, or from the default path if it exists.
    /// A missing default file yields the default (empty) configuration.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::load(&p)
                } else {
                    tracing::info!(path = %p.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every instance and reject duplicate ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for instance in &self.instances {
            instance.validate()?;
            if !seen.insert(instance.id.as_str()) {
                return Err(ConfigError::DuplicateInstance(instance.id.clone()));
            }
        }
        Ok(())
    }
}

impl InstanceConfig {
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        ProviderConfig::new(&self.provider, self.api_key.as_deref())
    }

    pub fn coordinate(&self) -> Result<Coordinate, ConfigError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider_config()?;
        self.coordinate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
        update_interval_secs = 900

        [server]
        port = 9000

        [[instances]]
        id = "home"
        provider = "google"
        api_key = "secret"
        language = "fr"
        latitude = 48.8566
        longitude = 2.3522
        enable_public_lands = true

        [[instances]]
        id = "cabin"
        latitude = 61.5
        longitude = 23.75
    "#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.update_interval_secs, 900);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.instances.len(), 2);

        let home = &config.instances[0];
        assert_eq!(home.language, "fr");
        assert!(home.enable_public_lands);
        assert_relative_eq!(home.latitude, 48.8566);

        let cabin = &config.instances[1];
        assert_eq!(cabin.provider, "offline");
        assert_eq!(cabin.language, "en");
        assert!(!cabin.enable_public_lands);
        assert_relative_eq!(cabin.coordinate().unwrap().lon, 23.75);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.update_interval_secs, 3600);
        assert_eq!(config.server.port, 8686);
        assert!(config.instances.is_empty());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [[instances]]
            id = "home"
            provider = "mapquest"
            latitude = 1.0
            longitude = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(p) if p == "mapquest"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [[instances]]
            id = "home"
            provider = "geonames"
            latitude = 1.0
            longitude = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));
    }

    #[test]
    fn test_duplicate_and_bad_coordinates() {
        let dup = r#"
            [[instances]]
            id = "home"
            latitude = 1.0
            longitude = 1.0
            [[instances]]
            id = "home"
            latitude = 2.0
            longitude = 2.0
        "#;
        assert!(matches!(
            AppConfig::from_toml_str(dup),
            Err(ConfigError::DuplicateInstance(_))
        ));

        let bad = r#"
            [[instances]]
            id = "home"
            latitude = 123.0
            longitude = 1.0
        "#;
        assert!(matches!(
            AppConfig::from_toml_str(bad),
            Err(ConfigError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.instances[0].id, "home");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(AppConfig::load(&missing), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("instances = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
