//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90,90] / [-180,180].
    pub fn new(lat: f64, lon: f64) -> Result<Self, ConfigError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Which reverse-geocoding backend an instance talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    GeoNames,
    BigDataCloud,
    OpenCage,
    Osm,
    Offline,
}

impl ProviderKind {
    /// Whether the provider refuses requests without an API key (or username).
    pub fn needs_key(self) -> bool {
        matches!(self, Self::Google | Self::GeoNames | Self::OpenCage)
    }

    /// Configuration string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GeoNames => "geonames",
            Self::BigDataCloud => "bigdatacloud",
            Self::OpenCage => "opencage",
            Self::Osm => "osm",
            Self::Offline => "offline",
        }
    }

    /// Human-readable name, used as the resolution source label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google Maps",
            Self::GeoNames => "GeoNames",
            Self::BigDataCloud => "BigDataCloud",
            Self::OpenCage => "OpenCage",
            Self::Osm => "OpenStreetMap",
            Self::Offline => "Offline",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "geonames" => Ok(Self::GeoNames),
            "bigdatacloud" => Ok(Self::BigDataCloud),
            "opencage" => Ok(Self::OpenCage),
            "osm" | "nominatim" => Ok(Self::Osm),
            "offline" => Ok(Self::Offline),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Provider selection plus credentials, built once per activated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Validate a provider name and key pair.
    pub fn new(provider: &str, api_key: Option<&str>) -> Result<Self, ConfigError> {
        let kind: ProviderKind = provider.parse()?;
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        if kind.needs_key() && api_key.is_none() {
            return Err(ConfigError::MissingApiKey(kind.as_str().to_string()));
        }

        Ok(Self { kind, api_key })
    }

    pub fn needs_key(&self) -> bool {
        self.kind.needs_key()
    }
}

/// Address fields extracted from the most recent successful provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub current_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub neighborhood: Option<String>,
    pub plus_code: Option<String>,
}

/// Where a cycle's time zone came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimezoneSource {
    Provider(ProviderKind),
    LocalFallback,
    Error,
}

impl fmt::Display for TimezoneSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(kind) => write!(f, "{}", kind),
            Self::LocalFallback => write!(f, "Local Fallback"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Time zone outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneResolution {
    pub timezone_id: Option<String>,
    pub source: TimezoneSource,
    /// Abbreviation in effect when the cycle ran (e.g. "CEST").
    #[serde(default)]
    pub abbreviation: Option<String>,
    /// Localized long name (e.g. "Central European Summer Time").
    #[serde(default)]
    pub full_display_name: Option<String>,
    #[serde(default)]
    pub is_dst: Option<bool>,
}

impl TimezoneResolution {
    pub fn unresolved() -> Self {
        Self {
            timezone_id: None,
            source: TimezoneSource::Error,
            abbreviation: None,
            full_display_name: None,
            is_dst: None,
        }
    }
}

/// Provider call failures. Always caught by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {status}")]
    Http { status: u16 },
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("provider rejected request: {message}")]
    Api { message: String },
    #[error("invalid provider response: {0}")]
    Parse(String),
}
