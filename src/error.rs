//! Setup-time and host errors.
//!
//! Provider failures live in [`crate::location::ProviderError`] and never
//! leave an update cycle; the kinds here are the ones a caller can see.

use std::path::PathBuf;

/// Invalid or unreadable configuration. Fatal at activation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported API provider: {0}")]
    UnknownProvider(String),
    #[error("provider '{0}' requires an API key")]
    MissingApiKey(String),
    #[error("invalid coordinates {lat},{lon}: latitude must be within -90..90, longitude within -180..180")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("instance '{0}' is already active")]
    DuplicateInstance(String),
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),
}

/// Rejection from the host's "set time zone" service.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::UnknownProvider("here".into());
        assert_eq!(err.to_string(), "unsupported API provider: here");

        let err = ConfigError::InvalidCoordinate { lat: 91.0, lon: 0.0 };
        assert!(err.to_string().contains("91"));

        let err = HostError::InvalidTimezone("Mars/Olympus".into());
        assert!(err.to_string().contains("Mars/Olympus"));
    }
}
