//! Reverse-geocoding providers: Google, GeoNames, BigDataCloud, OpenCage and
//! OpenStreetMap Nominatim.
//!
//! Each provider issues blocking HTTP calls (run them off the async
//! scheduler) and parses the response into its own payload shape. Field
//! extraction is pure and infallible: a missing field is `None`, never an
//! error.

mod bigdatacloud;
mod geonames;
mod google;
mod opencage;
mod osm;

pub use bigdatacloud::{BigDataCloudPayload, BigDataCloudProvider, LocalityEntry, LocalityInfo};
pub use geonames::{GeoNamesAddress, GeoNamesPayload, GeoNamesPlace, GeoNamesProvider};
pub use google::{GoogleGeocode, GoogleProvider};
pub use opencage::{OpenCagePayload, OpenCageProvider};
pub use osm::{NominatimReverse, OsmProvider, DEFAULT_USER_AGENT};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{AddressSnapshot, Coordinate, ProviderConfig, ProviderError, ProviderKind};

/// Pure extractors over a provider's raw response.
pub trait AddressFields {
    fn format_full_address(&self) -> Option<String>;
    fn extract_city(&self) -> Option<String>;
    fn extract_state(&self) -> Option<String>;
    fn extract_country(&self) -> Option<String>;

    fn extract_neighborhood(&self) -> Option<String> {
        None
    }

    /// Plus code reported by the provider itself, if any.
    fn plus_code(&self) -> Option<String> {
        None
    }

    /// Time zone carried inside the geocoding response, if any.
    fn embedded_timezone(&self) -> Option<String> {
        None
    }

    fn to_snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            current_address: self.format_full_address(),
            city: self.extract_city(),
            state: self.extract_state(),
            country: self.extract_country(),
            neighborhood: self.extract_neighborhood(),
            plus_code: self.plus_code(),
        }
    }
}

/// Raw response of one reverse-geocode call, tagged by provider.
#[derive(Debug, Clone)]
pub enum Payload {
    Google(GoogleGeocode),
    GeoNames(GeoNamesPayload),
    BigDataCloud(BigDataCloudPayload),
    OpenCage(OpenCagePayload),
    Osm(NominatimReverse),
}

impl Payload {
    fn fields(&self) -> &dyn AddressFields {
        match self {
            Self::Google(p) => p,
            Self::GeoNames(p) => p,
            Self::BigDataCloud(p) => p,
            Self::OpenCage(p) => p,
            Self::Osm(p) => p,
        }
    }
}

impl AddressFields for Payload {
    fn format_full_address(&self) -> Option<String> {
        self.fields().format_full_address()
    }

    fn extract_city(&self) -> Option<String> {
        self.fields().extract_city()
    }

    fn extract_state(&self) -> Option<String> {
        self.fields().extract_state()
    }

    fn extract_country(&self) -> Option<String> {
        self.fields().extract_country()
    }

    fn extract_neighborhood(&self) -> Option<String> {
        self.fields().extract_neighborhood()
    }

    fn plus_code(&self) -> Option<String> {
        self.fields().plus_code()
    }

    fn embedded_timezone(&self) -> Option<String> {
        self.fields().embedded_timezone()
    }
}

/// Result of [`Provider::lookup`]: the geocoding payload and the time zone.
#[derive(Debug, Clone)]
pub struct ProviderLookup {
    pub payload: Payload,
    pub timezone: Option<String>,
}

/// The configured provider for one instance. Selected once at activation.
#[derive(Debug, Clone)]
pub enum Provider {
    Google(GoogleProvider),
    GeoNames(GeoNamesProvider),
    BigDataCloud(BigDataCloudProvider),
    OpenCage(OpenCageProvider),
    Osm(OsmProvider),
}

impl Provider {
    /// Build the provider for a validated config. `None` for offline mode.
    pub fn from_config(config: &ProviderConfig, user_agent: Option<&str>) -> Option<Self> {
        let key = config.api_key.clone().unwrap_or_default();
        match config.kind {
            ProviderKind::Google => Some(Self::Google(GoogleProvider::new(key))),
            ProviderKind::GeoNames => Some(Self::GeoNames(GeoNamesProvider::new(key))),
            ProviderKind::BigDataCloud => Some(Self::BigDataCloud(BigDataCloudProvider::new())),
            ProviderKind::OpenCage => Some(Self::OpenCage(OpenCageProvider::new(key))),
            ProviderKind::Osm => Some(Self::Osm(OsmProvider::new(user_agent))),
            ProviderKind::Offline => None,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Google(_) => ProviderKind::Google,
            Self::GeoNames(_) => ProviderKind::GeoNames,
            Self::BigDataCloud(_) => ProviderKind::BigDataCloud,
            Self::OpenCage(_) => ProviderKind::OpenCage,
            Self::Osm(_) => ProviderKind::Osm,
        }
    }

    /// Reverse-geocode a coordinate into the provider's raw payload.
    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<Payload, ProviderError> {
        debug!(provider = %self.kind(), %coord, "reverse geocoding");
        match self {
            Self::Google(p) => p.reverse_geocode(coord, language).map(Payload::Google),
            Self::GeoNames(p) => p.reverse_geocode(coord, language).map(Payload::GeoNames),
            Self::BigDataCloud(p) => p.reverse_geocode(coord, language).map(Payload::BigDataCloud),
            Self::OpenCage(p) => p.reverse_geocode(coord, language).map(Payload::OpenCage),
            Self::Osm(p) => p.reverse_geocode(coord, language).map(Payload::Osm),
        }
    }

    /// Time zone for a coordinate. OSM never has one.
    pub fn get_timezone(&self, coord: Coordinate, language: &str) -> Result<Option<String>, ProviderError> {
        match self {
            Self::Google(p) => p.get_timezone(coord, language),
            Self::GeoNames(p) => p.get_timezone(coord, language),
            Self::BigDataCloud(p) => p.get_timezone(coord, language),
            Self::OpenCage(p) => p.get_timezone(coord, language),
            Self::Osm(_) => Ok(None),
        }
    }

    /// Reverse-geocode, then get the time zone. Providers that embed the
    /// zone in the geocoding response are not asked a second time.
    pub fn lookup(&self, coord: Coordinate, language: &str) -> Result<ProviderLookup, ProviderError> {
        let payload = self.reverse_geocode(coord, language)?;
        let timezone = match self {
            Self::BigDataCloud(_) | Self::OpenCage(_) => payload.embedded_timezone(),
            Self::Osm(_) => None,
            Self::Google(_) | Self::GeoNames(_) => self.get_timezone(coord, language)?,
        };
        Ok(ProviderLookup { payload, timezone })
    }
}

// ─── HTTP helpers ───────────────────────────────────────────────

pub(crate) fn get_json<T: DeserializeOwned>(request: ureq::Request) -> Result<T, ProviderError> {
    let response = request.call().map_err(map_ureq_error)?;
    response
        .into_json()
        .map_err(|e| ProviderError::Parse(e.to_string()))
}

pub(crate) fn map_ureq_error(err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(429, _) => ProviderError::RateLimited,
        ureq::Error::Status(status, _) => ProviderError::Http { status },
        ureq::Error::Transport(t) => ProviderError::Network(t.to_string()),
    }
}

// ─── Field helpers ──────────────────────────────────────────────

/// Clone a string field, treating blank as absent.
pub(crate) fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Join the non-blank parts with `sep`; `None` when nothing is left.
pub(crate) fn join_non_empty<'a, I>(parts: I, sep: &str) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let joined = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep);
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
