//! Google Maps Geocoding + Time Zone APIs.

use serde::Deserialize;

use super::{get_json, non_empty, AddressFields};
use crate::location::types::{Coordinate, ProviderError};

const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GOOGLE_BASE_URL.to_string(),
        }
    }

    /// Point the provider at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<GoogleGeocode, ProviderError> {
        let request = ureq::get(&format!("{}/geocode/json", self.base_url))
            .query("latlng", &format!("{},{}", coord.lat, coord.lon))
            .query("key", &self.api_key)
            .query("language", language);

        let data: GoogleGeocode = get_json(request)?;
        check_status(data.status.as_deref(), data.error_message.as_deref())?;
        Ok(data)
    }

    /// Dedicated time zone endpoint; needs a UNIX timestamp to pick the DST rule.
    pub fn get_timezone(&self, coord: Coordinate, language: &str) -> Result<Option<String>, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp();
        let request = ureq::get(&format!("{}/timezone/json", self.base_url))
            .query("location", &format!("{},{}", coord.lat, coord.lon))
            .query("timestamp", &timestamp.to_string())
            .query("key", &self.api_key)
            .query("language", language);

        let data: GoogleTimezone = get_json(request)?;
        tracing::debug!(status = ?data.status, tz = ?data.time_zone_id, "google time zone response");
        check_status(data.status.as_deref(), data.error_message.as_deref())?;
        Ok(non_empty(data.time_zone_id.as_ref()))
    }
}

/// Map Google's in-body status to an error. `ZERO_RESULTS` is not one.
fn check_status(status: Option<&str>, message: Option<&str>) -> Result<(), ProviderError> {
    match status {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(()),
        Some("OVER_QUERY_LIMIT") | Some("OVER_DAILY_LIMIT") => Err(ProviderError::RateLimited),
        Some(other) => Err(ProviderError::Api {
            message: message.unwrap_or(other).to_string(),
        }),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleGeocode {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GoogleResult>,
    #[serde(default)]
    pub plus_code: Option<GooglePlusCode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<GoogleComponent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleComponent {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GooglePlusCode {
    #[serde(default)]
    pub global_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTimezone {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(default, rename = "timeZoneId")]
    time_zone_id: Option<String>,
}

impl GoogleGeocode {
    /// First component, across all results, tagged with `type_name`.
    fn component(&self, type_name: &str) -> Option<String> {
        self.results
            .iter()
            .flat_map(|r| r.address_components.iter())
            .find(|c| c.types.iter().any(|t| t == type_name))
            .and_then(|c| non_empty(c.long_name.as_ref()))
    }
}

impl AddressFields for GoogleGeocode {
    fn format_full_address(&self) -> Option<String> {
        self.results
            .first()
            .and_then(|r| non_empty(r.formatted_address.as_ref()))
    }

    fn extract_city(&self) -> Option<String> {
        self.component("locality")
    }

    fn extract_state(&self) -> Option<String> {
        self.component("administrative_area_level_1")
    }

    fn extract_country(&self) -> Option<String> {
        self.component("country")
    }

    fn extract_neighborhood(&self) -> Option<String> {
        self.component("neighborhood")
    }

    fn plus_code(&self) -> Option<String> {
        self.plus_code
            .as_ref()
            .and_then(|p| non_empty(p.global_code.as_ref()))
    }
}
