//! OpenStreetMap Nominatim reverse geocoding.
//!
//! Nominatim's usage policy requires an identifying User-Agent. It has no
//! time zone data, so the local fallback always runs for this provider.

use serde::Deserialize;

use super::{get_json, non_empty, AddressFields};
use crate::location::types::{Coordinate, ProviderError};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

pub const DEFAULT_USER_AGENT: &str = concat!("Geolocator/", env!("CARGO_PKG_VERSION"), " (home-geolocator)");

#[derive(Debug, Clone)]
pub struct OsmProvider {
    user_agent: String,
    url: String,
}

impl OsmProvider {
    pub fn new(user_agent: Option<&str>) -> Self {
        Self {
            user_agent: user_agent.unwrap_or(DEFAULT_USER_AGENT).to_string(),
            url: NOMINATIM_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<NominatimReverse, ProviderError> {
        let request = ureq::get(&self.url)
            .set("User-Agent", &self.user_agent)
            .query("lat", &coord.lat.to_string())
            .query("lon", &coord.lon.to_string())
            .query("format", "jsonv2")
            .query("addressdetails", "1")
            .query("accept-language", language);

        let data: NominatimReverse = get_json(request)?;
        if let Some(ref error) = data.error {
            tracing::debug!(%error, "nominatim returned no address");
        }
        Ok(data)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimReverse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
    /// Set instead of the address when nothing was found (e.g. at sea).
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl AddressFields for NominatimReverse {
    fn format_full_address(&self) -> Option<String> {
        non_empty(self.display_name.as_ref())
    }

    fn extract_city(&self) -> Option<String> {
        let a = self.address.as_ref()?;
        non_empty(a.city.as_ref())
            .or_else(|| non_empty(a.town.as_ref()))
            .or_else(|| non_empty(a.village.as_ref()))
    }

    fn extract_state(&self) -> Option<String> {
        non_empty(self.address.as_ref()?.state.as_ref())
    }

    fn extract_country(&self) -> Option<String> {
        non_empty(self.address.as_ref()?.country.as_ref())
    }

    fn extract_neighborhood(&self) -> Option<String> {
        let a = self.address.as_ref()?;
        non_empty(a.neighbourhood.as_ref()).or_else(|| non_empty(a.suburb.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractors() {
        let data: NominatimReverse = serde_json::from_str(
            r#"{
                "place_id": 123,
                "display_name": "Tour Eiffel, 5, Avenue Anatole France, Gros-Caillou, Paris, Île-de-France, France",
                "address": {
                    "neighbourhood": "Gros-Caillou",
                    "city": "Paris",
                    "state": "Île-de-France",
                    "country": "France",
                    "country_code": "fr"
                }
            }"#,
        )
        .unwrap();
        assert!(data.format_full_address().unwrap().starts_with("Tour Eiffel"));
        assert_eq!(data.extract_city().as_deref(), Some("Paris"));
        assert_eq!(data.extract_state().as_deref(), Some("Île-de-France"));
        assert_eq!(data.extract_country().as_deref(), Some("France"));
        assert_eq!(data.extract_neighborhood().as_deref(), Some("Gros-Caillou"));
        assert!(data.embedded_timezone().is_none());
    }

    #[test]
    fn test_village_when_no_city() {
        let data: NominatimReverse =
            serde_json::from_str(r#"{"address": {"village": "Giverny", "country": "France"}}"#).unwrap();
        assert_eq!(data.extract_city().as_deref(), Some("Giverny"));
        assert!(data.extract_state().is_none());
        assert!(data.format_full_address().is_none());
    }

    #[test]
    fn test_error_body() {
        let data: NominatimReverse = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert_eq!(data.error.as_deref(), Some("Unable to geocode"));
        assert!(data.extract_country().is_none());
    }
}
