//! BigDataCloud client-side reverse geocoding (no key required).
//!
//! The time zone is not a separate call: it sits in the "informative"
//! locality list of the same response.

use serde::Deserialize;

use super::{get_json, join_non_empty, non_empty, AddressFields};
use crate::location::types::{Coordinate, ProviderError};

const BIGDATACLOUD_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";

#[derive(Debug, Clone)]
pub struct BigDataCloudProvider {
    url: String,
}

impl Default for BigDataCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BigDataCloudProvider {
    pub fn new() -> Self {
        Self {
            url: BIGDATACLOUD_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<BigDataCloudPayload, ProviderError> {
        let request = ureq::get(&self.url)
            .query("latitude", &coord.lat.to_string())
            .query("longitude", &coord.lon.to_string())
            .query("localityLanguage", language);
        get_json(request)
    }

    /// Standalone lookup re-requests the payload.
    pub fn get_timezone(&self, coord: Coordinate, language: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.reverse_geocode(coord, language)?.embedded_timezone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigDataCloudPayload {
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub principal_subdivision: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub locality_info: Option<LocalityInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalityInfo {
    #[serde(default)]
    pub informative: Vec<LocalityEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalityEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AddressFields for BigDataCloudPayload {
    fn format_full_address(&self) -> Option<String> {
        join_non_empty(
            [
                self.locality.as_deref(),
                self.principal_subdivision.as_deref(),
                self.country_name.as_deref(),
            ],
            ", ",
        )
    }

    fn extract_city(&self) -> Option<String> {
        non_empty(self.locality.as_ref()).or_else(|| non_empty(self.city.as_ref()))
    }

    fn extract_state(&self) -> Option<String> {
        non_empty(self.principal_subdivision.as_ref())
    }

    fn extract_country(&self) -> Option<String> {
        non_empty(self.country_name.as_ref())
    }

    /// Entry whose description is "time zone", case-insensitively.
    fn embedded_timezone(&self) -> Option<String> {
        self.locality_info
            .as_ref()?
            .informative
            .iter()
            .find(|item| {
                item.description
                    .as_deref()
                    .is_some_and(|d| d.trim().eq_ignore_ascii_case("time zone"))
            })
            .and_then(|item| non_empty(item.name.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_from_informative() {
        let data: BigDataCloudPayload = serde_json::from_str(
            r#"{"localityInfo": {"informative": [{"description": "Time Zone", "name": "Europe/Paris"}]}}"#,
        )
        .unwrap();
        assert_eq!(data.embedded_timezone().as_deref(), Some("Europe/Paris"));
        assert!(data.format_full_address().is_none());
        assert!(data.extract_city().is_none());
    }

    #[test]
    fn test_timezone_skips_other_entries() {
        let data: BigDataCloudPayload = serde_json::from_str(
            r#"{"localityInfo": {"informative": [
                {"description": "continent", "name": "Europe", "order": 1},
                {"description": "time zone", "name": "Europe/Berlin", "order": 4}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(data.embedded_timezone().as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_no_informative_list() {
        let data: BigDataCloudPayload = serde_json::from_str(r#"{"locality": "Lyon"}"#).unwrap();
        assert!(data.embedded_timezone().is_none());
    }

    #[test]
    fn test_address_fields() {
        let data: BigDataCloudPayload = serde_json::from_str(
            r#"{"locality": "Lyon", "principalSubdivision": "Auvergne-Rhône-Alpes", "countryName": "France", "postcode": "69001"}"#,
        )
        .unwrap();
        assert_eq!(
            data.format_full_address().as_deref(),
            Some("Lyon, Auvergne-Rhône-Alpes, France")
        );
        assert_eq!(data.extract_city().as_deref(), Some("Lyon"));
        assert_eq!(data.extract_state().as_deref(), Some("Auvergne-Rhône-Alpes"));
        assert_eq!(data.extract_country().as_deref(), Some("France"));
        assert!(data.extract_neighborhood().is_none());
    }
}
