//! OpenCage geocoder. One keyed call; the time zone rides in the annotations.

use serde::Deserialize;

use super::{get_json, non_empty, AddressFields};
use crate::location::types::{Coordinate, ProviderError};

const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

#[derive(Debug, Clone)]
pub struct OpenCageProvider {
    api_key: String,
    url: String,
}

impl OpenCageProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: OPENCAGE_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<OpenCagePayload, ProviderError> {
        let request = ureq::get(&self.url)
            .query("q", &format!("{},{}", coord.lat, coord.lon))
            .query("key", &self.api_key)
            .query("language", language);
        let data: OpenCagePayload = get_json(request)?;
        tracing::debug!(results = data.results.len(), "opencage reverse geocode response");
        Ok(data)
    }

    /// An empty result list is "no data", not an error.
    pub fn get_timezone(&self, coord: Coordinate, language: &str) -> Result<Option<String>, ProviderError> {
        let timezone = self.reverse_geocode(coord, language)?.embedded_timezone();
        if timezone.is_none() {
            tracing::warn!("OpenCage: no time zone in response");
        }
        Ok(timezone)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCagePayload {
    #[serde(default)]
    pub results: Vec<OpenCageResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCageResult {
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub components: OpenCageComponents,
    #[serde(default)]
    pub annotations: Option<OpenCageAnnotations>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCageComponents {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCageAnnotations {
    #[serde(default)]
    pub timezone: Option<OpenCageTimezone>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCageTimezone {
    #[serde(default)]
    pub name: Option<String>,
}

impl OpenCagePayload {
    fn components(&self) -> Option<&OpenCageComponents> {
        self.results.first().map(|r| &r.components)
    }
}

impl AddressFields for OpenCagePayload {
    fn format_full_address(&self) -> Option<String> {
        self.results.first().and_then(|r| non_empty(r.formatted.as_ref()))
    }

    /// city, then town, village, county.
    fn extract_city(&self) -> Option<String> {
        let c = self.components()?;
        non_empty(c.city.as_ref())
            .or_else(|| non_empty(c.town.as_ref()))
            .or_else(|| non_empty(c.village.as_ref()))
            .or_else(|| non_empty(c.county.as_ref()))
    }

    fn extract_state(&self) -> Option<String> {
        non_empty(self.components()?.state.as_ref())
    }

    fn extract_country(&self) -> Option<String> {
        non_empty(self.components()?.country.as_ref())
    }

    fn extract_neighborhood(&self) -> Option<String> {
        let c = self.components()?;
        non_empty(c.neighbourhood.as_ref()).or_else(|| non_empty(c.suburb.as_ref()))
    }

    fn embedded_timezone(&self) -> Option<String> {
        self.results
            .first()?
            .annotations
            .as_ref()?
            .timezone
            .as_ref()
            .and_then(|tz| non_empty(tz.name.as_ref()))
    }
}
