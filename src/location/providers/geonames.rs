//! GeoNames web services, keyed by username.
//!
//! Three calls per lookup: nearest street address, nearby populated place,
//! and time zone. The street line comes from the first; city, state and
//! country come from the second.

use serde::Deserialize;
use tracing::debug;

use super::{get_json, join_non_empty, non_empty, AddressFields};
use crate::location::types::{Coordinate, ProviderError};

const GEONAMES_BASE_URL: &str = "http://api.geonames.org";

/// GeoNames status codes for exhausted credits (daily, hourly, weekly).
const LIMIT_EXCEEDED_CODES: [i64; 3] = [18, 19, 20];

#[derive(Debug, Clone)]
pub struct GeoNamesProvider {
    username: String,
    base_url: String,
}

impl GeoNamesProvider {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            base_url: GEONAMES_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, endpoint: &str, coord: Coordinate, language: &str) -> ureq::Request {
        ureq::get(&format!("{}/{}", self.base_url, endpoint))
            .query("lat", &coord.lat.to_string())
            .query("lng", &coord.lon.to_string())
            .query("username", &self.username)
            .query("lang", language)
    }

    pub fn reverse_geocode(&self, coord: Coordinate, language: &str) -> Result<GeoNamesPayload, ProviderError> {
        let nearest: NearestAddressResponse =
            get_json(self.request("findNearestAddressJSON", coord, language))?;
        let address = match nearest.status {
            Some(status) if status.is_rate_limit() => return Err(ProviderError::RateLimited),
            Some(status) => {
                // Street addresses only exist for some countries; keep going.
                debug!(message = ?status.message, "geonames: no street address");
                None
            }
            None => nearest.address,
        };

        let nearby: NearbyResponse = get_json(self.request("findNearbyPlaceNameJSON", coord, language))?;
        if let Some(status) = nearby.status {
            return Err(status.into_error());
        }

        Ok(GeoNamesPayload {
            address,
            places: nearby.geonames,
        })
    }

    pub fn get_timezone(&self, coord: Coordinate, language: &str) -> Result<Option<String>, ProviderError> {
        let data: TimezoneResponse = get_json(self.request("timezoneJSON", coord, language))?;
        if let Some(status) = data.status {
            return Err(status.into_error());
        }
        Ok(non_empty(data.timezone_id.as_ref()))
    }
}

#[derive(Debug, Deserialize)]
struct GeoNamesStatus {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    value: Option<i64>,
}

impl GeoNamesStatus {
    fn is_rate_limit(&self) -> bool {
        self.value.is_some_and(|v| LIMIT_EXCEEDED_CODES.contains(&v))
    }

    fn into_error(self) -> ProviderError {
        if self.is_rate_limit() {
            return ProviderError::RateLimited;
        }
        ProviderError::Api {
            message: self
                .message
                .unwrap_or_else(|| format!("GeoNames status {}", self.value.unwrap_or_default())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NearestAddressResponse {
    #[serde(default)]
    address: Option<GeoNamesAddress>,
    #[serde(default)]
    status: Option<GeoNamesStatus>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    geonames: Vec<GeoNamesPlace>,
    #[serde(default)]
    status: Option<GeoNamesStatus>,
}

#[derive(Debug, Deserialize)]
struct TimezoneResponse {
    #[serde(default, rename = "timezoneId")]
    timezone_id: Option<String>,
    #[serde(default)]
    status: Option<GeoNamesStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoNamesAddress {
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub placename: Option<String>,
    #[serde(default)]
    pub admin_code1: Option<String>,
    #[serde(default)]
    pub admin_name1: Option<String>,
    #[serde(default)]
    pub postalcode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoNamesPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin_name1: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
}

/// Both geocoding responses combined.
#[derive(Debug, Clone, Default)]
pub struct GeoNamesPayload {
    pub address: Option<GeoNamesAddress>,
    pub places: Vec<GeoNamesPlace>,
}

impl GeoNamesPayload {
    fn top_place(&self) -> Option<&GeoNamesPlace> {
        self.places.first()
    }
}

impl AddressFields for GeoNamesPayload {
    /// "<number> <street>, <place>, <admin> <postal>, <country>", skipping
    /// empty segments.
    fn format_full_address(&self) -> Option<String> {
        let address = self.address.as_ref();
        let place = self.top_place();

        let street = join_non_empty(
            [
                address.and_then(|a| a.street_number.as_deref()),
                address.and_then(|a| a.street.as_deref()),
            ],
            " ",
        );
        let placename = address
            .and_then(|a| non_empty(a.placename.as_ref()))
            .or_else(|| place.and_then(|p| non_empty(p.name.as_ref())));
        let region = join_non_empty(
            [
                address.and_then(|a| a.admin_code1.as_deref()),
                address.and_then(|a| a.postalcode.as_deref()),
            ],
            " ",
        );
        let country = place.and_then(|p| p.country_name.as_deref());

        join_non_empty(
            [street.as_deref(), placename.as_deref(), region.as_deref(), country],
            ", ",
        )
    }

    fn extract_city(&self) -> Option<String> {
        self.top_place()
            .and_then(|p| non_empty(p.name.as_ref()))
            .or_else(|| self.address.as_ref().and_then(|a| non_empty(a.placename.as_ref())))
    }

    fn extract_state(&self) -> Option<String> {
        self.top_place()
            .and_then(|p| non_empty(p.admin_name1.as_ref()))
            .or_else(|| self.address.as_ref().and_then(|a| non_empty(a.admin_name1.as_ref())))
    }

    fn extract_country(&self) -> Option<String> {
        self.top_place().and_then(|p| non_empty(p.country_name.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn springfield() -> GeoNamesPayload {
        GeoNamesPayload {
            address: Some(GeoNamesAddress {
                street_number: Some("10".into()),
                street: Some("Main St".into()),
                placename: Some("Springfield".into()),
                admin_code1: Some("IL".into()),
                admin_name1: Some("Illinois".into()),
                postalcode: Some("62704".into()),
            }),
            places: vec![GeoNamesPlace {
                name: Some("Springfield".into()),
                admin_name1: Some("Illinois".into()),
                country_name: Some("USA".into()),
            }],
        }
    }

    #[test]
    fn test_format_full_address() {
        assert_eq!(
            springfield().format_full_address().as_deref(),
            Some("10 Main St, Springfield, IL 62704, USA")
        );
    }

    #[test]
    fn test_format_omits_empty_segments() {
        let mut payload = springfield();
        if let Some(addr) = payload.address.as_mut() {
            addr.street_number = None;
            addr.postalcode = Some(String::new());
        }
        assert_eq!(
            payload.format_full_address().as_deref(),
            Some("Main St, Springfield, IL, USA")
        );

        payload.address = None;
        assert_eq!(payload.format_full_address().as_deref(), Some("Springfield, USA"));
    }

    #[test]
    fn test_extractors_use_nearby_place() {
        let payload = springfield();
        assert_eq!(payload.extract_city().as_deref(), Some("Springfield"));
        assert_eq!(payload.extract_state().as_deref(), Some("Illinois"));
        assert_eq!(payload.extract_country().as_deref(), Some("USA"));
        assert!(payload.extract_neighborhood().is_none());
    }

    #[test]
    fn test_deserialize_nearest_address() {
        let resp: NearestAddressResponse = serde_json::from_str(
            r#"{"address": {"street": "Main St", "streetNumber": "10", "adminCode1": "IL", "postalcode": "62704", "placename": "Springfield", "countryCode": "US"}}"#,
        )
        .unwrap();
        let addr = resp.address.unwrap();
        assert_eq!(addr.street_number.as_deref(), Some("10"));
        assert_eq!(addr.admin_code1.as_deref(), Some("IL"));
    }

    #[test]
    fn test_status_codes() {
        let limited = GeoNamesStatus { message: Some("daily limit".into()), value: Some(18) };
        assert!(matches!(limited.into_error(), ProviderError::RateLimited));

        let denied = GeoNamesStatus { message: Some("user does not exist.".into()), value: Some(10) };
        assert!(matches!(denied.into_error(), ProviderError::Api { .. }));
    }
}
