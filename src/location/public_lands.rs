//! US public-land ownership overlay (PAD-US public access feature service).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::providers::map_ureq_error;
use super::types::{Coordinate, ProviderError};

const PADUS_QUERY_URL: &str =
    "https://services.arcgis.com/v01gqwM5QqNysAAi/arcgis/rest/services/PADUS_Public_Access/FeatureServer/0/query";

const OUT_FIELDS: &str = "Unit_Nm,Pub_Access,MngTp_Desc,MngNm_Desc,DesTp_Desc";

/// Bound on the feature-service call; exceeding it counts as a failure.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Human-readable phrase for a PAD-US `Pub_Access` code.
pub fn access_label(code: &str) -> &'static str {
    match code {
        "OA" => "Open to the Public",
        "RA" => "Restricted Access",
        "XA" => "Closed to the Public",
        "PA" => "Public Access by Permit",
        "TA" => "Temporary Access Allowed",
        "UK" => "Unknown",
        _ => "Unknown Access Type",
    }
}

/// Attributes of the land unit containing the point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicLandRecord {
    #[serde(rename = "Unit_Nm", default)]
    pub unit_name: Option<String>,
    /// Already translated through [`access_label`].
    #[serde(rename = "Pub_Access", default)]
    pub public_access: Option<String>,
    #[serde(rename = "MngTp_Desc", default)]
    pub management_type: Option<String>,
    #[serde(rename = "MngNm_Desc", default)]
    pub manager_name: Option<String>,
    #[serde(rename = "DesTp_Desc", default)]
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureQueryResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    attributes: PublicLandRecord,
}

#[derive(Debug, Clone)]
pub struct PublicLandsClient {
    url: String,
    timeout: Duration,
}

impl Default for PublicLandsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicLandsClient {
    pub fn new() -> Self {
        Self {
            url: PADUS_QUERY_URL.to_string(),
            timeout: QUERY_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Land unit at `coord`. `None` when nothing matches or the service
    /// fails; this never returns an error.
    pub fn fetch(&self, coord: Coordinate) -> Option<PublicLandRecord> {
        match self.query(coord) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                warn!("No public lands data found at {}", coord);
                None
            }
            Err(e) => {
                error!("Error fetching public lands data: {}", e);
                None
            }
        }
    }

    fn query(&self, coord: Coordinate) -> Result<Option<PublicLandRecord>, ProviderError> {
        let response = ureq::get(&self.url)
            .timeout(self.timeout)
            .query("geometry", &format!("{},{}", coord.lon, coord.lat))
            .query("geometryType", "esriGeometryPoint")
            .query("inSR", "4326")
            .query("outFields", OUT_FIELDS)
            .query("returnGeometry", "false")
            .query("f", "json")
            .call()
            .map_err(map_ureq_error)?;

        let data: FeatureQueryResponse = response
            .into_json()
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(data.features.into_iter().next().map(|f| {
            let mut record = f.attributes;
            record.public_access = record.public_access.map(|code| access_label(&code).to_string());
            record
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_labels() {
        assert_eq!(access_label("OA"), "Open to the Public");
        assert_eq!(access_label("XA"), "Closed to the Public");
        assert_eq!(access_label("UK"), "Unknown");
        assert_eq!(access_label("ZZ"), "Unknown Access Type");
    }

    #[test]
    fn test_feature_attributes_deserialize() {
        let resp: FeatureQueryResponse = serde_json::from_str(
            r#"{"features": [{"attributes": {
                "Unit_Nm": "Yosemite National Park",
                "Pub_Access": "OA",
                "MngTp_Desc": "Federal",
                "MngNm_Desc": "National Park Service",
                "DesTp_Desc": "National Park"
            }}]}"#,
        )
        .unwrap();
        let record = &resp.features[0].attributes;
        assert_eq!(record.unit_name.as_deref(), Some("Yosemite National Park"));
        assert_eq!(record.designation.as_deref(), Some("National Park"));
    }

    #[test]
    fn test_empty_feature_set() {
        let resp: FeatureQueryResponse = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(resp.features.is_empty());

        let resp: FeatureQueryResponse =
            serde_json::from_str(r#"{"error": {"code": 400, "message": "Invalid query"}}"#).unwrap();
        assert!(resp.features.is_empty());
    }

    #[test]
    fn test_unreachable_service_is_no_data() {
        let client = PublicLandsClient::new()
            .with_url("http://127.0.0.1:9/query")
            .with_timeout(Duration::from_millis(200));
        let coord = Coordinate::new(37.8651, -119.5383).unwrap();
        assert!(client.fetch(coord).is_none());
    }
}
