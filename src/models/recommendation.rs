use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GeocodeFeature;

const DEFAULT_NAME: &str = "Unknown Place";
const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_ADDRESS: &str = "No address available";
const DEFAULT_RECOMMENDED_TIME: &str = "1 hour";
const DEFAULT_TIPS: &str = "No tips available";

/// A `[longitude, latitude]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates(pub f64, pub f64);

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self(longitude, latitude)
    }

    pub fn longitude(&self) -> f64 {
        self.0
    }

    pub fn latitude(&self) -> f64 {
        self.1
    }

    /// Both components are real numbers
    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }

    /// Finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-180.0..=180.0).contains(&self.0)
            && (-90.0..=90.0).contains(&self.1)
    }

    /// Shifts both axes by the same amount
    pub fn offset(&self, delta: f64) -> Self {
        Self(self.0 + delta, self.1 + delta)
    }

    /// `lng,lat` as expected by the geocoder's proximity parameter
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.0, self.1)
    }
}

/// An unresolved place suggestion from the completion backend.
///
/// Every field is optional; the model is not trusted to fill them all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub recommended_time: Option<String>,
    pub tips: Option<String>,
}

/// The two queries tried for a geocodable candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQueries {
    pub primary: String,
    pub fallback: String,
}

impl Candidate {
    /// Builds a candidate from one entry of the model's list.
    ///
    /// Numbers and booleans are stringified, blank strings count as absent and
    /// anything else (nested objects, arrays, a non-object entry) is dropped.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(scalar_text);

        Self {
            name: field("name"),
            description: field("description"),
            address: field("address"),
            recommended_time: field("recommendedTime"),
            tips: field("tips"),
        }
    }

    /// Geocoding needs both a name and an address; `None` means skip it.
    pub fn geocode_queries(&self, location: &str) -> Option<GeocodeQueries> {
        let name = self.name.as_deref()?;
        let address = self.address.as_deref()?;

        Some(GeocodeQueries {
            primary: format!("{}, {}, {}", name, address, location),
            fallback: format!("{}, {}", name, location),
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Place name and relevance echoed by the geocoder for the chosen feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodingMatch {
    pub place_name: String,
    pub relevance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub place_type: Vec<String>,
}

impl From<&GeocodeFeature> for GeocodingMatch {
    fn from(feature: &GeocodeFeature) -> Self {
        Self {
            place_name: feature.place_name.clone().unwrap_or_default(),
            relevance: feature.relevance.unwrap_or_default(),
            id: feature.id.clone(),
            place_type: feature.place_type.clone(),
        }
    }
}

/// A candidate enriched with coordinates, real or synthetic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecommendation {
    pub name: String,
    pub description: String,
    pub address: String,
    pub recommended_time: String,
    pub tips: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_result: Option<GeocodingMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl ResolvedRecommendation {
    /// Places a candidate at `coordinates`, substituting default text for
    /// any missing field
    pub fn new(candidate: Candidate, coordinates: Coordinates) -> Self {
        Self {
            name: candidate.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: candidate
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            address: candidate
                .address
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            recommended_time: candidate
                .recommended_time
                .unwrap_or_else(|| DEFAULT_RECOMMENDED_TIME.to_string()),
            tips: candidate.tips.unwrap_or_else(|| DEFAULT_TIPS.to_string()),
            coordinates,
            geocoding_result: None,
            geocoding_error: None,
            processing_error: None,
        }
    }

    pub fn with_match(mut self, matched: GeocodingMatch) -> Self {
        self.geocoding_result = Some(matched);
        self
    }

    pub fn with_geocoding_error(mut self, error: impl Into<String>) -> Self {
        self.geocoding_error = Some(error.into());
        self
    }

    pub fn with_processing_error(mut self, error: impl Into<String>) -> Self {
        self.processing_error = Some(error.into());
        self
    }
}

/// Inbound search request.
///
/// Fields are optional so that missing input is reported as a 400 with a
/// JSON body rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
}

/// Response body for a successful search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<ResolvedRecommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<Coordinates>,
}

/// Closes the ordered points into a loop for the directions provider.
///
/// Fewer than two points cannot form a route, so nothing is returned.
pub fn closed_loop_waypoints(recommendations: &[ResolvedRecommendation]) -> Vec<Coordinates> {
    if recommendations.len() < 2 {
        return Vec::new();
    }

    let mut waypoints: Vec<Coordinates> = recommendations.iter().map(|r| r.coordinates).collect();
    waypoints.push(waypoints[0]);
    waypoints
}
