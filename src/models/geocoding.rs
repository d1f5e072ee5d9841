use serde::{Deserialize, Serialize};

use super::Coordinates;

// ============================================================================
// Mapbox Geocoding API Types
// ============================================================================

/// Forward geocoding response (a GeoJSON feature collection)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

/// One candidate match returned by the geocoder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeFeature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub place_type: Vec<String>,
    #[serde(default)]
    pub relevance: Option<f64>,
    #[serde(default)]
    pub place_name: Option<String>,
    /// `[lng, lat]`; kept loose so a malformed center is caught per item
    #[serde(default)]
    pub center: Option<Vec<f64>>,
}

impl GeocodeFeature {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self.center.as_deref() {
            Some([lng, lat]) => Some(Coordinates::new(*lng, *lat)).filter(Coordinates::is_valid),
            _ => None,
        }
    }
}

/// Highest-relevance feature; the earliest one wins ties.
pub fn best_match(features: &[GeocodeFeature]) -> Option<&GeocodeFeature> {
    features.iter().reduce(|best, feature| {
        if feature.relevance.unwrap_or_default() > best.relevance.unwrap_or_default() {
            feature
        } else {
            best
        }
    })
}
