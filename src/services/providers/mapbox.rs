/// Mapbox forward geocoding provider
///
/// API Flow:
/// GET /geocoding/v5/mapbox.places/{query}.json?access_token=..&limit=1&proximity=lng,lat
///
/// The query travels as a percent-encoded path segment. Only the single best
/// feature is requested; proximity biases ties toward the searched location.
use std::time::Duration;

use reqwest::{header::CACHE_CONTROL, Client as HttpClient, StatusCode, Url};

use crate::{
    error::GeocodeError,
    models::{Coordinates, GeocodeFeature, GeocodeResponse},
    services::providers::GeocodingProvider,
};

const RESULT_LIMIT: &str = "1";
const CACHE_POLICY: &str = "max-age=3600";

#[derive(Clone)]
pub struct MapboxProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: Url,
}

impl MapboxProvider {
    pub fn new(access_token: String, api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| anyhow::anyhow!("Invalid Mapbox API URL {}: {}", api_url, e))?;

        if api_url.cannot_be_a_base() {
            anyhow::bail!("Mapbox API URL {} cannot be used as a base", api_url);
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            access_token,
            api_url,
        })
    }

    /// Builds the forward geocoding URL with the query as a path segment
    fn forward_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let file = format!("{}.json", query);
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Endpoint(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for MapboxProvider {
    async fn geocode(
        &self,
        query: &str,
        proximity: Coordinates,
    ) -> Result<Vec<GeocodeFeature>, GeocodeError> {
        let url = self.forward_url(query)?;
        let proximity = proximity.to_query_param();

        let response = self
            .http_client
            .get(url)
            .header(CACHE_CONTROL, CACHE_POLICY)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("limit", RESULT_LIMIT),
                ("proximity", proximity.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status { status, body });
        }

        let response_text = response.text().await?;
        tracing::debug!(query = %query, response = %response_text, "Raw geocoding response");

        let parsed: GeocodeResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;

        Ok(parsed.features)
    }

    fn name(&self) -> &'static str {
        "mapbox"
    }
}
