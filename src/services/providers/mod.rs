/// External service abstraction
///
/// The pipeline talks to two outside services: a generative text backend that
/// proposes places and a geocoder that locates them. Each sits behind a trait so
/// the vendor can be swapped and the pipeline tested without the network.
///
/// Implementations make exactly one HTTP attempt per call. Retries, backoff and
/// pacing live in the callers.
use crate::{
    error::{AppResult, GeocodeError},
    models::{Coordinates, GeocodeFeature},
};

pub mod mapbox;
pub mod openai;

pub use mapbox::MapboxProvider;
pub use openai::OpenAiProvider;

/// Trait for generative text backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one system instruction plus one user prompt and returns the
    /// text of the first answer.
    ///
    /// A 429 from the backend must surface as [`crate::error::AppError::RateLimited`]
    /// so callers can back off.
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for forward geocoders
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Looks up `query`, biased toward `proximity`, returning at most one
    /// feature. An empty list means the provider found nothing.
    async fn geocode(
        &self,
        query: &str,
        proximity: Coordinates,
    ) -> Result<Vec<GeocodeFeature>, GeocodeError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
