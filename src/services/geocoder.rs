use std::sync::Arc;

use crate::{
    error::GeocodeError,
    models::{Coordinates, GeocodeFeature},
    services::{
        providers::GeocodingProvider,
        rate_limit::RateLimiter,
        retry::{retry_with_backoff, RetryError, RetryPolicy},
    },
};

/// Resolves free-text place descriptions into geocoder features.
///
/// Every attempt first claims a slot from the shared [`RateLimiter`], so
/// sequential lookups (and concurrent requests) never hit the provider faster
/// than its pacing allows. Failed attempts are retried with exponential
/// backoff according to the [`RetryPolicy`].
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl Geocoder {
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            limiter,
            policy,
        }
    }

    /// Resolves `query` near `center` with the configured retry policy
    pub async fn resolve(
        &self,
        query: &str,
        center: Coordinates,
    ) -> Result<Vec<GeocodeFeature>, GeocodeError> {
        self.resolve_with(query, center, &self.policy).await
    }

    /// Resolves `query` near `center` with an explicit retry policy
    pub async fn resolve_with(
        &self,
        query: &str,
        center: Coordinates,
        policy: &RetryPolicy,
    ) -> Result<Vec<GeocodeFeature>, GeocodeError> {
        if query.trim().is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let provider = self.provider.name();

        let result = retry_with_backoff(
            policy,
            "geocode",
            |attempt| async move {
                self.limiter.acquire().await;
                tracing::debug!(query = %query, attempt, provider, "Geocoding attempt");

                let outcome = self.provider.geocode(query, center).await;
                if let Err(GeocodeError::RateLimited) = &outcome {
                    tracing::warn!(query = %query, attempt, provider, "Geocoding rate limit hit");
                }
                outcome
            },
            GeocodeError::is_retryable,
        )
        .await;

        match result {
            Ok(features) => {
                tracing::debug!(query = %query, features = features.len(), "Geocoding completed");
                Ok(features)
            }
            Err(RetryError::Exhausted { attempts, last }) => Err(GeocodeError::RetriesExhausted {
                attempts,
                source: Box::new(last),
            }),
            Err(RetryError::Aborted(error)) => Err(error),
        }
    }
}
