use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        best_match, closed_loop_waypoints, Candidate, Coordinates, GeocodeFeature, GeocodingMatch,
        ResolvedRecommendation,
    },
    services::{
        geocoder::Geocoder,
        normalizer,
        prompt,
        providers::CompletionProvider,
        retry::{retry_with_backoff, RetryError, RetryPolicy},
    },
};

/// Per-index step for placeholder coordinates when a place cannot be located
pub const FALLBACK_OFFSET_STEP: f64 = 0.005;

/// Per-index step used by the final pass for entries left without usable coordinates
pub const SAFETY_OFFSET_STEP: f64 = 0.01;

/// Deterministic placeholder for the candidate at `index`.
///
/// Strictly increasing in both axes with `index`, so no two placeholders
/// coincide and none sits exactly on the search center. Offsets are not
/// wrapped, so a center at the antimeridian yields longitudes just past 180.
pub fn synthetic_coordinates(center: Coordinates, index: usize) -> Coordinates {
    center.offset(FALLBACK_OFFSET_STEP * (index + 1) as f64)
}

/// Result of one search
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<ResolvedRecommendation>,
    /// Candidates handed to the resolver, after truncation
    pub candidate_count: usize,
}

impl RecommendationOutcome {
    /// Closed-loop route input for the directions provider
    pub fn waypoints(&self) -> Vec<Coordinates> {
        closed_loop_waypoints(&self.recommendations)
    }
}

/// Where a geocodable candidate ended up
#[derive(Debug)]
enum Placement {
    /// Primary query matched
    Matched(Coordinates, GeocodingMatch),
    /// Only the broader name + location query matched
    Broadened(Coordinates),
    /// Neither query returned a feature
    NotFound,
}

/// Generates and locates points of interest for a searched location.
///
/// One completion call proposes candidates; each candidate is then geocoded
/// in order. Only the completion and parsing steps can fail the request;
/// geocoding problems degrade the affected item to placeholder coordinates.
pub struct RecommendationService {
    completions: Arc<dyn CompletionProvider>,
    geocoder: Geocoder,
    completion_policy: RetryPolicy,
}

impl RecommendationService {
    pub fn new(
        completions: Arc<dyn CompletionProvider>,
        geocoder: Geocoder,
        completion_policy: RetryPolicy,
    ) -> Self {
        Self {
            completions,
            geocoder,
            completion_policy,
        }
    }

    pub async fn recommend(
        &self,
        location: &str,
        center: Coordinates,
    ) -> AppResult<RecommendationOutcome> {
        let raw = self.generate(location).await?;
        let candidates = normalizer::normalize(&raw)?;
        let candidate_count = candidates.len();

        let mut recommendations = Vec::with_capacity(candidate_count);
        for (index, candidate) in candidates.into_iter().enumerate() {
            let resolved = self.resolve_candidate(index, candidate, location, center).await;
            recommendations.push(resolved);
        }

        finalize(&mut recommendations, center);

        tracing::info!(
            location = %location,
            candidate_count,
            final_count = recommendations.len(),
            "Recommendations assembled"
        );

        for recommendation in &recommendations {
            tracing::debug!(
                name = %recommendation.name,
                longitude = recommendation.coordinates.longitude(),
                latitude = recommendation.coordinates.latitude(),
                "Final placement"
            );
        }

        Ok(RecommendationOutcome {
            recommendations,
            candidate_count,
        })
    }

    /// Asks the completion backend for candidates, backing off on 429s
    async fn generate(&self, location: &str) -> AppResult<String> {
        let user_prompt = prompt::build_prompt(location);

        tracing::info!(
            location = %location,
            provider = self.completions.name(),
            "Requesting recommendations"
        );

        retry_with_backoff(
            &self.completion_policy,
            "completion",
            |_| self.completions.complete(prompt::SYSTEM_INSTRUCTION, &user_prompt),
            |error: &AppError| matches!(error, AppError::RateLimited(_)),
        )
        .await
        .map_err(|error| match error {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(error) => error,
        })
    }

    /// Places one candidate; never fails, degrading to placeholder coordinates
    async fn resolve_candidate(
        &self,
        index: usize,
        candidate: Candidate,
        location: &str,
        center: Coordinates,
    ) -> ResolvedRecommendation {
        let fallback = synthetic_coordinates(center, index);

        let Some(queries) = candidate.geocode_queries(location) else {
            tracing::debug!(index, "Candidate lacks name or address, skipping geocoding");
            return ResolvedRecommendation::new(candidate, fallback);
        };

        tracing::info!(index, query = %queries.primary, "Geocoding candidate");

        let placement = self
            .place(&queries.primary, &queries.fallback, center)
            .await;

        match placement {
            Ok(Placement::Matched(coordinates, matched)) => {
                tracing::info!(
                    index,
                    place_name = %matched.place_name,
                    relevance = matched.relevance,
                    "Candidate geocoded"
                );
                ResolvedRecommendation::new(candidate, coordinates).with_match(matched)
            }
            Ok(Placement::Broadened(coordinates)) => {
                tracing::info!(
                    index,
                    query = %queries.fallback,
                    "Candidate geocoded with broader query"
                );
                ResolvedRecommendation::new(candidate, coordinates)
            }
            Ok(Placement::NotFound) => {
                tracing::info!(index, "No geocoding match, using offset coordinates");
                ResolvedRecommendation::new(candidate, fallback)
            }
            Err(AppError::Geocode(error)) => {
                tracing::warn!(index, error = %error, "Geocoding failed, using offset coordinates");
                ResolvedRecommendation::new(candidate, fallback)
                    .with_geocoding_error(error.to_string())
            }
            Err(error) => {
                tracing::error!(
                    index,
                    error = %error,
                    "Candidate processing failed, using offset coordinates"
                );
                ResolvedRecommendation::new(candidate, fallback)
                    .with_processing_error(error.to_string())
            }
        }
    }

    /// Tries the primary query, then the broader fallback query.
    ///
    /// Pacing between the two lookups comes from the geocoder's shared limiter.
    async fn place(
        &self,
        primary: &str,
        fallback: &str,
        center: Coordinates,
    ) -> AppResult<Placement> {
        let features = self.geocoder.resolve(primary, center).await?;
        if let Some(feature) = best_match(&features) {
            let coordinates = feature_coordinates(feature)?;
            return Ok(Placement::Matched(coordinates, GeocodingMatch::from(feature)));
        }

        tracing::debug!(query = %fallback, "Primary query found nothing, broadening");

        let features = self.geocoder.resolve(fallback, center).await?;
        match best_match(&features) {
            Some(feature) => Ok(Placement::Broadened(feature_coordinates(feature)?)),
            None => Ok(Placement::NotFound),
        }
    }
}

fn feature_coordinates(feature: &GeocodeFeature) -> AppResult<Coordinates> {
    feature.coordinates().ok_or_else(|| {
        AppError::Internal(format!(
            "geocoding feature {:?} has no usable center: {:?}",
            feature.place_name.as_deref().unwrap_or("<unnamed>"),
            feature.center
        ))
    })
}

/// Safety net: any entry whose coordinates are not finite numbers is moved to
/// `center + 0.01 * index`.
fn finalize(recommendations: &mut [ResolvedRecommendation], center: Coordinates) {
    for (index, recommendation) in recommendations.iter_mut().enumerate() {
        if !recommendation.coordinates.is_finite() {
            tracing::warn!(index, name = %recommendation.name, "Replacing invalid coordinates");
            recommendation.coordinates = center.offset(SAFETY_OFFSET_STEP * index as f64);
        }
    }
}
