use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Coordinates, RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) =
        payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let (location, center) = validate(request)?;

    tracing::info!(
        request_id = %request_id,
        location = %location,
        longitude = center.longitude(),
        latitude = center.latitude(),
        "Processing recommendations request"
    );

    let outcome = state.recommender.recommend(&location, center).await?;
    let waypoints = outcome.waypoints();

    tracing::info!(
        request_id = %request_id,
        candidates = outcome.candidate_count,
        recommendations = outcome.recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        recommendations: outcome.recommendations,
        waypoints,
    }))
}

/// Checks the request before any external call is made
fn validate(request: RecommendationRequest) -> AppResult<(String, Coordinates)> {
    let location = request
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let (Some(location), Some(coordinates)) = (location, request.coordinates) else {
        return Err(AppError::InvalidInput(
            "Location and coordinates are required".to_string(),
        ));
    };

    let center = match coordinates.as_slice() {
        [longitude, latitude] => Coordinates::new(*longitude, *latitude),
        _ => {
            return Err(AppError::InvalidInput(
                "Coordinates must be a [longitude, latitude] pair".to_string(),
            ))
        }
    };

    if !center.is_valid() {
        return Err(AppError::InvalidInput(
            "Coordinates are out of range".to_string(),
        ));
    }

    Ok((location, center))
}
