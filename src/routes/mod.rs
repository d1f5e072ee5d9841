use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        providers::{CompletionProvider, GeocodingProvider, MapboxProvider, OpenAiProvider},
        Geocoder, RateLimiter, RecommendationService,
    },
};

pub mod recommendations;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(recommender: RecommendationService) -> Self {
        Self {
            recommender: Arc::new(recommender),
        }
    }

    /// Wires the OpenAI and Mapbox providers from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let completions: Arc<dyn CompletionProvider> = Arc::new(
            OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_api_url.clone(),
                config.openai_model.clone(),
                config.http_timeout(),
            )?
            .with_sampling(config.openai_temperature, config.openai_max_tokens),
        );

        let geocoding: Arc<dyn GeocodingProvider> = Arc::new(MapboxProvider::new(
            config.mapbox_access_token.clone(),
            &config.mapbox_api_url,
            config.http_timeout(),
        )?);

        let geocoder = Geocoder::new(
            geocoding,
            Arc::new(RateLimiter::new(config.geocode_min_interval())),
            config.geocode_retry_policy(),
        );

        Ok(Self::new(RecommendationService::new(
            completions,
            geocoder,
            config.completion_retry_policy(),
        )))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new().route("/recommendations", post(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
