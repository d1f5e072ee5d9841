use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    routing::post,
    Router,
};
use axum_test::TestServer;
use serde_json::{json, Value};

use yourdayin_api::{
    error::{AppResult, GeocodeError},
    models::{Coordinates, GeocodeFeature},
    routes::{create_router, AppState},
    services::{
        providers::{CompletionProvider, GeocodingProvider, OpenAiProvider},
        Geocoder, RateLimiter, RecommendationService, RetryPolicy,
    },
};

/// Completion backend that always answers with the same text
struct CannedCompletion {
    content: String,
    calls: Arc<Mutex<usize>>,
}

#[async_trait::async_trait]
impl CompletionProvider for CannedCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> AppResult<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.content.clone())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

/// Geocoder that places known names and finds nothing for the rest
struct KnownPlaces {
    places: Vec<(&'static str, f64, f64)>,
    queries: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl GeocodingProvider for KnownPlaces {
    async fn geocode(
        &self,
        query: &str,
        _proximity: Coordinates,
    ) -> Result<Vec<GeocodeFeature>, GeocodeError> {
        self.queries.lock().unwrap().push(query.to_string());

        Ok(self
            .places
            .iter()
            .filter(|(name, _, _)| query.starts_with(name))
            .map(|(name, lng, lat)| GeocodeFeature {
                id: Some(format!("poi.{}", name.len())),
                place_type: vec!["poi".to_string()],
                relevance: Some(0.95),
                place_name: Some(format!("{}, Paris, France", name)),
                center: Some(vec![*lng, *lat]),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "known-places"
    }
}

struct Harness {
    server: TestServer,
    completion_calls: Arc<Mutex<usize>>,
    geocode_queries: Arc<Mutex<Vec<String>>>,
}

fn geocoder(places: Vec<(&'static str, f64, f64)>, queries: Arc<Mutex<Vec<String>>>) -> Geocoder {
    Geocoder::new(
        Arc::new(KnownPlaces { places, queries }),
        Arc::new(RateLimiter::unlimited()),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
}

fn create_test_server(content: String, places: Vec<(&'static str, f64, f64)>) -> Harness {
    let completion_calls = Arc::new(Mutex::new(0));
    let geocode_queries = Arc::new(Mutex::new(Vec::new()));

    let service = RecommendationService::new(
        Arc::new(CannedCompletion {
            content,
            calls: completion_calls.clone(),
        }),
        geocoder(places, geocode_queries.clone()),
        RetryPolicy::new(1, Duration::from_millis(1)),
    );

    let app = create_router(AppState::new(service));

    Harness {
        server: TestServer::new(app).unwrap(),
        completion_calls,
        geocode_queries,
    }
}

fn place(name: &str, address: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} is worth the visit.", name),
        "address": address,
        "recommendedTime": "1-2 hours",
        "tips": "Arrive early"
    })
}

fn paris_places() -> Vec<Value> {
    vec![
        place("Louvre Museum", "Rue de Rivoli, 75001 Paris"),
        place("Eiffel Tower", "Champ de Mars, 5 Av. Anatole France"),
        place("Notre-Dame", "6 Parvis Notre-Dame"),
        place("Sacré-Cœur", "35 Rue du Chevalier de la Barre"),
        place("Musée d'Orsay", "1 Rue de la Légion d'Honneur"),
    ]
}

fn all_paris_known() -> Vec<(&'static str, f64, f64)> {
    vec![
        ("Louvre Museum", 2.3376, 48.8606),
        ("Eiffel Tower", 2.2945, 48.8584),
        ("Notre-Dame", 2.3499, 48.8530),
        ("Sacré-Cœur", 2.3431, 48.8867),
        ("Musée d'Orsay", 2.3266, 48.8600),
    ]
}

fn paris_request() -> Value {
    json!({ "location": "Paris", "coordinates": [2.35, 48.86] })
}

fn coordinates_of(item: &Value) -> (f64, f64) {
    let pair = item["coordinates"].as_array().unwrap();
    assert_eq!(pair.len(), 2);
    (pair[0].as_f64().unwrap(), pair[1].as_f64().unwrap())
}

fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
    assert!(
        (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test]
async fn test_health_check() {
    let harness = create_test_server("[]".to_string(), Vec::new());
    let response = harness.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_paris_returns_five_geocoded_places_in_order() {
    let harness = create_test_server(json!(paris_places()).to_string(), all_paris_known());

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let recommendations = body["recommendations"].as_array().unwrap();

    assert_eq!(recommendations.len(), 5);
    let names: Vec<&str> = recommendations
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Louvre Museum", "Eiffel Tower", "Notre-Dame", "Sacré-Cœur", "Musée d'Orsay"]
    );

    assert_eq!(coordinates_of(&recommendations[1]), (2.2945, 48.8584));
    assert_eq!(
        recommendations[0]["geocodingResult"]["placeName"],
        "Louvre Museum, Paris, France"
    );
    assert_eq!(recommendations[0]["geocodingResult"]["relevance"], 0.95);
    assert_eq!(recommendations[0]["recommendedTime"], "1-2 hours");

    let waypoints = body["waypoints"].as_array().unwrap();
    assert_eq!(waypoints.len(), 6);
    assert_eq!(waypoints[0], waypoints[5]);

    assert_eq!(*harness.completion_calls.lock().unwrap(), 1);
    assert_eq!(
        harness.geocode_queries.lock().unwrap()[0],
        "Louvre Museum, Rue de Rivoli, 75001 Paris, Paris"
    );
}

#[tokio::test]
async fn test_fenced_wrapped_response_yields_three_items() {
    let payload = json!({ "recommendations": &paris_places()[..3] });
    let content = format!("```json\n{}\n```", payload);
    let harness = create_test_server(content, all_paris_known());

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unlocatable_place_gets_offset_coordinates() {
    let places = vec![
        place("Louvre Museum", "Rue de Rivoli"),
        place("Le Jardin Secret", "Nowhere"),
    ];
    let harness = create_test_server(
        json!(places).to_string(),
        vec![("Louvre Museum", 2.3376, 48.8606)],
    );

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let unlocated = &body["recommendations"][1];

    assert_close(coordinates_of(unlocated), (2.35 + 0.005 * 2.0, 48.86 + 0.005 * 2.0));
    assert!(unlocated.get("geocodingResult").is_none());

    let queries = harness.geocode_queries.lock().unwrap();
    assert_eq!(
        queries.as_slice(),
        [
            "Louvre Museum, Rue de Rivoli, Paris",
            "Le Jardin Secret, Nowhere, Paris",
            "Le Jardin Secret, Paris",
        ]
    );
}

#[tokio::test]
async fn test_incomplete_candidate_is_never_geocoded() {
    let places = json!([
        { "name": "Street Market", "description": "Busy on Sundays" },
        place("Louvre Museum", "Rue de Rivoli"),
    ]);
    let harness = create_test_server(places.to_string(), all_paris_known());

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let market = &body["recommendations"][0];

    assert_close(coordinates_of(market), (2.355, 48.865));
    assert_eq!(market["address"], "No address available");
    assert!(harness
        .geocode_queries
        .lock()
        .unwrap()
        .iter()
        .all(|q| !q.starts_with("Street Market")));
}

#[tokio::test]
async fn test_missing_location_rejected_without_calls() {
    let harness = create_test_server(json!(paris_places()).to_string(), all_paris_known());

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&json!({ "coordinates": [2.35, 48.86] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Location and coordinates are required");
    assert!(body.get("recommendations").is_none());
    assert_eq!(*harness.completion_calls.lock().unwrap(), 0);
    assert!(harness.geocode_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let harness = create_test_server("[]".to_string(), Vec::new());

    let response = harness
        .server
        .post("/api/recommendations")
        .text("{location: Paris")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unparseable_completion_is_server_error() {
    let harness = create_test_server("Sorry, I cannot help with that.".to_string(), Vec::new());

    let response = harness
        .server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body.get("recommendations").is_none());
}

#[tokio::test]
async fn test_completion_backend_failure_is_server_error() {
    let backend = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });

    let completions = OpenAiProvider::new(
        "sk-test".to_string(),
        backend_url,
        "gpt-4o-mini".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    let queries = Arc::new(Mutex::new(Vec::new()));
    let service = RecommendationService::new(
        Arc::new(completions),
        geocoder(all_paris_known(), queries.clone()),
        RetryPolicy::new(3, Duration::from_millis(1)),
    );
    let server = TestServer::new(create_router(AppState::new(service))).unwrap();

    let response = server
        .post("/api/recommendations")
        .json(&paris_request())
        .await;

    assert!(response.status_code().is_server_error());
    let body: Value = response.json();
    assert!(body["error"].is_string());
    assert!(body.get("recommendations").is_none());
    assert!(queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_id_round_trip() {
    let harness = create_test_server("[]".to_string(), Vec::new());

    let response = harness
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("search-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "search-42");

    let response = harness.server.get("/health").await;
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}
