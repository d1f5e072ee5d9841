use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Upstream rate limit: {0}")]
    RateLimited(String),

    #[error("Failed to process recommendations: {0}")]
    Parse(#[from] NormalizeError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::RateLimited(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::HttpClient(_) | AppError::Geocode(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Parse(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures turning a completion payload into candidate records
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("could not parse JSON from completion response: {0}")]
    Parse(String),

    #[error("invalid recommendations payload: {0}")]
    Validation(String),
}

/// Failures talking to the geocoding provider
#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    #[error("geocoding query cannot be empty")]
    EmptyQuery,

    #[error("geocoding provider rate limited the request")]
    RateLimited,

    #[error("Geocoding API error: {status} {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid geocoding response: {0}")]
    Decode(String),

    #[error("invalid geocoding endpoint: {0}")]
    Endpoint(String),

    #[error("geocoding failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GeocodeError>,
    },
}

impl GeocodeError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors other than 429 are deterministic rejections (bad token,
    /// malformed query) and are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeocodeError::RateLimited | GeocodeError::Transport(_) | GeocodeError::Decode(_) => {
                true
            }
            GeocodeError::Status { status, .. } => status.is_server_error(),
            GeocodeError::EmptyQuery
            | GeocodeError::Endpoint(_)
            | GeocodeError::RetriesExhausted { .. } => false,
        }
    }
}
