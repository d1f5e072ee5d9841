pub mod completion;
pub mod geocoding;
pub mod recommendation;

pub use completion::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat};
pub use geocoding::{best_match, GeocodeFeature, GeocodeResponse};
pub use recommendation::{
    closed_loop_waypoints, Candidate, Coordinates, GeocodeQueries, GeocodingMatch,
    RecommendationRequest, RecommendationResponse, ResolvedRecommendation,
};
