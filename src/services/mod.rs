pub mod geocoder;
pub mod normalizer;
pub mod prompt;
pub mod providers;
pub mod rate_limit;
pub mod recommendations;
pub mod retry;

pub use geocoder::Geocoder;
pub use rate_limit::RateLimiter;
pub use recommendations::{RecommendationOutcome, RecommendationService};
pub use retry::RetryPolicy;
