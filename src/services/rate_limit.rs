use std::{num::NonZeroU32, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota};

/// Minimum-interval pacer shared by every outbound geocoding call.
///
/// The first acquisition passes immediately; each later one waits until
/// `min_interval` has elapsed since the previous slot. A zero interval means
/// no pacing at all.
pub struct RateLimiter {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(|quota| {
            DefaultDirectRateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))
        });
        Self { limiter }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    /// Waits for the next free slot and claims it
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };

        if limiter.check().is_err() {
            tracing::debug!("Pacing outbound geocoding request");
            limiter.until_ready().await;
        }
    }
}
