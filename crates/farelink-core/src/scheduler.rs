use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;

use crate::config::ProviderConfig;
use crate::provider::Vertical;

/// Concurrency cap applied to every provider instance.
pub const MAX_CONCURRENT: usize = 5;
/// Dispatch rate assumed when a provider config carries no rate limit.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-provider throughput governor. Every outbound vendor call runs through
/// [`RequestScheduler::run`], which suspends at the gate until capacity frees;
/// calls are queued, never rejected. The wait queue is unbounded.
///
/// Two limiters sit behind the semaphore: a pacing limiter enforcing the
/// minimum gap between dispatches, and an optional reservoir bounding calls
/// per window. Flight and hotel schedulers carry a reservoir; activity
/// schedulers run on pacing alone.
pub struct RequestScheduler {
    concurrency: Semaphore,
    pacing: DirectRateLimiter,
    reservoir: Option<DirectRateLimiter>,
}

impl RequestScheduler {
    /// Production entry point: a 60-second window sized from the provider's
    /// configured requests-per-minute.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let limit = config
            .rate_limit
            .as_ref()
            .map(|rate| rate.requests_per_minute)
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        let with_reservoir = config.vertical != Vertical::Activity;

        Self::new(Duration::from_secs(60), limit, with_reservoir)
    }

    /// Window-parameterized constructor; tests compress the window to keep
    /// refill waits observable in milliseconds.
    pub fn new(window: Duration, limit: u32, with_reservoir: bool) -> Self {
        let safe_limit = limit.max(1);
        let window_ms = (window.as_millis() as u64).max(1);

        // Minimum gap between dispatches: ceil(window / limit).
        let gap_ms = (window_ms + u64::from(safe_limit) - 1) / u64::from(safe_limit);
        let pacing_quota = Quota::with_period(Duration::from_millis(gap_ms.max(1)))
            .expect("pacing period is always greater than zero")
            .allow_burst(NonZeroU32::MIN);

        let reservoir = with_reservoir.then(|| {
            RateLimiter::direct(quota_from_window(Duration::from_millis(window_ms), safe_limit))
        });

        Self {
            concurrency: Semaphore::new(MAX_CONCURRENT),
            pacing: RateLimiter::direct(pacing_quota),
            reservoir,
        }
    }

    /// Runs `fut` once a concurrency slot and rate budget are available.
    /// The slot is held for the full duration of `fut`.
    pub async fn run<F: std::future::Future>(&self, fut: F) -> F::Output {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .expect("scheduler semaphore is never closed");

        self.pacing.until_ready().await;
        if let Some(reservoir) = &self.reservoir {
            reservoir.until_ready().await;
        }

        fut.await
    }

    pub fn has_reservoir(&self) -> bool {
        self.reservoir.is_some()
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit.max(1)).expect("limit is clamped to non-zero");

    let seconds_per_cell = (window.as_secs_f64() / f64::from(limit.max(1))).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}
