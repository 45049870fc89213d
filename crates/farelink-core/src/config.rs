use std::time::Duration;

use crate::provider::Vertical;
use crate::retry::{Backoff, RetryConfig};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Vendor-imposed throughput limits. Only `requests_per_minute` drives the
/// scheduler; `requests_per_hour` is carried for operators that document an
/// hourly cap but is not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub requests_per_hour: Option<u32>,
}

impl RateLimitConfig {
    pub const fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour: None,
        }
    }
}

/// Immutable per-provider configuration, fixed at construction and owned
/// exclusively by the provider instance built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub vertical: Vertical,
    pub api_key: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub rate_limit: Option<RateLimitConfig>,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        vertical: Vertical,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vertical,
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            rate_limit: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Kiwi Tequila free-tier defaults.
    pub fn kiwi_default(api_key: impl Into<String>) -> Self {
        Self::new(
            "kiwi",
            Vertical::Flight,
            api_key,
            "https://api.tequila.kiwi.com",
        )
        .with_rate_limit(RateLimitConfig::per_minute(100))
    }

    /// Seats.aero partner API defaults.
    pub fn seatsaero_default(api_key: impl Into<String>) -> Self {
        Self::new(
            "seatsaero",
            Vertical::Flight,
            api_key,
            "https://seats.aero",
        )
        .with_rate_limit(RateLimitConfig::per_minute(60))
    }

    /// Point.me API defaults.
    pub fn pointme_default(api_key: impl Into<String>) -> Self {
        Self::new(
            "pointme",
            Vertical::Flight,
            api_key,
            "https://api.point.me",
        )
        .with_rate_limit(RateLimitConfig::per_minute(30))
    }

    /// RateHawk B2B defaults.
    pub fn ratehawk_default(api_key: impl Into<String>) -> Self {
        Self::new(
            "ratehawk",
            Vertical::Hotel,
            api_key,
            "https://api.worldota.net",
        )
        .with_rate_limit(RateLimitConfig::per_minute(120))
    }

    /// Viator partner API defaults. Activity vendors run without a reservoir.
    pub fn viator_default(api_key: impl Into<String>) -> Self {
        Self::new(
            "viator",
            Vertical::Activity,
            api_key,
            "https://api.viator.com",
        )
    }

    /// Retry schedule for this provider: `retry_delay_ms * 2^attempt`.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(self.retry_delay_ms),
                factor: 2.0,
                max: Duration::from_secs(60),
                jitter: false,
            },
        }
    }
}
