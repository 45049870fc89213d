//! Provider contracts shared by every vendor adapter.
//!
//! Each vertical (flight, hotel, activity) has one object-safe trait whose
//! provided `search` method is the template every adapter inherits:
//! validate params, schedule the vendor call through the rate limiter
//! (flights add a retry loop), and wrap the outcome in a
//! [`ProviderResponse`]. The public contract is that `search` and
//! `health_check` never fail; every error is captured in the envelope.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::domain::{Activity, CabinClass, Flight, Hotel, UtcDateTime};
use crate::scheduler::RequestScheduler;
use crate::ValidationError;

/// Successful probes slower than this report `Degraded` instead of `Healthy`.
pub const DEGRADED_RESPONSE_TIME_MS: u64 = 2_000;

/// Travel inventory category served by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Flight,
    Hotel,
    Activity,
}

impl Vertical {
    pub const ALL: [Self; 3] = [Self::Flight, Self::Hotel, Self::Activity];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Activity => "activity",
        }
    }
}

impl Display for Vertical {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vertical {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flight" => Ok(Self::Flight),
            "hotel" => Ok(Self::Hotel),
            "activity" => Ok(Self::Activity),
            other => Err(ValidationError::InvalidVertical {
                value: other.to_owned(),
            }),
        }
    }
}

/// Normalized vendor-failure taxonomy. Adapters map every failure mode into
/// one of these variants at the point of catch; nothing else crosses the
/// provider boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("field '{field}' failed validation: {message}")]
    Validation { field: String, message: String },
    #[error("authentication rejected: {message}")]
    Authentication { message: String },
    #[error("rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        retry_after_secs: u64,
    },
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid vendor response: {message}")]
    InvalidResponse { message: String },
    #[error("{message}")]
    Unknown { message: String },
}

impl ProviderError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::RateLimitExceeded {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Http { .. } => "HTTP_ERROR",
            Self::InvalidResponse { .. } => "INVALID_RESPONSE",
            Self::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }

    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::Authentication { .. } => Some(401),
            Self::RateLimitExceeded { .. } => Some(429),
            Self::Http { status, .. } => Some(*status),
            Self::InvalidResponse { .. } | Self::Unknown { .. } => None,
        }
    }

    pub const fn retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub const fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Structured error payload carried by a failed [`ProviderResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub retryable: bool,
}

impl From<&ProviderError> for ResponseError {
    fn from(error: &ProviderError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            status_code: error.status_code(),
            retryable: error.retryable(),
        }
    }
}

/// Timing metadata attached to successful responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub timestamp: UtcDateTime,
    pub duration_ms: u64,
}

/// Discriminated success/error envelope, the sole result shape seen by
/// callers of `search()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl<T> ProviderResponse<T> {
    pub fn ok(data: T, duration_ms: u64) -> Self {
        Self {
            success: true,
            data,
            metadata: Some(ResponseMetadata {
                timestamp: UtcDateTime::now(),
                duration_ms,
            }),
            error: None,
        }
    }
}

impl<T: Default> ProviderResponse<T> {
    pub fn fail(error: &ProviderError) -> Self {
        Self {
            success: false,
            data: T::default(),
            metadata: None,
            error: Some(ResponseError::from(error)),
        }
    }
}

/// Latest health snapshot for one provider; the registry keeps only the most
/// recent value per provider, no history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealthCheck {
    pub status: HealthStatus,
    pub last_checked: UtcDateTime,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderHealthCheck {
    pub fn up(response_time_ms: u64) -> Self {
        let status = if response_time_ms > DEGRADED_RESPONSE_TIME_MS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        Self {
            status,
            last_checked: UtcDateTime::now(),
            response_time_ms,
            error: None,
        }
    }

    pub fn down(response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Down,
            last_checked: UtcDateTime::now(),
            response_time_ms,
            error: Some(error.into()),
        }
    }
}

/// Traveler counts for a flight search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Default for PassengerCounts {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

/// Flight search request. Dates are ISO `YYYY-MM-DD` strings; each adapter
/// owns its vendor's date formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    pub origin: String,
    pub destination: String,
    pub depart_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default)]
    pub passengers: PassengerCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin: Option<CabinClass>,
}

impl FlightSearchParams {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        depart_date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            depart_date: depart_date.into(),
            return_date: None,
            passengers: PassengerCounts::default(),
            cabin: None,
        }
    }

    /// Presence check for required fields. This is the single validation
    /// point; adapters must not re-validate.
    pub fn validate(&self) -> Result<(), ProviderError> {
        require_field("origin", &self.origin)?;
        require_field("destination", &self.destination)?;
        require_field("depart_date", &self.depart_date)?;
        Ok(())
    }
}

/// Hotel search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchParams {
    pub destination: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub rooms: u32,
}

impl HotelSearchParams {
    pub fn new(
        destination: impl Into<String>,
        check_in: impl Into<String>,
        check_out: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            check_in: check_in.into(),
            check_out: check_out.into(),
            guests: 2,
            rooms: 1,
        }
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        require_field("destination", &self.destination)?;
        require_field("check_in", &self.check_in)?;
        require_field("check_out", &self.check_out)?;
        Ok(())
    }
}

/// Activity search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySearchParams {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ActivitySearchParams {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            date: None,
            category: None,
        }
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        require_field("location", &self.location)
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        return Err(ProviderError::validation(field, "value is required"));
    }
    Ok(())
}

/// Boxed future shape used by all provider trait methods (object safety).
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Flight vendor contract. Adapters implement the `execute_*` hooks; the
/// provided `search`/`health_check` bodies are the orchestration every
/// flight vendor shares, including the retry loop. Retry is a flight-only
/// policy; hotel and activity searches are single-attempt.
pub trait FlightProvider: Send + Sync {
    fn vendor_name(&self) -> &str;
    fn config(&self) -> &ProviderConfig;
    fn scheduler(&self) -> &RequestScheduler;

    /// Vendor HTTP call and payload mapping. Runs inside the scheduler gate.
    fn execute_search<'a>(
        &'a self,
        params: &'a FlightSearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Flight>, ProviderError>>;

    /// Lightweight vendor probe (status or locations endpoint).
    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>>;

    fn search<'a>(
        &'a self,
        params: FlightSearchParams,
    ) -> ProviderFuture<'a, ProviderResponse<Vec<Flight>>> {
        Box::pin(async move {
            if let Err(error) = params.validate() {
                return ProviderResponse::fail(&error);
            }

            let retry = self.config().retry_config();
            let started = Instant::now();
            let mut attempt = 0u32;

            let result = loop {
                match self.scheduler().run(self.execute_search(&params)).await {
                    Ok(flights) => break Ok(flights),
                    Err(error) => {
                        if !error.retryable() || attempt >= retry.max_retries {
                            break Err(error);
                        }
                        let delay = retry.delay_for_attempt(attempt);
                        debug!(
                            vendor = self.vendor_name(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying flight search after {}",
                            error.code()
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            };

            let duration_ms = elapsed_ms(started);
            match result {
                Ok(flights) => ProviderResponse::ok(flights, duration_ms),
                Err(error) => {
                    warn!(
                        vendor = self.vendor_name(),
                        code = error.code(),
                        "flight search failed: {error}"
                    );
                    ProviderResponse::fail(&error)
                }
            }
        })
    }

    fn health_check<'a>(&'a self) -> ProviderFuture<'a, ProviderHealthCheck> {
        Box::pin(async move {
            let started = Instant::now();
            match self.execute_health_check().await {
                Ok(()) => ProviderHealthCheck::up(elapsed_ms(started)),
                Err(error) => ProviderHealthCheck::down(elapsed_ms(started), error.to_string()),
            }
        })
    }
}

/// Hotel vendor contract. Single-attempt search: no retry loop.
pub trait HotelProvider: Send + Sync {
    fn vendor_name(&self) -> &str;
    fn config(&self) -> &ProviderConfig;
    fn scheduler(&self) -> &RequestScheduler;

    fn execute_search<'a>(
        &'a self,
        params: &'a HotelSearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Hotel>, ProviderError>>;

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>>;

    fn search<'a>(
        &'a self,
        params: HotelSearchParams,
    ) -> ProviderFuture<'a, ProviderResponse<Vec<Hotel>>> {
        Box::pin(async move {
            if let Err(error) = params.validate() {
                return ProviderResponse::fail(&error);
            }

            let started = Instant::now();
            let result = self.scheduler().run(self.execute_search(&params)).await;
            let duration_ms = elapsed_ms(started);

            match result {
                Ok(hotels) => ProviderResponse::ok(hotels, duration_ms),
                Err(error) => {
                    warn!(
                        vendor = self.vendor_name(),
                        code = error.code(),
                        "hotel search failed: {error}"
                    );
                    ProviderResponse::fail(&error)
                }
            }
        })
    }

    fn health_check<'a>(&'a self) -> ProviderFuture<'a, ProviderHealthCheck> {
        Box::pin(async move {
            let started = Instant::now();
            match self.execute_health_check().await {
                Ok(()) => ProviderHealthCheck::up(elapsed_ms(started)),
                Err(error) => ProviderHealthCheck::down(elapsed_ms(started), error.to_string()),
            }
        })
    }
}

/// Activity vendor contract. Single-attempt search: no retry loop.
pub trait ActivityProvider: Send + Sync {
    fn vendor_name(&self) -> &str;
    fn config(&self) -> &ProviderConfig;
    fn scheduler(&self) -> &RequestScheduler;

    fn execute_search<'a>(
        &'a self,
        params: &'a ActivitySearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Activity>, ProviderError>>;

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>>;

    fn search<'a>(
        &'a self,
        params: ActivitySearchParams,
    ) -> ProviderFuture<'a, ProviderResponse<Vec<Activity>>> {
        Box::pin(async move {
            if let Err(error) = params.validate() {
                return ProviderResponse::fail(&error);
            }

            let started = Instant::now();
            let result = self.scheduler().run(self.execute_search(&params)).await;
            let duration_ms = elapsed_ms(started);

            match result {
                Ok(activities) => ProviderResponse::ok(activities, duration_ms),
                Err(error) => {
                    warn!(
                        vendor = self.vendor_name(),
                        code = error.code(),
                        "activity search failed: {error}"
                    );
                    ProviderResponse::fail(&error)
                }
            }
        })
    }

    fn health_check<'a>(&'a self) -> ProviderFuture<'a, ProviderHealthCheck> {
        Box::pin(async move {
            let started = Instant::now();
            match self.execute_health_check().await {
                Ok(()) => ProviderHealthCheck::up(elapsed_ms(started)),
                Err(error) => ProviderHealthCheck::down(elapsed_ms(started), error.to_string()),
            }
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
