//! # Farelink Core
//!
//! Provider contracts and vendor adapters for the farelink travel
//! aggregation toolkit.
//!
//! ## Overview
//!
//! This crate is the provider abstraction and orchestration layer: it hides
//! heterogeneous third-party travel APIs (flights, hotels, activities)
//! behind one canonical interface so downstream search logic never needs
//! vendor-specific knowledge.
//!
//! - **Canonical domain models** for flights (with multi-modal pricing
//!   options), hotels, and activities
//! - **Provider traits** per vertical with a shared search template:
//!   validate, rate-limit, retry (flights), wrap in an envelope
//! - **Vendor adapters** for Kiwi, Seats.aero, Point.me, RateHawk, and
//!   Viator
//! - **Request scheduler** bounding concurrency and throughput per provider
//! - **Provider registry** for fan-out search and health monitoring
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Vendor adapters (Kiwi, Seats.aero, Point.me, RateHawk, Viator) |
//! | [`config`] | Per-provider configuration |
//! | [`domain`] | Canonical models (Flight, Hotel, Activity, PricingOption) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Provider traits, search params, response envelopes |
//! | [`registry`] | Provider directory, fan-out search, health loop |
//! | [`retry`] | Backoff schedules |
//! | [`scheduler`] | Per-provider rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use farelink_core::{
//!     FlightSearchParams, ProviderRegistryBuilder, DEFAULT_HEALTH_CHECK_INTERVAL,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(ProviderRegistryBuilder::new().with_env_keys().build());
//!     registry.start_health_check_loop(DEFAULT_HEALTH_CHECK_INTERVAL);
//!
//!     let params = FlightSearchParams::new("LHR", "JFK", "2026-09-01");
//!     for entry in registry.search_flights_across_providers(params).await {
//!         match entry.outcome {
//!             Ok(response) if response.success => {
//!                 println!("{}: {} flights", entry.provider, response.data.len());
//!             }
//!             Ok(response) => {
//!                 println!("{}: {:?}", entry.provider, response.error);
//!             }
//!             Err(error) => println!("{}: task failed: {error}", entry.provider),
//!         }
//!     }
//!
//!     registry.stop_health_check_loop();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Caller / API    │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ ProviderRegistry │  fan-out, health loop
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ Provider traits  │────▶│ RequestScheduler │
//! │ (search template)│     │ + retry (flight) │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ Vendor adapters  │────▶│ HTTP client      │
//! │ (typed payloads) │     │ (reqwest/noop)   │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Canonical models │
//! │ (Flight, Hotel)  │
//! └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! `search()` and `health_check()` never fail at the call boundary: every
//! vendor failure is normalized into the [`provider::ProviderError`]
//! taxonomy and carried inside the response envelope. The one deliberate
//! exception is [`registry::RegistryError`] for missing registrations,
//! which fails fast during wiring.
//!
//! ## Security
//!
//! - API keys are read from environment variables only (never logged)
//! - Input validation on all canonical domain types

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod scheduler;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{
    KiwiProvider, PointMeProvider, RateHawkProvider, SeatsAeroProvider, ViatorProvider,
};

// Configuration
pub use config::{ProviderConfig, RateLimitConfig};

// Domain models
pub use domain::{
    Activity, CabinClass, Flight, FlightSegment, Hotel, PricingKind, PricingOption, UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Provider contracts
pub use provider::{
    ActivityProvider, ActivitySearchParams, FlightProvider, FlightSearchParams, HealthStatus,
    HotelProvider, HotelSearchParams, PassengerCounts, ProviderError, ProviderHealthCheck,
    ProviderResponse, ResponseError, ResponseMetadata, Vertical,
};

// Registry
pub use registry::{
    FanOutEntry, ProviderRegistry, ProviderRegistryBuilder, RegistryError,
    DEFAULT_HEALTH_CHECK_INTERVAL,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Scheduling
pub use scheduler::{RequestScheduler, DEFAULT_REQUESTS_PER_MINUTE, MAX_CONCURRENT};
