//! Shared test doubles for registry behavior tests.

use std::sync::atomic::{AtomicU32, Ordering};

use farelink_core::provider::ProviderFuture;
use farelink_core::{
    Flight, FlightProvider, FlightSearchParams, ProviderConfig, ProviderError, RateLimitConfig,
    RequestScheduler, Vertical,
};

/// How a [`StubFlightProvider`] behaves when searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    Success,
    Fail,
    Panic,
}

/// Scriptable in-memory flight provider counting searches and health probes.
pub struct StubFlightProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    mode: StubMode,
    searches: AtomicU32,
    probes: AtomicU32,
}

impl StubFlightProvider {
    pub fn new(name: &str, mode: StubMode) -> Self {
        let config = ProviderConfig::new(name, Vertical::Flight, "key", "https://example.test")
            .with_rate_limit(RateLimitConfig::per_minute(60_000))
            .with_retries(0, 10);
        let scheduler = RequestScheduler::from_config(&config);
        Self {
            config,
            scheduler,
            mode,
            searches: AtomicU32::new(0),
            probes: AtomicU32::new(0),
        }
    }

    pub fn searches(&self) -> u32 {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    fn flight(&self) -> Flight {
        Flight::new(
            format!("{}-1", self.config.name),
            self.config.name.clone(),
            "LHR",
            "JFK",
            "2026-09-01T09:00:00Z",
            "2026-09-01T12:00:00Z",
            321.0,
            "USD",
        )
        .expect("stub flight is valid")
    }
}

impl FlightProvider for StubFlightProvider {
    fn vendor_name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    fn execute_search<'a>(
        &'a self,
        _params: &'a FlightSearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Flight>, ProviderError>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode;
        let flight = self.flight();
        Box::pin(async move {
            match mode {
                StubMode::Success => Ok(vec![flight]),
                StubMode::Fail => Err(ProviderError::http(500, "stub is configured to fail")),
                StubMode::Panic => panic!("stub is configured to panic"),
            }
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode;
        Box::pin(async move {
            match mode {
                StubMode::Fail => Err(ProviderError::http(500, "stub probe failure")),
                _ => Ok(()),
            }
        })
    }
}
