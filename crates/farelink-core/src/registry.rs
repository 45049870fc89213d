//! Process-wide provider directory and search coordinator.
//!
//! The registry is an explicit, constructed object owned by the
//! application's composition root: `register_*` at startup,
//! `stop_health_check_loop` at shutdown, passed by reference (or `Arc`) to
//! whatever consumes it. Provider maps mutate only through registration;
//! steady-state search traffic only reads them.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapters::{
    KiwiProvider, PointMeProvider, RateHawkProvider, SeatsAeroProvider, ViatorProvider,
};
use crate::config::ProviderConfig;
use crate::domain::{Activity, Flight, Hotel};
use crate::http_client::NoopHttpClient;
use crate::provider::{
    ActivityProvider, ActivitySearchParams, FlightProvider, FlightSearchParams, HotelProvider,
    HotelSearchParams, ProviderHealthCheck, ProviderResponse, Vertical,
};

/// Cadence of the periodic health loop unless the caller overrides it.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Infrastructure misconfiguration, deliberately surfaced as an error rather
/// than a [`ProviderResponse`] envelope: a missing registration should fail
/// fast during integration wiring, not masquerade as a vendor failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no {vertical} provider available")]
    NoProvider { vertical: Vertical },
}

/// One provider's fan-out result. `outcome` is `Err` only when the search
/// task itself died (a panic); providers report their own failures inside
/// the response envelope.
#[derive(Debug)]
pub struct FanOutEntry<T> {
    pub provider: String,
    pub outcome: Result<ProviderResponse<Vec<T>>, String>,
}

/// Directory of provider instances keyed by vendor name, one map per
/// vertical, plus the last-known health snapshot per provider.
pub struct ProviderRegistry {
    flight_providers: RwLock<HashMap<String, Arc<dyn FlightProvider>>>,
    hotel_providers: RwLock<HashMap<String, Arc<dyn HotelProvider>>>,
    activity_providers: RwLock<HashMap<String, Arc<dyn ActivityProvider>>>,
    health: RwLock<HashMap<String, ProviderHealthCheck>>,
    health_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            flight_providers: RwLock::new(HashMap::new()),
            hotel_providers: RwLock::new(HashMap::new()),
            activity_providers: RwLock::new(HashMap::new()),
            health: RwLock::new(HashMap::new()),
            health_loop: Mutex::new(None),
        }
    }

    /// Registration replaces any prior instance under the same name.
    pub fn register_flight_provider(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn FlightProvider>,
    ) {
        self.flight_providers
            .write()
            .expect("registry lock is not poisoned")
            .insert(name.into(), provider);
    }

    pub fn register_hotel_provider(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn HotelProvider>,
    ) {
        self.hotel_providers
            .write()
            .expect("registry lock is not poisoned")
            .insert(name.into(), provider);
    }

    pub fn register_activity_provider(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn ActivityProvider>,
    ) {
        self.activity_providers
            .write()
            .expect("registry lock is not poisoned")
            .insert(name.into(), provider);
    }

    /// Registered vendor names for one vertical, sorted.
    pub fn list_providers(&self, vertical: Vertical) -> Vec<String> {
        match vertical {
            Vertical::Flight => Self::sorted_names(&self.flight_providers),
            Vertical::Hotel => Self::sorted_names(&self.hotel_providers),
            Vertical::Activity => Self::sorted_names(&self.activity_providers),
        }
    }

    /// Single-provider flight search. With no vendor name the first
    /// registered provider (by name) is used.
    pub async fn search_flights(
        &self,
        params: FlightSearchParams,
        vendor: Option<&str>,
    ) -> Result<ProviderResponse<Vec<Flight>>, RegistryError> {
        let provider = Self::pick(&self.flight_providers, vendor, Vertical::Flight)?;
        Ok(provider.search(params).await)
    }

    pub async fn search_hotels(
        &self,
        params: HotelSearchParams,
        vendor: Option<&str>,
    ) -> Result<ProviderResponse<Vec<Hotel>>, RegistryError> {
        let provider = Self::pick(&self.hotel_providers, vendor, Vertical::Hotel)?;
        Ok(provider.search(params).await)
    }

    pub async fn search_activities(
        &self,
        params: ActivitySearchParams,
        vendor: Option<&str>,
    ) -> Result<ProviderResponse<Vec<Activity>>, RegistryError> {
        let provider = Self::pick(&self.activity_providers, vendor, Vertical::Activity)?;
        Ok(provider.search(params).await)
    }

    /// Fan-out flight search: every registered provider is queried
    /// concurrently and every provider yields exactly one entry, in sorted
    /// vendor-name order. One provider's failure never drops or blocks
    /// results from its siblings.
    pub async fn search_flights_across_providers(
        &self,
        params: FlightSearchParams,
    ) -> Vec<FanOutEntry<Flight>> {
        let providers = Self::sorted_entries(&self.flight_providers);
        let mut handles = Vec::with_capacity(providers.len());
        for (name, provider) in providers {
            let params = params.clone();
            handles.push((
                name,
                tokio::spawn(async move { provider.search(params).await }),
            ));
        }
        Self::settle(handles).await
    }

    pub async fn search_hotels_across_providers(
        &self,
        params: HotelSearchParams,
    ) -> Vec<FanOutEntry<Hotel>> {
        let providers = Self::sorted_entries(&self.hotel_providers);
        let mut handles = Vec::with_capacity(providers.len());
        for (name, provider) in providers {
            let params = params.clone();
            handles.push((
                name,
                tokio::spawn(async move { provider.search(params).await }),
            ));
        }
        Self::settle(handles).await
    }

    pub async fn search_activities_across_providers(
        &self,
        params: ActivitySearchParams,
    ) -> Vec<FanOutEntry<Activity>> {
        let providers = Self::sorted_entries(&self.activity_providers);
        let mut handles = Vec::with_capacity(providers.len());
        for (name, provider) in providers {
            let params = params.clone();
            handles.push((
                name,
                tokio::spawn(async move { provider.search(params).await }),
            ));
        }
        Self::settle(handles).await
    }

    /// Probes every registered provider across all verticals concurrently,
    /// refreshes the last-known-health map with each completed probe, and
    /// returns the updated map. A probe task that dies is logged and its
    /// entry left at the previous snapshot for this round.
    pub async fn check_all_health(&self) -> HashMap<String, ProviderHealthCheck> {
        let mut handles: Vec<(String, JoinHandle<ProviderHealthCheck>)> = Vec::new();

        for (name, provider) in Self::sorted_entries(&self.flight_providers) {
            handles.push((
                health_key(Vertical::Flight, &name),
                tokio::spawn(async move { provider.health_check().await }),
            ));
        }
        for (name, provider) in Self::sorted_entries(&self.hotel_providers) {
            handles.push((
                health_key(Vertical::Hotel, &name),
                tokio::spawn(async move { provider.health_check().await }),
            ));
        }
        for (name, provider) in Self::sorted_entries(&self.activity_providers) {
            handles.push((
                health_key(Vertical::Activity, &name),
                tokio::spawn(async move { provider.health_check().await }),
            ));
        }

        for (key, handle) in handles {
            match handle.await {
                Ok(check) => {
                    debug!(provider = key.as_str(), status = ?check.status, "health refreshed");
                    self.health
                        .write()
                        .expect("registry lock is not poisoned")
                        .insert(key, check);
                }
                Err(error) => {
                    warn!(provider = key.as_str(), "health probe task failed: {error}");
                }
            }
        }

        self.health_snapshot()
    }

    /// Last-known health per provider, keyed `vertical:vendor`.
    pub fn health_snapshot(&self) -> HashMap<String, ProviderHealthCheck> {
        self.health
            .read()
            .expect("registry lock is not poisoned")
            .clone()
    }

    /// Starts the periodic health loop. Idempotent: a second start while the
    /// loop is running is a no-op, so there is never more than one timer.
    pub fn start_health_check_loop(self: &Arc<Self>, interval: Duration) {
        let mut guard = self
            .health_loop
            .lock()
            .expect("registry lock is not poisoned");

        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                debug!("health check loop already running");
                return;
            }
        }

        let registry = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval fires immediately; consume that tick so the first
            // probe happens one interval after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.check_all_health().await;
            }
        }));
    }

    /// Stops the health loop if it is running. Idempotent.
    pub fn stop_health_check_loop(&self) {
        let handle = self
            .health_loop
            .lock()
            .expect("registry lock is not poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn pick<P: ?Sized>(
        providers: &RwLock<HashMap<String, Arc<P>>>,
        vendor: Option<&str>,
        vertical: Vertical,
    ) -> Result<Arc<P>, RegistryError> {
        let map = providers.read().expect("registry lock is not poisoned");
        let selected = match vendor {
            Some(name) => map.get(name),
            None => {
                let mut names = map.keys().collect::<Vec<_>>();
                names.sort();
                names.first().and_then(|name| map.get(name.as_str()))
            }
        };
        selected
            .cloned()
            .ok_or(RegistryError::NoProvider { vertical })
    }

    fn sorted_names<P: ?Sized>(providers: &RwLock<HashMap<String, Arc<P>>>) -> Vec<String> {
        let mut names = providers
            .read()
            .expect("registry lock is not poisoned")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    fn sorted_entries<P: ?Sized>(
        providers: &RwLock<HashMap<String, Arc<P>>>,
    ) -> Vec<(String, Arc<P>)> {
        let map = providers.read().expect("registry lock is not poisoned");
        let mut entries = map
            .iter()
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
            .collect::<Vec<_>>();
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        entries
    }

    async fn settle<T>(
        handles: Vec<(String, JoinHandle<ProviderResponse<Vec<T>>>)>,
    ) -> Vec<FanOutEntry<T>> {
        let mut entries = Vec::with_capacity(handles.len());
        for (provider, handle) in handles {
            let outcome = match handle.await {
                Ok(response) => Ok(response),
                Err(error) => {
                    warn!(
                        provider = provider.as_str(),
                        "fan-out search task failed: {error}"
                    );
                    Err(error.to_string())
                }
            };
            entries.push(FanOutEntry { provider, outcome });
        }
        entries
    }
}

fn health_key(vertical: Vertical, name: &str) -> String {
    format!("{vertical}:{name}")
}

/// Composition-root builder wiring the stock vendor adapters. API keys come
/// from the environment (`FARELINK_<VENDOR>_API_KEY`, falling back to
/// `<VENDOR>_API_KEY`). Vendors without a key, and everything in mock mode,
/// get a no-op transport, good enough for wiring and health checks.
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    use_mock: bool,
    kiwi_api_key: Option<String>,
    seatsaero_api_key: Option<String>,
    pointme_api_key: Option<String>,
    ratehawk_api_key: Option<String>,
    viator_api_key: Option<String>,
    disable_kiwi: bool,
    disable_seatsaero: bool,
    disable_pointme: bool,
    disable_ratehawk: bool,
    disable_viator: bool,
}

impl ProviderRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All adapters use the no-op transport; no network traffic.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    /// Reads vendor API keys from the environment.
    pub fn with_env_keys(mut self) -> Self {
        self.kiwi_api_key = env_key("KIWI");
        self.seatsaero_api_key = env_key("SEATSAERO");
        self.pointme_api_key = env_key("POINTME");
        self.ratehawk_api_key = env_key("RATEHAWK");
        self.viator_api_key = env_key("VIATOR");
        self
    }

    pub fn with_kiwi_key(mut self, key: impl Into<String>) -> Self {
        self.kiwi_api_key = Some(key.into());
        self
    }

    pub fn with_seatsaero_key(mut self, key: impl Into<String>) -> Self {
        self.seatsaero_api_key = Some(key.into());
        self
    }

    pub fn with_pointme_key(mut self, key: impl Into<String>) -> Self {
        self.pointme_api_key = Some(key.into());
        self
    }

    pub fn with_ratehawk_key(mut self, key: impl Into<String>) -> Self {
        self.ratehawk_api_key = Some(key.into());
        self
    }

    pub fn with_viator_key(mut self, key: impl Into<String>) -> Self {
        self.viator_api_key = Some(key.into());
        self
    }

    pub fn with_kiwi_enabled(mut self, enabled: bool) -> Self {
        self.disable_kiwi = !enabled;
        self
    }

    pub fn with_seatsaero_enabled(mut self, enabled: bool) -> Self {
        self.disable_seatsaero = !enabled;
        self
    }

    pub fn with_pointme_enabled(mut self, enabled: bool) -> Self {
        self.disable_pointme = !enabled;
        self
    }

    pub fn with_ratehawk_enabled(mut self, enabled: bool) -> Self {
        self.disable_ratehawk = !enabled;
        self
    }

    pub fn with_viator_enabled(mut self, enabled: bool) -> Self {
        self.disable_viator = !enabled;
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let registry = ProviderRegistry::new();

        if !self.disable_kiwi {
            let config = ProviderConfig::kiwi_default(key_or_demo(&self.kiwi_api_key));
            let provider: Arc<dyn FlightProvider> =
                if self.use_mock || self.kiwi_api_key.is_none() {
                    Arc::new(KiwiProvider::with_http_client(
                        config,
                        Arc::new(NoopHttpClient),
                    ))
                } else {
                    Arc::new(KiwiProvider::new(config))
                };
            registry.register_flight_provider("kiwi", provider);
        }

        if !self.disable_seatsaero {
            let config = ProviderConfig::seatsaero_default(key_or_demo(&self.seatsaero_api_key));
            let provider: Arc<dyn FlightProvider> =
                if self.use_mock || self.seatsaero_api_key.is_none() {
                    Arc::new(SeatsAeroProvider::with_http_client(
                        config,
                        Arc::new(NoopHttpClient),
                    ))
                } else {
                    Arc::new(SeatsAeroProvider::new(config))
                };
            registry.register_flight_provider("seatsaero", provider);
        }

        if !self.disable_pointme {
            let config = ProviderConfig::pointme_default(key_or_demo(&self.pointme_api_key));
            let provider: Arc<dyn FlightProvider> =
                if self.use_mock || self.pointme_api_key.is_none() {
                    Arc::new(PointMeProvider::with_http_client(
                        config,
                        Arc::new(NoopHttpClient),
                    ))
                } else {
                    Arc::new(PointMeProvider::new(config))
                };
            registry.register_flight_provider("pointme", provider);
        }

        if !self.disable_ratehawk {
            let config = ProviderConfig::ratehawk_default(key_or_demo(&self.ratehawk_api_key));
            let provider: Arc<dyn HotelProvider> =
                if self.use_mock || self.ratehawk_api_key.is_none() {
                    Arc::new(RateHawkProvider::with_http_client(
                        config,
                        Arc::new(NoopHttpClient),
                    ))
                } else {
                    Arc::new(RateHawkProvider::new(config))
                };
            registry.register_hotel_provider("ratehawk", provider);
        }

        if !self.disable_viator {
            let config = ProviderConfig::viator_default(key_or_demo(&self.viator_api_key));
            let provider: Arc<dyn ActivityProvider> =
                if self.use_mock || self.viator_api_key.is_none() {
                    Arc::new(ViatorProvider::with_http_client(
                        config,
                        Arc::new(NoopHttpClient),
                    ))
                } else {
                    Arc::new(ViatorProvider::new(config))
                };
            registry.register_activity_provider("viator", provider);
        }

        registry
    }
}

fn env_key(vendor: &str) -> Option<String> {
    env::var(format!("FARELINK_{vendor}_API_KEY"))
        .or_else(|_| env::var(format!("{vendor}_API_KEY")))
        .ok()
}

fn key_or_demo(key: &Option<String>) -> String {
    key.clone().unwrap_or_else(|| String::from("demo"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, ProviderFuture};
    use crate::scheduler::RequestScheduler;

    struct StaticFlightProvider {
        config: ProviderConfig,
        scheduler: RequestScheduler,
        flights: Vec<Flight>,
    }

    impl StaticFlightProvider {
        fn new(name: &str, flights: Vec<Flight>) -> Self {
            let config = ProviderConfig::new(name, Vertical::Flight, "key", "https://example.test");
            let scheduler = RequestScheduler::from_config(&config);
            Self {
                config,
                scheduler,
                flights,
            }
        }

        fn sample_flight(provider: &str) -> Flight {
            Flight::new(
                format!("{provider}-1"),
                provider,
                "LHR",
                "JFK",
                "2026-09-01T09:00:00Z",
                "2026-09-01T12:00:00Z",
                420.0,
                "USD",
            )
            .expect("static flight is valid")
        }
    }

    impl FlightProvider for StaticFlightProvider {
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
            let flights = self.flights.clone();
            Box::pin(async move { Ok(flights) })
        }

        fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
            Box::pin(async move { Ok(()) })
        }
    }

    #[tokio::test]
    async fn unknown_vendor_is_an_infrastructure_error() {
        let registry = ProviderRegistry::new();
        registry.register_flight_provider(
            "kiwi",
            Arc::new(StaticFlightProvider::new(
                "kiwi",
                vec![StaticFlightProvider::sample_flight("kiwi")],
            )),
        );

        let error = registry
            .search_flights(
                FlightSearchParams::new("LHR", "JFK", "2026-09-01"),
                Some("nope"),
            )
            .await
            .expect_err("unknown vendor must error");

        assert_eq!(
            error,
            RegistryError::NoProvider {
                vertical: Vertical::Flight
            }
        );
        assert_eq!(error.to_string(), "no flight provider available");
    }

    #[tokio::test]
    async fn empty_vertical_is_an_infrastructure_error() {
        let registry = ProviderRegistry::new();

        let error = registry
            .search_hotels(
                HotelSearchParams::new("PAR", "2026-09-01", "2026-09-05"),
                None,
            )
            .await
            .expect_err("empty vertical must error");

        assert_eq!(error.to_string(), "no hotel provider available");
    }

    #[tokio::test]
    async fn default_vendor_is_first_by_name() {
        let registry = ProviderRegistry::new();
        registry.register_flight_provider(
            "pointme",
            Arc::new(StaticFlightProvider::new(
                "pointme",
                vec![StaticFlightProvider::sample_flight("pointme")],
            )),
        );
        registry.register_flight_provider(
            "kiwi",
            Arc::new(StaticFlightProvider::new(
                "kiwi",
                vec![StaticFlightProvider::sample_flight("kiwi")],
            )),
        );

        let response = registry
            .search_flights(FlightSearchParams::new("LHR", "JFK", "2026-09-01"), None)
            .await
            .expect("provider registered");

        assert!(response.success);
        assert_eq!(response.data[0].provider, "kiwi");
    }

    #[test]
    fn re_registering_replaces_silently() {
        let registry = ProviderRegistry::new();
        registry.register_flight_provider(
            "kiwi",
            Arc::new(StaticFlightProvider::new("kiwi", Vec::new())),
        );
        registry.register_flight_provider(
            "kiwi",
            Arc::new(StaticFlightProvider::new("kiwi", Vec::new())),
        );

        assert_eq!(registry.list_providers(Vertical::Flight), vec!["kiwi"]);
    }

    #[test]
    fn list_providers_is_sorted_per_vertical() {
        let registry = ProviderRegistry::new();
        registry.register_flight_provider(
            "seatsaero",
            Arc::new(StaticFlightProvider::new("seatsaero", Vec::new())),
        );
        registry.register_flight_provider(
            "kiwi",
            Arc::new(StaticFlightProvider::new("kiwi", Vec::new())),
        );

        assert_eq!(
            registry.list_providers(Vertical::Flight),
            vec!["kiwi", "seatsaero"]
        );
        assert!(registry.list_providers(Vertical::Hotel).is_empty());
    }

    #[test]
    fn builder_mock_mode_registers_the_stock_vendors() {
        let registry = ProviderRegistryBuilder::new().with_mock_mode().build();

        assert_eq!(
            registry.list_providers(Vertical::Flight),
            vec!["kiwi", "pointme", "seatsaero"]
        );
        assert_eq!(registry.list_providers(Vertical::Hotel), vec!["ratehawk"]);
        assert_eq!(registry.list_providers(Vertical::Activity), vec!["viator"]);
    }

    #[test]
    fn builder_disable_flags_skip_vendors() {
        let registry = ProviderRegistryBuilder::new()
            .with_mock_mode()
            .with_seatsaero_enabled(false)
            .with_viator_enabled(false)
            .build();

        assert_eq!(
            registry.list_providers(Vertical::Flight),
            vec!["kiwi", "pointme"]
        );
        assert!(registry.list_providers(Vertical::Activity).is_empty());
    }
}
