//! Contract tests run against every flight vendor adapter: whatever the
//! vendor payload looks like, the canonical output and the failure envelope
//! must behave identically.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use farelink_core::{
    FlightProvider, FlightSearchParams, HttpClient, HttpError, HttpRequest, HttpResponse,
    KiwiProvider, PointMeProvider, ProviderConfig, SeatsAeroProvider,
};

/// Transport double that always returns the same scripted response and
/// counts how many times it was called.
struct ScriptedHttpClient {
    response: HttpResponse,
    calls: AtomicU32,
}

impl ScriptedHttpClient {
    fn new(response: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        Box::pin(async move { Ok(response) })
    }
}

const KIWI_BODY: &str = r#"{
    "currency": "USD",
    "data": [{
        "id": "kiwi-42",
        "flyFrom": "LHR",
        "flyTo": "JFK",
        "local_departure": "2026-09-01T09:15:00.000Z",
        "local_arrival": "2026-09-01T12:05:00.000Z",
        "price": 412.5,
        "airlines": ["BA"],
        "route": []
    }]
}"#;

const SEATSAERO_BODY: &str = r#"{
    "availability": [{
        "id": "sa-42",
        "origin_airport": "LHR",
        "destination_airport": "JFK",
        "date": "2026-09-01",
        "mileage_cost": 57500,
        "taxes_and_fees": 412.5,
        "currency": "USD"
    }]
}"#;

const POINTME_BODY: &str = r#"{
    "results": [{
        "id": "pm-42",
        "origin": "LHR",
        "destination": "JFK",
        "departure_time": "2026-09-01T09:15:00Z",
        "arrival_time": "2026-09-01T12:05:00Z",
        "points_required": 57500,
        "cash_component": 412.5,
        "currency": "USD"
    }]
}"#;

struct ProviderCase {
    vendor: &'static str,
    expected_id: &'static str,
    body: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            vendor: "kiwi",
            expected_id: "kiwi-42",
            body: KIWI_BODY,
        },
        ProviderCase {
            vendor: "seatsaero",
            expected_id: "sa-42",
            body: SEATSAERO_BODY,
        },
        ProviderCase {
            vendor: "pointme",
            expected_id: "pm-42",
            body: POINTME_BODY,
        },
    ]
}

fn build_provider(vendor: &str, client: Arc<ScriptedHttpClient>) -> Arc<dyn FlightProvider> {
    // Retries off so failure-path tests make exactly one call.
    match vendor {
        "kiwi" => Arc::new(KiwiProvider::with_http_client(
            ProviderConfig::kiwi_default("test-key").with_retries(0, 10),
            client,
        )),
        "seatsaero" => Arc::new(SeatsAeroProvider::with_http_client(
            ProviderConfig::seatsaero_default("test-key").with_retries(0, 10),
            client,
        )),
        "pointme" => Arc::new(PointMeProvider::with_http_client(
            ProviderConfig::pointme_default("test-key").with_retries(0, 10),
            client,
        )),
        other => panic!("unknown vendor '{other}'"),
    }
}

#[tokio::test]
async fn canonical_fields_survive_the_mapping_for_all_providers() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(HttpResponse::ok_json(case.body));
        let provider = build_provider(case.vendor, client);

        let response = provider
            .search(FlightSearchParams::new("LHR", "JFK", "2026-09-01"))
            .await;

        assert!(response.success, "provider '{}': success", case.vendor);
        assert_eq!(response.data.len(), 1, "provider '{}': count", case.vendor);

        let flight = &response.data[0];
        assert_eq!(flight.id, case.expected_id, "provider '{}'", case.vendor);
        assert_eq!(flight.provider, case.vendor);
        assert_eq!(flight.origin, "LHR", "provider '{}'", case.vendor);
        assert_eq!(flight.destination, "JFK", "provider '{}'", case.vendor);
        assert_eq!(flight.price, 412.5, "provider '{}'", case.vendor);
        assert_eq!(flight.currency, "USD", "provider '{}'", case.vendor);
    }
}

#[tokio::test]
async fn pricing_options_share_the_top_level_currency() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(HttpResponse::ok_json(case.body));
        let provider = build_provider(case.vendor, client);

        let response = provider
            .search(FlightSearchParams::new("LHR", "JFK", "2026-09-01"))
            .await;

        let flight = &response.data[0];
        assert!(
            !flight.pricing_options.is_empty(),
            "provider '{}': pricing options must be populated",
            case.vendor
        );
        assert!(
            flight
                .pricing_options
                .iter()
                .any(|option| option.cash_currency == flight.currency),
            "provider '{}': at least one option in the flight currency",
            case.vendor
        );
    }
}

#[tokio::test]
async fn award_providers_keep_scalar_projections_consistent() {
    for case in provider_cases().into_iter().skip(1) {
        let client = ScriptedHttpClient::new(HttpResponse::ok_json(case.body));
        let provider = build_provider(case.vendor, client);

        let response = provider
            .search(FlightSearchParams::new("LHR", "JFK", "2026-09-01"))
            .await;

        let flight = &response.data[0];
        // Legacy scalars mirror the award option.
        assert_eq!(
            flight.miles_required,
            Some(57_500),
            "provider '{}'",
            case.vendor
        );
        assert_eq!(flight.price, 412.5, "provider '{}'", case.vendor);
        assert_eq!(
            flight.pricing_options[0].miles,
            Some(57_500),
            "provider '{}'",
            case.vendor
        );
        assert!(
            flight
                .pricing_options
                .iter()
                .any(|option| option.is_estimated),
            "provider '{}': derived blended option present",
            case.vendor
        );
    }
}

#[tokio::test]
async fn vendor_5xx_becomes_an_error_envelope_never_a_panic() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(HttpResponse::with_status(503, "upstream sad"));
        let provider = build_provider(case.vendor, client);

        let response = provider
            .search(FlightSearchParams::new("LHR", "JFK", "2026-09-01"))
            .await;

        assert!(!response.success, "provider '{}'", case.vendor);
        assert!(response.data.is_empty(), "provider '{}'", case.vendor);

        let error = response.error.expect("error populated");
        assert_eq!(error.code, "HTTP_ERROR", "provider '{}'", case.vendor);
        assert_eq!(error.status_code, Some(503), "provider '{}'", case.vendor);
        assert!(error.retryable, "provider '{}'", case.vendor);
    }
}

#[tokio::test]
async fn missing_required_params_short_circuit_without_http_calls() {
    let incomplete = [
        FlightSearchParams::new("", "JFK", "2026-09-01"),
        FlightSearchParams::new("LHR", "", "2026-09-01"),
        FlightSearchParams::new("LHR", "JFK", ""),
    ];

    for case in provider_cases() {
        for params in &incomplete {
            let client = ScriptedHttpClient::new(HttpResponse::ok_json(case.body));
            let provider = build_provider(case.vendor, client.clone());

            let response = provider.search(params.clone()).await;

            assert!(!response.success, "provider '{}'", case.vendor);
            assert_eq!(
                response.error.as_ref().expect("error populated").code,
                "VALIDATION_ERROR",
                "provider '{}'",
                case.vendor
            );
            assert_eq!(
                client.calls(),
                0,
                "provider '{}': no HTTP call may be made",
                case.vendor
            );
        }
    }
}

#[tokio::test]
async fn health_check_reports_down_with_the_probe_error() {
    for case in provider_cases() {
        let client = ScriptedHttpClient::new(HttpResponse::with_status(500, ""));
        let provider = build_provider(case.vendor, client);

        let check = provider.health_check().await;

        assert_eq!(
            check.status,
            farelink_core::HealthStatus::Down,
            "provider '{}'",
            case.vendor
        );
        assert!(check.error.is_some(), "provider '{}'", case.vendor);
    }
}
