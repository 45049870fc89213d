use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::{
    blend_points_and_cash, normalize_http_failure, normalize_parse_failure,
    normalize_transport_failure,
};
use crate::config::ProviderConfig;
use crate::domain::{Flight, PricingOption};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{FlightProvider, FlightSearchParams, ProviderError, ProviderFuture};
use crate::scheduler::RequestScheduler;

/// Share of the points price bought back when deriving the blended option.
const OFFSET_FRACTION: f64 = 0.35;
/// Assumed point valuation for the buy-back, in US cents.
const CENTS_PER_POINT: f64 = 1.35;

/// Points-redemption aggregator speaking the Point.me API: POST search with
/// a JSON body and bearer-token auth.
pub struct PointMeProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    http_client: Arc<dyn HttpClient>,
}

impl PointMeProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ProviderConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let scheduler = RequestScheduler::from_config(&config);
        Self {
            config,
            scheduler,
            http_client,
        }
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::BearerToken(self.config.api_key.clone())
    }

    fn search_body(&self, params: &FlightSearchParams) -> Result<String, ProviderError> {
        let body = PointMeSearchRequest {
            origin: &params.origin,
            destination: &params.destination,
            date: &params.depart_date,
            return_date: params.return_date.as_deref(),
            passengers: params.passengers.adults + params.passengers.children,
            cabin: params.cabin.map(|cabin| cabin.as_str()),
        };
        serde_json::to_string(&body)
            .map_err(|error| ProviderError::unknown(format!("request body encoding: {error}")))
    }
}

impl FlightProvider for PointMeProvider {
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
        params: &'a FlightSearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Flight>, ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/api/v1/search", self.config.base_url);
            let request = HttpRequest::post(url)
                .with_json_body(self.search_body(params)?)
                .with_auth(&self.auth())
                .with_timeout_ms(self.config.timeout_ms);

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|error| normalize_transport_failure(self.vendor_name(), &error))?;

            if !response.is_success() {
                return Err(normalize_http_failure(self.vendor_name(), &response));
            }

            let payload: PointMeSearchResponse = serde_json::from_str(&response.body)
                .map_err(|error| normalize_parse_failure(self.vendor_name(), &error))?;

            payload
                .results
                .into_iter()
                .map(|raw| map_result(self.vendor_name(), raw))
                .collect()
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/api/v1/status", self.config.base_url);
            let request = HttpRequest::get(url)
                .with_auth(&self.auth())
                .with_timeout_ms(self.config.timeout_ms);

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|error| normalize_transport_failure(self.vendor_name(), &error))?;

            if !response.is_success() {
                return Err(normalize_http_failure(self.vendor_name(), &response));
            }
            Ok(())
        })
    }
}

#[derive(Debug, Serialize)]
struct PointMeSearchRequest<'a> {
    origin: &'a str,
    destination: &'a str,
    date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_date: Option<&'a str>,
    passengers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cabin: Option<&'a str>,
}

/// Raw Point.me search payload.
#[derive(Debug, Deserialize)]
struct PointMeSearchResponse {
    results: Vec<PointMeResult>,
}

#[derive(Debug, Deserialize)]
struct PointMeResult {
    id: String,
    origin: String,
    destination: String,
    departure_time: String,
    arrival_time: String,
    points_required: u64,
    #[serde(default)]
    cash_component: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    flight_number: Option<String>,
    #[serde(default)]
    cabin: Option<String>,
    #[serde(default)]
    booking_link: Option<String>,
}

fn map_result(vendor: &str, raw: PointMeResult) -> Result<Flight, ProviderError> {
    let currency = raw.currency.unwrap_or_else(|| String::from("USD"));

    let mut flight = Flight::new(
        raw.id,
        vendor,
        raw.origin,
        raw.destination,
        raw.departure_time,
        raw.arrival_time,
        raw.cash_component,
        currency.as_str(),
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))?;

    flight.airline = raw.airline;
    flight.flight_number = raw.flight_number;
    flight.cabin = raw.cabin;
    flight.miles_required = Some(raw.points_required);
    flight.fees = Some(raw.cash_component);
    flight.booking_url = raw.booking_link.clone();

    let mut award = PricingOption::award(
        raw.points_required,
        raw.cash_component,
        currency.as_str(),
        vendor,
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))?;
    if let Some(program) = raw.program {
        award = award.with_description(format!("Book through {program}"));
    }
    if let Some(link) = &raw.booking_link {
        award = award.with_booking_url(link.clone());
    }
    flight.push_pricing_option(award);

    if let Some(blend) = blend_points_and_cash(
        raw.points_required as f64,
        raw.cash_component,
        OFFSET_FRACTION,
        CENTS_PER_POINT,
    ) {
        let option = PricingOption::points_plus_cash(
            blend.miles,
            blend.cash_amount,
            currency.as_str(),
            vendor,
        )
        .map_err(|error| ProviderError::invalid_response(error.to_string()))?
        .with_description(format!(
            "Offsets 35% of the points at an assumed {CENTS_PER_POINT}c/pt"
        ));
        flight.push_pricing_option(option);
    }

    Ok(flight)
}
