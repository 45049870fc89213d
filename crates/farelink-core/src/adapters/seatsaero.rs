use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{
    blend_points_and_cash, normalize_http_failure, normalize_parse_failure,
    normalize_transport_failure,
};
use crate::config::ProviderConfig;
use crate::domain::{Flight, PricingOption};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{FlightProvider, FlightSearchParams, ProviderError, ProviderFuture};
use crate::scheduler::RequestScheduler;

/// Share of the miles price bought back when deriving the blended option.
const OFFSET_FRACTION: f64 = 0.40;
/// Assumed point valuation for the buy-back, in US cents.
const CENTS_PER_POINT: f64 = 1.3;

/// Award-availability aggregator speaking the Seats.aero partner API: GET
/// search over cached award space, `Partner-Authorization` header auth.
/// Besides the vendor's award price it derives an estimated
/// points-plus-cash option per availability record.
pub struct SeatsAeroProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    http_client: Arc<dyn HttpClient>,
}

impl SeatsAeroProvider {
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

    fn search_url(&self, params: &FlightSearchParams) -> String {
        let mut query: Vec<(&str, &str)> = vec![
            ("origin_airport", params.origin.as_str()),
            ("destination_airport", params.destination.as_str()),
            ("start_date", params.depart_date.as_str()),
            ("end_date", params.depart_date.as_str()),
        ];

        if let Some(cabin) = params.cabin {
            query.push(("cabin", cabin.as_str()));
        }

        let encoded = query
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/partnerapi/search?{encoded}", self.config.base_url)
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::Header {
            name: String::from("Partner-Authorization"),
            value: self.config.api_key.clone(),
        }
    }
}

impl FlightProvider for SeatsAeroProvider {
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
            let request = HttpRequest::get(self.search_url(params))
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

            let payload: SeatsAeroSearchResponse = serde_json::from_str(&response.body)
                .map_err(|error| normalize_parse_failure(self.vendor_name(), &error))?;

            payload
                .availability
                .into_iter()
                .map(|raw| map_availability(self.vendor_name(), raw))
                .collect()
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/partnerapi/routes?take=1", self.config.base_url);
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

/// Raw partner-API search payload.
#[derive(Debug, Deserialize)]
struct SeatsAeroSearchResponse {
    availability: Vec<SeatsAeroAvailability>,
}

#[derive(Debug, Deserialize)]
struct SeatsAeroAvailability {
    id: String,
    origin_airport: String,
    destination_airport: String,
    date: String,
    #[serde(default)]
    cabin: Option<String>,
    mileage_cost: u64,
    #[serde(default)]
    taxes_and_fees: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    booking_url: Option<String>,
}

/// Award space is date-granular; departure and arrival carry the
/// availability date.
fn map_availability(vendor: &str, raw: SeatsAeroAvailability) -> Result<Flight, ProviderError> {
    let currency = raw.currency.unwrap_or_else(|| String::from("USD"));

    // Cash-due portion only; the miles price lives in pricing_options.
    let mut flight = Flight::new(
        raw.id,
        vendor,
        raw.origin_airport,
        raw.destination_airport,
        raw.date.clone(),
        raw.date,
        raw.taxes_and_fees,
        currency.as_str(),
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))?;

    flight.airline = raw.airline;
    flight.cabin = raw.cabin;
    flight.miles_required = Some(raw.mileage_cost);
    flight.taxes = Some(raw.taxes_and_fees);
    flight.booking_url = raw.booking_url.clone();

    let mut award = PricingOption::award(
        raw.mileage_cost,
        raw.taxes_and_fees,
        currency.as_str(),
        vendor,
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))?;
    if let Some(url) = &raw.booking_url {
        award = award.with_booking_url(url.clone());
    }
    flight.push_pricing_option(award);

    if let Some(blend) = blend_points_and_cash(
        raw.mileage_cost as f64,
        raw.taxes_and_fees,
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
            "Offsets 40% of the miles at an assumed {CENTS_PER_POINT}c/pt"
        ));
        flight.push_pricing_option(option);
    }

    Ok(flight)
}
