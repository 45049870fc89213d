use std::sync::Arc;

use serde::Deserialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::adapters::{normalize_http_failure, normalize_parse_failure, normalize_transport_failure};
use crate::config::ProviderConfig;
use crate::domain::{CabinClass, Flight, FlightSegment, PricingOption};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{FlightProvider, FlightSearchParams, ProviderError, ProviderFuture};
use crate::scheduler::RequestScheduler;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const KIWI_DATE: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// Cash-fare aggregator speaking the Kiwi Tequila API: GET search with
/// `DD/MM/YYYY` dates and single-letter cabin codes, `apikey` header auth.
pub struct KiwiProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    http_client: Arc<dyn HttpClient>,
}

impl KiwiProvider {
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

    fn search_url(&self, params: &FlightSearchParams) -> Result<String, ProviderError> {
        let depart = format_kiwi_date(&params.depart_date, "depart_date")?;

        let mut query: Vec<(&str, String)> = vec![
            ("fly_from", params.origin.clone()),
            ("fly_to", params.destination.clone()),
            ("date_from", depart.clone()),
            ("date_to", depart),
            ("adults", params.passengers.adults.to_string()),
            ("children", params.passengers.children.to_string()),
            ("infants", params.passengers.infants.to_string()),
            ("curr", String::from("USD")),
            ("limit", String::from("30")),
        ];

        if let Some(return_date) = &params.return_date {
            let ret = format_kiwi_date(return_date, "return_date")?;
            query.push(("return_from", ret.clone()));
            query.push(("return_to", ret));
        }

        if let Some(cabin) = params.cabin {
            query.push(("selected_cabins", cabin_code(cabin).to_string()));
        }

        let encoded = query
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}/v2/search?{encoded}", self.config.base_url))
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::Header {
            name: String::from("apikey"),
            value: self.config.api_key.clone(),
        }
    }
}

impl FlightProvider for KiwiProvider {
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
            let url = self.search_url(params)?;
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

            let payload: KiwiSearchResponse = serde_json::from_str(&response.body)
                .map_err(|error| normalize_parse_failure(self.vendor_name(), &error))?;

            let currency = payload.currency.unwrap_or_else(|| String::from("USD"));
            payload
                .data
                .into_iter()
                .map(|raw| map_itinerary(self.vendor_name(), &currency, raw))
                .collect()
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let url = format!(
                "{}/locations/query?term=LON&limit=1",
                self.config.base_url
            );
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

/// Raw Tequila search payload.
#[derive(Debug, Deserialize)]
struct KiwiSearchResponse {
    data: Vec<KiwiItinerary>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KiwiItinerary {
    id: String,
    #[serde(rename = "flyFrom")]
    fly_from: String,
    #[serde(rename = "flyTo")]
    fly_to: String,
    local_departure: String,
    local_arrival: String,
    price: f64,
    #[serde(default)]
    airlines: Vec<String>,
    #[serde(default)]
    deep_link: Option<String>,
    #[serde(default)]
    availability: Option<KiwiAvailability>,
    #[serde(default)]
    route: Vec<KiwiRouteSegment>,
}

#[derive(Debug, Deserialize)]
struct KiwiAvailability {
    #[serde(default)]
    seats: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct KiwiRouteSegment {
    #[serde(rename = "flyFrom")]
    fly_from: String,
    #[serde(rename = "flyTo")]
    fly_to: String,
    local_departure: String,
    local_arrival: String,
    airline: String,
    flight_no: u32,
    #[serde(default)]
    fare_category: Option<String>,
}

fn map_itinerary(
    vendor: &str,
    currency: &str,
    raw: KiwiItinerary,
) -> Result<Flight, ProviderError> {
    let mut flight = Flight::new(
        raw.id,
        vendor,
        raw.fly_from,
        raw.fly_to,
        raw.local_departure,
        raw.local_arrival,
        raw.price,
        currency,
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))?;

    flight.airline = raw.airlines.first().cloned();
    flight.flight_number = raw
        .route
        .first()
        .map(|leg| format!("{}{}", leg.airline, leg.flight_no));
    flight.booking_url = raw.deep_link.clone();
    flight.availability = raw.availability.and_then(|availability| availability.seats);

    flight.segments = raw
        .route
        .into_iter()
        .map(|leg| FlightSegment {
            origin: leg.fly_from,
            destination: leg.fly_to,
            departure_time: leg.local_departure,
            arrival_time: leg.local_arrival,
            carrier: Some(leg.airline.clone()),
            flight_number: Some(format!("{}{}", leg.airline, leg.flight_no)),
            cabin: leg.fare_category.as_deref().map(cabin_label).map(str::to_owned),
            fare_class: leg.fare_category,
        })
        .collect();

    let mut option = PricingOption::cash(flight.price, currency, vendor)
        .map_err(|error| ProviderError::invalid_response(error.to_string()))?;
    if let Some(deep_link) = &flight.booking_url {
        option = option.with_booking_url(deep_link.clone());
    }
    flight.push_pricing_option(option);

    Ok(flight)
}

fn format_kiwi_date(value: &str, field: &'static str) -> Result<String, ProviderError> {
    let date = Date::parse(value, ISO_DATE)
        .map_err(|_| ProviderError::validation(field, format!("'{value}' is not YYYY-MM-DD")))?;
    date.format(KIWI_DATE)
        .map_err(|_| ProviderError::validation(field, format!("'{value}' is not formattable")))
}

const fn cabin_code(cabin: CabinClass) -> char {
    match cabin {
        CabinClass::Economy => 'M',
        CabinClass::PremiumEconomy => 'W',
        CabinClass::Business => 'C',
        CabinClass::First => 'F',
    }
}

fn cabin_label(code: &str) -> &'static str {
    match code {
        "W" => "premium_economy",
        "C" => "business",
        "F" => "first",
        _ => "economy",
    }
}
