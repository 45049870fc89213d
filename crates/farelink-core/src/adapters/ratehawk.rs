use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::{normalize_http_failure, normalize_parse_failure, normalize_transport_failure};
use crate::config::ProviderConfig;
use crate::domain::Hotel;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{HotelProvider, HotelSearchParams, ProviderError, ProviderFuture};
use crate::scheduler::RequestScheduler;

/// Hotel supplier speaking the RateHawk B2B API: POST region search, JSON
/// body, API-key header auth. Each hotel is projected onto its cheapest
/// nightly rate.
pub struct RateHawkProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    http_client: Arc<dyn HttpClient>,
}

impl RateHawkProvider {
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
        HttpAuth::Header {
            name: String::from("X-API-Key"),
            value: self.config.api_key.clone(),
        }
    }

    fn search_body(&self, params: &HotelSearchParams) -> Result<String, ProviderError> {
        let body = RateHawkSearchRequest {
            region: &params.destination,
            checkin: &params.check_in,
            checkout: &params.check_out,
            guests: params.guests,
            rooms: params.rooms,
        };
        serde_json::to_string(&body)
            .map_err(|error| ProviderError::unknown(format!("request body encoding: {error}")))
    }
}

impl HotelProvider for RateHawkProvider {
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
        params: &'a HotelSearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Hotel>, ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/api/b2b/v3/search/serp/region/", self.config.base_url);
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

            let payload: RateHawkSearchResponse = serde_json::from_str(&response.body)
                .map_err(|error| normalize_parse_failure(self.vendor_name(), &error))?;

            map_hotels(self.vendor_name(), payload)
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/api/b2b/v3/overview/", self.config.base_url);
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
struct RateHawkSearchRequest<'a> {
    region: &'a str,
    checkin: &'a str,
    checkout: &'a str,
    guests: u32,
    rooms: u32,
}

/// Raw supplier search payload: hotels carry per-room rates.
#[derive(Debug, Deserialize)]
struct RateHawkSearchResponse {
    hotels: Vec<RateHawkHotel>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateHawkHotel {
    id: String,
    name: String,
    region: String,
    #[serde(default)]
    rates: Vec<RateHawkRate>,
}

#[derive(Debug, Deserialize)]
struct RateHawkRate {
    daily_price: f64,
    #[serde(default)]
    currency: Option<String>,
}

/// Hotels without rates are dropped; the cheapest rate wins.
fn map_hotels(
    vendor: &str,
    payload: RateHawkSearchResponse,
) -> Result<Vec<Hotel>, ProviderError> {
    let fallback_currency = payload.currency.unwrap_or_else(|| String::from("USD"));
    let mut hotels = Vec::with_capacity(payload.hotels.len());

    for raw in payload.hotels {
        let Some(best) = raw
            .rates
            .iter()
            .min_by(|a, b| a.daily_price.total_cmp(&b.daily_price))
        else {
            continue;
        };

        let currency = best
            .currency
            .clone()
            .unwrap_or_else(|| fallback_currency.clone());

        hotels.push(
            Hotel::new(
                raw.id,
                vendor,
                raw.name,
                raw.region,
                best.daily_price,
                currency,
            )
            .map_err(|error| ProviderError::invalid_response(error.to_string()))?,
        );
    }

    Ok(hotels)
}
