use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{normalize_http_failure, normalize_parse_failure, normalize_transport_failure};
use crate::config::ProviderConfig;
use crate::domain::Activity;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{ActivityProvider, ActivitySearchParams, ProviderError, ProviderFuture};
use crate::scheduler::RequestScheduler;

/// Tours-and-activities vendor speaking the Viator partner API: GET product
/// search, `exp-api-key` header auth.
pub struct ViatorProvider {
    config: ProviderConfig,
    scheduler: RequestScheduler,
    http_client: Arc<dyn HttpClient>,
}

impl ViatorProvider {
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
            name: String::from("exp-api-key"),
            value: self.config.api_key.clone(),
        }
    }

    fn search_url(&self, params: &ActivitySearchParams) -> String {
        let mut query: Vec<(&str, &str)> = vec![("destination", params.location.as_str())];
        if let Some(date) = &params.date {
            query.push(("date", date.as_str()));
        }
        if let Some(category) = &params.category {
            query.push(("category", category.as_str()));
        }

        let encoded = query
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/partner/products/search?{encoded}", self.config.base_url)
    }
}

impl ActivityProvider for ViatorProvider {
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
        params: &'a ActivitySearchParams,
    ) -> ProviderFuture<'a, Result<Vec<Activity>, ProviderError>> {
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

            let payload: ViatorSearchResponse = serde_json::from_str(&response.body)
                .map_err(|error| normalize_parse_failure(self.vendor_name(), &error))?;

            payload
                .products
                .into_iter()
                .map(|raw| map_product(self.vendor_name(), raw))
                .collect()
        })
    }

    fn execute_health_check<'a>(&'a self) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let url = format!("{}/partner/status", self.config.base_url);
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

/// Raw partner product-search payload.
#[derive(Debug, Deserialize)]
struct ViatorSearchResponse {
    products: Vec<ViatorProduct>,
}

#[derive(Debug, Deserialize)]
struct ViatorProduct {
    product_code: String,
    title: String,
    destination: String,
    price_from: f64,
    #[serde(default)]
    currency: Option<String>,
}

fn map_product(vendor: &str, raw: ViatorProduct) -> Result<Activity, ProviderError> {
    Activity::new(
        raw.product_code,
        vendor,
        raw.title,
        raw.destination,
        raw.price_from,
        raw.currency.unwrap_or_else(|| String::from("USD")),
    )
    .map_err(|error| ProviderError::invalid_response(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;

    struct ScriptedHttpClient {
        response: HttpResponse,
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    #[tokio::test]
    async fn products_map_to_canonical_activities() {
        let body = r#"{
            "products": [{
                "product_code": "vt-77",
                "title": "Seine River Cruise",
                "destination": "Paris",
                "price_from": 39.0,
                "currency": "EUR"
            }]
        }"#;
        let provider = ViatorProvider::with_http_client(
            ProviderConfig::viator_default("vt-key"),
            Arc::new(ScriptedHttpClient {
                response: HttpResponse::ok_json(body),
            }),
        );

        let mut params = ActivitySearchParams::new("Paris");
        params.category = Some(String::from("cruises"));
        let response = provider.search(params).await;

        assert!(response.success);
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, "vt-77");
        assert_eq!(response.data[0].title, "Seine River Cruise");
        assert_eq!(response.data[0].currency, "EUR");
    }

    #[tokio::test]
    async fn missing_location_short_circuits() {
        let provider = ViatorProvider::with_http_client(
            ProviderConfig::viator_default("vt-key"),
            Arc::new(ScriptedHttpClient {
                response: HttpResponse::ok_json(r#"{"products": []}"#),
            }),
        );

        let response = provider.search(ActivitySearchParams::new("  ")).await;

        assert!(!response.success);
        assert_eq!(
            response.error.expect("error populated").code,
            "VALIDATION_ERROR"
        );
    }
}
