//! Vendor adapters and the mapping helpers they share.
//!
//! Every adapter follows the same shape: an owned [`crate::config::ProviderConfig`],
//! an [`crate::http_client::HttpClient`] transport, a typed raw-payload struct
//! per vendor response, and a pure mapping function from raw payload to the
//! canonical model.

mod kiwi;
mod pointme;
mod ratehawk;
mod seatsaero;
mod viator;

pub use kiwi::KiwiProvider;
pub use pointme::PointMeProvider;
pub use ratehawk::RateHawkProvider;
pub use seatsaero::SeatsAeroProvider;
pub use viator::ViatorProvider;

use crate::http_client::{HttpError, HttpResponse};
use crate::provider::ProviderError;

/// Seconds to wait when a 429 carries no usable `Retry-After` header.
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Maps a non-2xx vendor response into the normalized error taxonomy.
/// 429 becomes a rate-limit error carrying the vendor's suggested delay;
/// 401/403 become authentication errors; everything else is a generic HTTP
/// error, retryable only for 5xx.
pub(crate) fn normalize_http_failure(vendor: &str, response: &HttpResponse) -> ProviderError {
    match response.status {
        429 => ProviderError::rate_limited(
            format!("{vendor} throttled the request"),
            retry_after_secs(response),
        ),
        401 | 403 => {
            ProviderError::authentication(format!("{vendor} rejected the API credentials"))
        }
        status => ProviderError::http(
            status,
            format!("{vendor} returned an unexpected status"),
        ),
    }
}

/// Maps a transport-level failure (timeout, connection reset) into the
/// catch-all taxonomy entry.
pub(crate) fn normalize_transport_failure(vendor: &str, error: &HttpError) -> ProviderError {
    ProviderError::unknown(format!("{vendor} transport error: {}", error.message()))
}

/// Maps an unparseable payload into an invalid-response error.
pub(crate) fn normalize_parse_failure(vendor: &str, error: &serde_json::Error) -> ProviderError {
    ProviderError::invalid_response(format!("{vendor} payload did not match schema: {error}"))
}

pub(crate) fn retry_after_secs(response: &HttpResponse) -> u64 {
    response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// A derived points-plus-cash quote: buy back part of the miles price at an
/// assumed cents-per-point valuation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BlendedQuote {
    pub miles: u64,
    pub cash_amount: f64,
}

/// Offsets `offset_fraction` of the miles at `cents_per_point`, reducing the
/// miles required and adding the equivalent cash on top of the cash already
/// due. Returns `None` unless `miles` is a finite positive number.
///
/// The arithmetic is fixed:
/// `offset = round(miles * f)`, `remaining = max(round(miles - offset), 0)`,
/// `cash_from_offset = round(offset * v) / 100`,
/// `total = round((cash_due + cash_from_offset) * 100) / 100`.
pub(crate) fn blend_points_and_cash(
    miles: f64,
    cash_due: f64,
    offset_fraction: f64,
    cents_per_point: f64,
) -> Option<BlendedQuote> {
    if !miles.is_finite() || miles <= 0.0 {
        return None;
    }

    let offset_miles = (miles * offset_fraction).round();
    let remaining_miles = (miles - offset_miles).round().max(0.0);
    let cash_from_offset = (offset_miles * cents_per_point).round() / 100.0;
    let total_cash = ((cash_due + cash_from_offset) * 100.0).round() / 100.0;

    Some(BlendedQuote {
        miles: remaining_miles as u64,
        cash_amount: total_cash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_matches_pinned_vector() {
        // 100k miles, $150 due, offset 40% at 1.3c/pt:
        // offset = 40_000, cash_from_offset = 520.00, total = 670.00.
        let quote = blend_points_and_cash(100_000.0, 150.0, 0.40, 1.3).expect("positive miles");

        assert_eq!(quote.miles, 60_000);
        assert_eq!(quote.cash_amount, 670.0);
    }

    #[test]
    fn blend_matches_point_me_constants() {
        // 80k miles, $95.50 due, offset 35% at 1.35c/pt:
        // offset = 28_000, cash_from_offset = 378.00, total = 473.50.
        let quote = blend_points_and_cash(80_000.0, 95.5, 0.35, 1.35).expect("positive miles");

        assert_eq!(quote.miles, 52_000);
        assert_eq!(quote.cash_amount, 473.5);
    }

    #[test]
    fn blend_rounds_fractional_offsets() {
        // 12_345 miles at 40% offsets 4_938 miles; round(4938 * 1.3) = 6419.
        let quote = blend_points_and_cash(12_345.0, 0.0, 0.40, 1.3).expect("positive miles");

        assert_eq!(quote.miles, 7_407);
        assert_eq!(quote.cash_amount, 64.19);
    }

    #[test]
    fn blend_skips_non_positive_and_non_finite_miles() {
        assert!(blend_points_and_cash(0.0, 10.0, 0.4, 1.3).is_none());
        assert!(blend_points_and_cash(-5.0, 10.0, 0.4, 1.3).is_none());
        assert!(blend_points_and_cash(f64::NAN, 10.0, 0.4, 1.3).is_none());
        assert!(blend_points_and_cash(f64::INFINITY, 10.0, 0.4, 1.3).is_none());
    }

    #[test]
    fn retry_after_defaults_when_missing_or_garbled() {
        let missing = HttpResponse::with_status(429, "");
        assert_eq!(retry_after_secs(&missing), DEFAULT_RETRY_AFTER_SECS);

        let garbled = HttpResponse::with_status(429, "").with_header("retry-after", "soon");
        assert_eq!(retry_after_secs(&garbled), DEFAULT_RETRY_AFTER_SECS);

        let parsed = HttpResponse::with_status(429, "").with_header("Retry-After", "12");
        assert_eq!(retry_after_secs(&parsed), 12);
    }

    #[test]
    fn http_failures_map_to_the_taxonomy() {
        let throttle = HttpResponse::with_status(429, "").with_header("retry-after", "30");
        let error = normalize_http_failure("kiwi", &throttle);
        assert_eq!(error.code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(error.retry_after_secs(), Some(30));

        for status in [401, 403] {
            let auth = HttpResponse::with_status(status, "");
            assert_eq!(
                normalize_http_failure("kiwi", &auth).code(),
                "AUTHENTICATION_ERROR"
            );
        }

        let server = normalize_http_failure("kiwi", &HttpResponse::with_status(503, ""));
        assert_eq!(server.code(), "HTTP_ERROR");
        assert!(server.retryable());

        let client = normalize_http_failure("kiwi", &HttpResponse::with_status(404, ""));
        assert_eq!(client.code(), "HTTP_ERROR");
        assert!(!client.retryable());
    }
}
