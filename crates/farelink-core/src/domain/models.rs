use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Cabin of service requested by the caller or reported per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium_economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }
}

impl Display for CabinClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "premium_economy" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            other => Err(ValidationError::InvalidCabin {
                value: other.to_owned(),
            }),
        }
    }
}

/// How a pricing option is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingKind {
    Award,
    Cash,
    PointsPlusCash,
}

/// One way to pay for a flight. `pricing_options` on [`Flight`] is the
/// authoritative multi-modal price list; the flight's scalar `price` and
/// `miles_required` fields are legacy projections of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOption {
    pub kind: PricingKind,
    pub cash_amount: f64,
    pub cash_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miles: Option<u64>,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_estimated: bool,
}

impl PricingOption {
    pub fn cash(
        cash_amount: f64,
        cash_currency: impl AsRef<str>,
        provider: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(cash_amount)?;
        Ok(Self {
            kind: PricingKind::Cash,
            cash_amount,
            cash_currency: validate_currency_code(cash_currency.as_ref())?,
            miles: None,
            provider: provider.into(),
            booking_url: None,
            description: None,
            is_estimated: false,
        })
    }

    pub fn award(
        miles: u64,
        cash_amount: f64,
        cash_currency: impl AsRef<str>,
        provider: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(cash_amount)?;
        Ok(Self {
            kind: PricingKind::Award,
            cash_amount,
            cash_currency: validate_currency_code(cash_currency.as_ref())?,
            miles: Some(miles),
            provider: provider.into(),
            booking_url: None,
            description: None,
            is_estimated: false,
        })
    }

    /// Derived blended option; always flagged estimated.
    pub fn points_plus_cash(
        miles: u64,
        cash_amount: f64,
        cash_currency: impl AsRef<str>,
        provider: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(cash_amount)?;
        Ok(Self {
            kind: PricingKind::PointsPlusCash,
            cash_amount,
            cash_currency: validate_currency_code(cash_currency.as_ref())?,
            miles: Some(miles),
            provider: provider.into(),
            booking_url: None,
            description: None,
            is_estimated: true,
        })
    }

    pub fn with_booking_url(mut self, booking_url: impl Into<String>) -> Self {
        self.booking_url = Some(booking_url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One leg of an itinerary, copied from the vendor payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSegment {
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare_class: Option<String>,
}

/// Canonical flight result shared by every flight vendor adapter.
///
/// Invariant: when any award pricing exists, `price` still reflects the
/// cash-due portion (0 when miles cover everything).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    pub provider: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miles_required: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default)]
    pub segments: Vec<FlightSegment>,
    #[serde(default)]
    pub pricing_options: Vec<PricingOption>,
}

impl Flight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_time: impl Into<String>,
        arrival_time: impl Into<String>,
        price: f64,
        currency: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(price)?;
        Ok(Self {
            id: id.into(),
            provider: provider.into(),
            origin: origin.into(),
            destination: destination.into(),
            departure_time: departure_time.into(),
            arrival_time: arrival_time.into(),
            price,
            currency: validate_currency_code(currency.as_ref())?,
            airline: None,
            flight_number: None,
            cabin: None,
            miles_required: None,
            booking_url: None,
            availability: None,
            taxes: None,
            fees: None,
            segments: Vec::new(),
            pricing_options: Vec::new(),
        })
    }

    pub fn push_pricing_option(&mut self, option: PricingOption) {
        self.pricing_options.push(option);
    }
}

/// Canonical hotel result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub provider: String,
    pub name: String,
    pub location: String,
    pub price_per_night: f64,
    pub currency: String,
}

impl Hotel {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
        price_per_night: f64,
        currency: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(price_per_night)?;
        Ok(Self {
            id: id.into(),
            provider: provider.into(),
            name: name.into(),
            location: location.into(),
            price_per_night,
            currency: validate_currency_code(currency.as_ref())?,
        })
    }
}

/// Canonical activity result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub provider: String,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub currency: String,
}

impl Activity {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        price: f64,
        currency: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount(price)?;
        Ok(Self {
            id: id.into(),
            provider: provider.into(),
            title: title.into(),
            location: location.into(),
            price,
            currency: validate_currency_code(currency.as_ref())?,
        })
    }
}

fn validate_cash_amount(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "price" });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field: "price" });
    }
    Ok(())
}

fn validate_currency_code(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|ch| ch.is_ascii_uppercase()) {
        Ok(trimmed.to_owned())
    } else {
        Err(ValidationError::InvalidCurrency {
            value: value.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_rejects_lowercase_currency() {
        let err = Flight::new("f1", "kiwi", "LHR", "JFK", "d", "a", 199.0, "usd")
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCurrency { .. }));
    }

    #[test]
    fn flight_rejects_negative_price() {
        let err = Flight::new("f1", "kiwi", "LHR", "JFK", "d", "a", -1.0, "USD")
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeValue { .. }));
    }

    #[test]
    fn award_option_carries_miles_and_is_not_estimated() {
        let option = PricingOption::award(60_000, 11.2, "USD", "seatsaero").expect("valid option");
        assert_eq!(option.kind, PricingKind::Award);
        assert_eq!(option.miles, Some(60_000));
        assert!(!option.is_estimated);
    }

    #[test]
    fn points_plus_cash_option_is_always_estimated() {
        let option =
            PricingOption::points_plus_cash(36_000, 323.2, "USD", "pointme").expect("valid option");
        assert!(option.is_estimated);
    }

    #[test]
    fn cabin_round_trips_through_from_str() {
        for cabin in [
            CabinClass::Economy,
            CabinClass::PremiumEconomy,
            CabinClass::Business,
            CabinClass::First,
        ] {
            assert_eq!(cabin.as_str().parse::<CabinClass>().expect("valid"), cabin);
        }
    }
}
