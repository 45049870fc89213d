pub mod models;
pub mod timestamp;

pub use models::{
    Activity, CabinClass, Flight, FlightSegment, Hotel, PricingKind, PricingOption,
};
pub use timestamp::UtcDateTime;
