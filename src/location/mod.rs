//! Location intelligence subsystem.
//!
//! Reverse geocoding through interchangeable providers, offline time zone
//! fallback, time zone naming, plus codes and the public-land overlay.

pub mod fallback;
pub mod plus_code;
pub mod providers;
pub mod public_lands;
pub mod timezone_name;
pub mod types;

pub use fallback::FallbackResolver;
pub use providers::{AddressFields, Payload, Provider, ProviderLookup};
pub use public_lands::{access_label, PublicLandRecord, PublicLandsClient};
pub use timezone_name::TimezoneDisplay;
pub use types::{
    AddressSnapshot, Coordinate, ProviderConfig, ProviderError, ProviderKind, TimezoneResolution, TimezoneSource,
};
