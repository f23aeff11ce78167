//! Reverse geocoding of station locations
//!
//! [`ReverseGeocoder`] is the seam to the external provider. The
//! [`GeocodeResolver`] wraps any provider with the minimum inter-call delay
//! and per-location failure isolation.

pub mod address;
pub mod nominatim;
pub mod rate_limiter;
pub mod resolver;

pub use address::{extract_address_field, AddressMap};
pub use nominatim::NominatimClient;
pub use rate_limiter::RateLimiter;
pub use resolver::GeocodeResolver;

use crate::error::Result;
use crate::models::Location;
use async_trait::async_trait;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address for one location
    ///
    /// `Ok(None)` means the provider answered but had no match.
    async fn reverse(&self, location: &Location) -> Result<Option<AddressMap>>;
}
