use crate::geocoding::address::geocoded_from_address;
use crate::geocoding::{RateLimiter, ReverseGeocoder};
use crate::models::{GeocodedLocation, Location};
use std::time::Duration;
use tracing::{debug, warn};

/// Rate-limited, failure-isolating front for a [`ReverseGeocoder`]
///
/// Every call resolves to a [`GeocodedLocation`]; provider errors and empty
/// answers become an unresolved record for that one location.
pub struct GeocodeResolver<G> {
    geocoder: G,
    limiter: RateLimiter,
    calls: usize,
    failures: usize,
}

impl<G: ReverseGeocoder> GeocodeResolver<G> {
    pub fn new(geocoder: G, min_delay: Duration) -> Self {
        Self {
            geocoder,
            limiter: RateLimiter::new(min_delay),
            calls: 0,
            failures: 0,
        }
    }

    pub async fn resolve(&mut self, location: Location) -> GeocodedLocation {
        self.limiter.acquire().await;
        self.calls += 1;

        match self.geocoder.reverse(&location).await {
            Ok(Some(address)) => {
                let geocoded = geocoded_from_address(location, &address);
                if geocoded.is_resolved() {
                    debug!("Geocoded {} -> {}", location, geocoded.city);
                } else {
                    debug!("No city in address for {}", location);
                }
                geocoded
            }
            Ok(None) => {
                debug!("No result for {}", location);
                GeocodedLocation::unresolved(location)
            }
            Err(e) => {
                self.failures += 1;
                warn!("Error geocoding {}: {}", location, e);
                GeocodedLocation::unresolved(location)
            }
        }
    }

    /// Provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Calls that ended in a provider error
    pub fn failures(&self) -> usize {
        self.failures
    }
}
