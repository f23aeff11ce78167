use serde::{Serialize, Serializer};
use std::fmt;

use crate::utils::coordinates::{from_milli_degrees, to_milli_degrees};

/// A coordinate pair snapped to the 0.001° geocoding grid
///
/// Stored as integer thousandths of a degree so equality, hashing and
/// ordering are exact. Every join in the pipeline keys on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    lat_milli: i32,
    lon_milli: i32,
}

impl Location {
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_milli: to_milli_degrees(latitude),
            lon_milli: to_milli_degrees(longitude),
        }
    }

    pub fn from_milli_degrees(lat_milli: i32, lon_milli: i32) -> Self {
        Self {
            lat_milli,
            lon_milli,
        }
    }

    pub fn latitude(&self) -> f64 {
        from_milli_degrees(self.lat_milli)
    }

    pub fn longitude(&self) -> f64 {
        from_milli_degrees(self.lon_milli)
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.latitude(), self.longitude()]
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude(), self.longitude())
    }
}

// Serialized as a bare `[lat, long]` pair
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_pair().serialize(serializer)
    }
}

/// Place names resolved for one location
///
/// Any field may be empty when the provider had nothing for it. An empty
/// city marks a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodedLocation {
    pub location: Location,
    pub city: String,
    pub state: String,
    pub country: String,
    pub suburb: String,
}

impl GeocodedLocation {
    pub fn new(
        location: Location,
        city: String,
        state: String,
        country: String,
        suburb: String,
    ) -> Self {
        Self {
            location,
            city,
            state,
            country,
            suburb,
        }
    }

    pub fn unresolved(location: Location) -> Self {
        Self::new(
            location,
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        )
    }

    pub fn is_resolved(&self) -> bool {
        !self.city.is_empty()
    }
}
