use crate::models::{Location, WeatherObservation};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Distinct geocoding inputs derived from the raw readings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSet {
    /// Sorted by latitude then longitude so batching is reproducible
    pub locations: Vec<Location>,
    pub invalid_rows: usize,
    /// Distinct unrounded coordinate pairs among valid rows
    pub raw_unique: usize,
}

impl LocationSet {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

pub struct LocationExtractor;

impl LocationExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Deduplicate the rounded coordinates of every valid reading
    ///
    /// Readings outside the latitude/longitude bounds are left out of the
    /// set; they still flow into the merge where they surface as unmatched.
    pub fn extract(&self, observations: &[WeatherObservation]) -> LocationSet {
        info!("Getting unique locations from weather data...");

        let mut invalid_rows = 0;
        let mut raw_pairs = BTreeSet::new();
        let mut rounded = BTreeSet::new();

        for observation in observations {
            if !observation.has_valid_coordinates() {
                invalid_rows += 1;
                continue;
            }

            raw_pairs.insert((
                observation.latitude.to_bits(),
                observation.longitude.to_bits(),
            ));
            rounded.insert(observation.location());
        }

        if invalid_rows > 0 {
            warn!(
                "Removing {} records with invalid coordinates from the location set",
                invalid_rows
            );
        }

        info!(
            "Found {} unique weather station locations",
            raw_pairs.len()
        );
        info!("After rounding to 3 decimals: {} unique locations", rounded.len());

        LocationSet {
            locations: rounded.into_iter().collect(),
            invalid_rows,
            raw_unique: raw_pairs.len(),
        }
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        Self::new()
    }
}
