use crate::models::{GeocodedLocation, Location, WeatherObservation};

/// A weather reading joined with the place names of its location
///
/// Produced for every input reading. `matched` is false when no geocoded
/// location existed for the key, in which case all place fields are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedObservation {
    pub observation: WeatherObservation,
    pub location: Location,
    pub city: String,
    pub state: String,
    pub country: String,
    pub suburb: String,
    pub matched: bool,
}

impl EnrichedObservation {
    pub fn matched(observation: WeatherObservation, geocoded: &GeocodedLocation) -> Self {
        Self {
            location: geocoded.location,
            city: geocoded.city.clone(),
            state: geocoded.state.clone(),
            country: geocoded.country.clone(),
            suburb: geocoded.suburb.clone(),
            observation,
            matched: true,
        }
    }

    pub fn unmatched(observation: WeatherObservation) -> Self {
        Self {
            location: observation.location(),
            observation,
            city: String::new(),
            state: String::new(),
            country: String::new(),
            suburb: String::new(),
            matched: false,
        }
    }

    pub fn has_city(&self) -> bool {
        !self.city.is_empty()
    }
}
