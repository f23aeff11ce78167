use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedObservation, GeocodedLocation, Location, WeatherObservation};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// Result of joining readings with their geocoded locations
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// One entry per input reading, in input order
    pub enriched: Vec<EnrichedObservation>,
    /// Readings whose location has no geocoded entry at all
    pub unmatched_rows: usize,
    /// Readings whose location was geocoded but produced no city
    pub unresolved_rows: usize,
    /// Distinct locations of every reading left without a city, sorted
    pub unmatched_coordinates: Vec<Location>,
    /// Geocoded entries dropped because their key was already present
    pub duplicate_locations: usize,
}

impl MergeReport {
    /// Rows without a city, whatever the cause
    pub fn rows_without_city(&self) -> usize {
        self.unmatched_rows + self.unresolved_rows
    }
}

pub struct DataMerger;

impl DataMerger {
    pub fn new() -> Self {
        Self
    }

    /// Left join of readings onto geocoded locations by rounded coordinates
    ///
    /// Fails with [`ProcessingError::IntegrityViolation`] if the join does not
    /// yield exactly one row per reading.
    pub fn merge(
        &self,
        observations: Vec<WeatherObservation>,
        geocoded: &[GeocodedLocation],
    ) -> Result<MergeReport> {
        info!("Merging geocoded data with weather data...");

        let (lookup, duplicate_locations) = self.index_locations(geocoded);
        let expected = observations.len();

        let mut enriched = Vec::with_capacity(expected);
        let mut unmatched_rows = 0;
        let mut unresolved_rows = 0;
        let mut unmatched_coordinates = BTreeSet::new();

        for observation in observations {
            let location = observation.location();
            match lookup.get(&location) {
                Some(entry) => {
                    if !entry.is_resolved() {
                        unresolved_rows += 1;
                        unmatched_coordinates.insert(location);
                    }
                    enriched.push(EnrichedObservation::matched(observation, entry));
                }
                None => {
                    unmatched_rows += 1;
                    unmatched_coordinates.insert(location);
                    enriched.push(EnrichedObservation::unmatched(observation));
                }
            }
        }

        if enriched.len() != expected {
            return Err(ProcessingError::IntegrityViolation {
                stage: "Weather merge",
                expected,
                actual: enriched.len(),
            });
        }

        info!("Merge complete: {} rows", enriched.len());

        if unmatched_rows > 0 {
            warn!("{} rows have no geocoded location", unmatched_rows);
        }
        if unresolved_rows > 0 {
            warn!(
                "{} rows belong to locations the geocoder could not name",
                unresolved_rows
            );
        }
        if !unmatched_coordinates.is_empty() {
            warn!(
                "{} distinct coordinates left without a city",
                unmatched_coordinates.len()
            );
        }

        Ok(MergeReport {
            enriched,
            unmatched_rows,
            unresolved_rows,
            unmatched_coordinates: unmatched_coordinates.into_iter().collect(),
            duplicate_locations,
        })
    }

    /// Index geocoded entries by key, keeping the first of any duplicates
    fn index_locations<'a>(
        &self,
        geocoded: &'a [GeocodedLocation],
    ) -> (HashMap<Location, &'a GeocodedLocation>, usize) {
        let mut lookup = HashMap::with_capacity(geocoded.len());
        let mut duplicates = 0;

        for entry in geocoded {
            if lookup.contains_key(&entry.location) {
                duplicates += 1;
            } else {
                lookup.insert(entry.location, entry);
            }
        }

        if duplicates > 0 {
            warn!(
                "Found {} duplicate coordinate pairs in geocoded data; keeping the first of each",
                duplicates
            );
        }

        (lookup, duplicates)
    }
}

impl Default for DataMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricType;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn reading(lat: f64, long: f64) -> WeatherObservation {
        WeatherObservation::new(
            "AE000041196".to_string(),
            "SHARJAH INTER.".to_string(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            MetricType::Tmax,
            lat,
            long,
            Some(293.0),
        )
    }

    fn place(lat: f64, long: f64, city: &str) -> GeocodedLocation {
        GeocodedLocation::new(
            Location::from_degrees(lat, long),
            city.to_string(),
            String::new(),
            "United Arab Emirates".to_string(),
            String::new(),
        )
    }

    #[test]
    fn test_merge_keeps_every_row() -> Result<()> {
        let mut observations: Vec<_> = (0..99).map(|_| reading(25.3331, 55.517)).collect();
        observations.push(reading(10.0, 10.0));

        let report = DataMerger::new().merge(observations, &[place(25.333, 55.517, "Sharjah")])?;

        assert_eq!(report.enriched.len(), 100);
        assert_eq!(report.unmatched_rows, 1);
        assert_eq!(
            report.unmatched_coordinates,
            vec![Location::from_degrees(10.0, 10.0)]
        );
        assert_eq!(report.enriched[0].city, "Sharjah");
        assert!(report.enriched[0].matched);
        assert!(!report.enriched[99].matched);
        assert_eq!(report.enriched[99].city, "");
        Ok(())
    }

    #[test]
    fn test_duplicate_locations_keep_first() -> Result<()> {
        let geocoded = vec![
            place(25.333, 55.517, "Sharjah"),
            place(25.333, 55.517, "Dubai"),
        ];

        let report = DataMerger::new().merge(vec![reading(25.333, 55.517)], &geocoded)?;

        assert_eq!(report.enriched.len(), 1);
        assert_eq!(report.enriched[0].city, "Sharjah");
        assert_eq!(report.duplicate_locations, 1);
        Ok(())
    }

    #[test]
    fn test_unresolved_locations_are_counted_separately() -> Result<()> {
        let geocoded = vec![GeocodedLocation::unresolved(Location::from_degrees(
            1.0, 1.0,
        ))];

        let report = DataMerger::new().merge(vec![reading(1.0, 1.0)], &geocoded)?;

        assert_eq!(report.unmatched_rows, 0);
        assert_eq!(report.unresolved_rows, 1);
        assert_eq!(report.rows_without_city(), 1);
        assert_eq!(
            report.unmatched_coordinates,
            vec![Location::from_degrees(1.0, 1.0)]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_coordinates_surface_as_unmatched() -> Result<()> {
        let report = DataMerger::new().merge(
            vec![reading(95.0, 10.0)],
            &[place(25.333, 55.517, "Sharjah")],
        )?;

        assert_eq!(report.enriched.len(), 1);
        assert_eq!(report.unmatched_rows, 1);
        Ok(())
    }
}
