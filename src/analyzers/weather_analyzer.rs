use crate::models::PivotedRecord;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherStatistics {
    pub total_records: usize,
    pub unique_cities: usize,
    pub unique_countries: usize,
    pub unique_stations: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Range of TAVG in °C
    pub temperature_range: Option<(f64, f64)>,
    pub geographic_bounds: Option<GeographicBounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Summary statistics over the final wide table
pub struct WeatherAnalyzer;

impl WeatherAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, records: &[PivotedRecord]) -> WeatherStatistics {
        let distinct = |field: fn(&PivotedRecord) -> &str| {
            records
                .iter()
                .map(field)
                .filter(|value| !value.is_empty())
                .collect::<HashSet<_>>()
                .len()
        };

        let date_range = records
            .iter()
            .map(|r| r.date)
            .fold(None, |range: Option<(NaiveDate, NaiveDate)>, date| {
                Some(match range {
                    None => (date, date),
                    Some((min, max)) => (min.min(date), max.max(date)),
                })
            });

        let temperature_range = records
            .iter()
            .filter_map(|r| r.tavg)
            .fold(None, |range: Option<(f64, f64)>, t| {
                Some(match range {
                    None => (t, t),
                    Some((min, max)) => (min.min(t), max.max(t)),
                })
            });

        let geographic_bounds = records
            .iter()
            .fold(None, |bounds: Option<GeographicBounds>, r| {
                Some(match bounds {
                    None => GeographicBounds {
                        min_lat: r.latitude,
                        max_lat: r.latitude,
                        min_lon: r.longitude,
                        max_lon: r.longitude,
                    },
                    Some(b) => GeographicBounds {
                        min_lat: b.min_lat.min(r.latitude),
                        max_lat: b.max_lat.max(r.latitude),
                        min_lon: b.min_lon.min(r.longitude),
                        max_lon: b.max_lon.max(r.longitude),
                    },
                })
            });

        WeatherStatistics {
            total_records: records.len(),
            unique_cities: distinct(|r| r.city.as_str()),
            unique_countries: distinct(|r| r.country.as_str()),
            unique_stations: distinct(|r| r.station_name.as_str()),
            date_range,
            temperature_range,
            geographic_bounds,
        }
    }
}

impl WeatherStatistics {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "=== Summary Statistics ===\n\
            Total records: {}\n\
            Unique cities: {}\n\
            Unique countries: {}\n\
            Unique stations: {}\n",
            self.total_records, self.unique_cities, self.unique_countries, self.unique_stations
        );

        if let Some((min, max)) = self.date_range {
            summary.push_str(&format!("Date range: {} to {}\n", min, max));
        }
        if let Some((min, max)) = self.temperature_range {
            summary.push_str(&format!(
                "Temperature range: {:.1}°C to {:.1}°C\n",
                min, max
            ));
        }
        if let Some(bounds) = &self.geographic_bounds {
            summary.push_str(&format!(
                "Geographic bounds: {:.3}°N to {:.3}°N, {:.3}°E to {:.3}°E\n",
                bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
            ));
        }

        summary
    }
}

impl Default for WeatherAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PivotKey};
    use pretty_assertions::assert_eq;

    fn record(city: &str, station: &str, day: u32, tavg: Option<f64>) -> PivotedRecord {
        let mut record = PivotedRecord::from_key(PivotKey {
            city: city.to_string(),
            country: if city.is_empty() { "" } else { "Spain" }.to_string(),
            state: String::new(),
            suburb: String::new(),
            location: Location::from_degrees(40.0 + day as f64, -3.0),
            date: NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
            station_name: station.to_string(),
        });
        record.tavg = tavg;
        record
    }

    #[test]
    fn test_analyze() {
        let records = vec![
            record("Madrid", "MADRID RETIRO", 2, Some(12.5)),
            record("Madrid", "MADRID BARAJAS", 1, Some(-1.0)),
            record("Toledo", "TOLEDO", 5, None),
            record("", "UNKNOWN", 3, Some(30.0)),
        ];

        let stats = WeatherAnalyzer::new().analyze(&records);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_cities, 2);
        assert_eq!(stats.unique_countries, 1);
        assert_eq!(stats.unique_stations, 4);
        assert_eq!(
            stats.date_range,
            Some((
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 3, 5).unwrap()
            ))
        );
        assert_eq!(stats.temperature_range, Some((-1.0, 30.0)));
        assert_eq!(stats.geographic_bounds.as_ref().unwrap().max_lat, 45.0);
        assert!(stats.summary().contains("Temperature range: -1.0°C to 30.0°C"));
    }

    #[test]
    fn test_geographic_bounds_cover_every_record() {
        let mut west = record("Lisbon", "LISBOA", 4, None);
        west.longitude = -9.139;
        let records = vec![record("Madrid", "MADRID RETIRO", 1, None), west];

        let bounds = WeatherAnalyzer::new()
            .analyze(&records)
            .geographic_bounds
            .unwrap();

        assert_eq!(
            bounds,
            GeographicBounds {
                min_lat: 41.0,
                max_lat: 44.0,
                min_lon: -9.139,
                max_lon: -3.0,
            }
        );
    }

    #[test]
    fn test_empty_table() {
        let stats = WeatherAnalyzer::new().analyze(&[]);
        assert_eq!(stats.total_records, 0);
        assert!(stats.date_range.is_none());
        assert!(stats.temperature_range.is_none());
        assert!(!stats.summary().contains("Date range"));
    }
}
