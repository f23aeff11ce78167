use crate::models::{EnrichedObservation, MetricType, PivotKey, PivotedRecord};
use crate::utils::constants::{MAX_PLAUSIBLE_TEMP, MIN_PLAUSIBLE_TEMP, TENTHS_DIVISOR};
use crate::utils::round_to;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Wide table plus what happened while building it
#[derive(Debug, Clone, Default)]
pub struct PivotReport {
    /// Sorted by place, coordinates, date and station
    pub records: Vec<PivotedRecord>,
    /// Readings dropped because their (key, metric) cell was already filled
    pub duplicate_cells: usize,
    pub tavg_filled: usize,
    /// Out-of-range temperatures per column, after conversion to °C
    pub extreme_temperatures: BTreeMap<&'static str, usize>,
}

impl PivotReport {
    pub fn extreme_total(&self) -> usize {
        self.extreme_temperatures.values().sum()
    }
}

pub struct DataPivoter;

impl DataPivoter {
    pub fn new() -> Self {
        Self
    }

    /// Reshape one-row-per-metric readings into one row per place, day and station
    ///
    /// A cell takes the first non-null reading for its key and metric; later
    /// ones are counted in [`PivotReport::duplicate_cells`] and dropped.
    pub fn pivot(&self, rows: &[EnrichedObservation]) -> PivotReport {
        info!("Pivoting data by location and date...");

        let mut cells: BTreeMap<PivotKey, BTreeMap<MetricType, f64>> = BTreeMap::new();
        let mut duplicate_cells = 0;

        for row in rows {
            let metrics = cells.entry(Self::key_for(row)).or_default();
            let Some(value) = row.observation.value else {
                continue;
            };
            if metrics.contains_key(&row.observation.metric) {
                duplicate_cells += 1;
            } else {
                metrics.insert(row.observation.metric.clone(), value);
            }
        }

        if duplicate_cells > 0 {
            warn!(
                "{} readings collided on the same location, date, station and metric; kept the first of each",
                duplicate_cells
            );
        }

        info!("Processing weather values...");
        let mut tavg_filled = 0;
        let records: Vec<PivotedRecord> = cells
            .into_iter()
            .map(|(key, metrics)| {
                let (record, filled) = Self::build_record(key, metrics);
                tavg_filled += usize::from(filled);
                record
            })
            .collect();

        if tavg_filled > 0 {
            info!(
                "Filled {} missing TAVG values using TMAX/TMIN average",
                tavg_filled
            );
        }

        let extreme_temperatures = Self::count_extremes(&records);
        for (column, count) in &extreme_temperatures {
            warn!(
                "Found {} extreme {} values (< {}°C or > {}°C)",
                count, column, MIN_PLAUSIBLE_TEMP, MAX_PLAUSIBLE_TEMP
            );
        }

        info!("Final dataset has {} records", records.len());

        PivotReport {
            records,
            duplicate_cells,
            tavg_filled,
            extreme_temperatures,
        }
    }

    fn key_for(row: &EnrichedObservation) -> PivotKey {
        PivotKey {
            city: row.city.clone(),
            country: row.country.clone(),
            state: row.state.clone(),
            suburb: row.suburb.clone(),
            location: row.location,
            date: row.observation.date,
            station_name: row.observation.station_name.clone(),
        }
    }

    /// Fill TAVG from raw TMAX/TMIN, then convert tenths to whole units
    fn build_record(key: PivotKey, metrics: BTreeMap<MetricType, f64>) -> (PivotedRecord, bool) {
        let mut record = PivotedRecord::from_key(key);

        for (metric, value) in metrics {
            match record.metric_mut(&metric) {
                Some(cell) => *cell = Some(value),
                None => {
                    record.other.insert(metric.as_str().to_string(), value);
                }
            }
        }

        let filled = match (record.tavg, record.tmax, record.tmin) {
            (None, Some(max), Some(min)) => {
                record.tavg = Some((max + min) / 2.0);
                true
            }
            _ => false,
        };

        for cell in [
            &mut record.tmax,
            &mut record.tmin,
            &mut record.tavg,
            &mut record.prcp,
        ] {
            *cell = cell.map(from_tenths);
        }

        (record, filled)
    }

    fn count_extremes(records: &[PivotedRecord]) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for record in records {
            for (column, value) in record.temperatures() {
                if value.is_some_and(|t| !is_plausible_temperature(t)) {
                    *counts.entry(column).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

impl Default for DataPivoter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tenths of a unit to whole units, rounded to 2 decimals
pub fn from_tenths(value: f64) -> f64 {
    round_to(value / TENTHS_DIVISOR, 2)
}

pub fn is_plausible_temperature(celsius: f64) -> bool {
    (MIN_PLAUSIBLE_TEMP..=MAX_PLAUSIBLE_TEMP).contains(&celsius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeocodedLocation, Location, WeatherObservation};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sharjah() -> GeocodedLocation {
        GeocodedLocation::new(
            Location::from_degrees(25.333, 55.517),
            "Sharjah".to_string(),
            "Sharjah".to_string(),
            "United Arab Emirates".to_string(),
            String::new(),
        )
    }

    fn row(day: u32, metric: &str, value: Option<f64>) -> EnrichedObservation {
        let observation = WeatherObservation::new(
            "AE000041196".to_string(),
            "SHARJAH INTER.".to_string(),
            NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            MetricType::parse(metric),
            25.333,
            55.517,
            value,
        );
        EnrichedObservation::matched(observation, &sharjah())
    }

    #[test]
    fn test_pivot_converts_units() {
        let report = DataPivoter::new().pivot(&[
            row(1, "TMAX", Some(235.0)),
            row(1, "TMIN", Some(147.0)),
            row(1, "PRCP", Some(47.0)),
            row(1, "TAVG", Some(190.0)),
        ]);

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.tmax, Some(23.5));
        assert_eq!(record.tmin, Some(14.7));
        assert_eq!(record.prcp, Some(4.7));
        assert_eq!(record.tavg, Some(19.0));
        assert_eq!(report.tavg_filled, 0);
        assert_eq!(record.date.to_string(), "2020-01-01");
    }

    #[test]
    fn test_missing_tavg_is_filled_from_extremes() {
        let report = DataPivoter::new().pivot(&[
            row(1, "TMAX", Some(300.0)),
            row(1, "TMIN", Some(100.0)),
            row(2, "TMAX", Some(310.0)),
        ]);

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].tavg, Some(20.0));
        // Only TMAX present: nothing to average
        assert_eq!(report.records[1].tavg, None);
        assert_eq!(report.tavg_filled, 1);
    }

    #[test]
    fn test_duplicate_cells_keep_first_non_null() {
        let report = DataPivoter::new().pivot(&[
            row(1, "TMAX", None),
            row(1, "TMAX", Some(250.0)),
            row(1, "TMAX", Some(260.0)),
        ]);

        assert_eq!(report.records[0].tmax, Some(25.0));
        assert_eq!(report.duplicate_cells, 1);
    }

    #[test]
    fn test_other_metrics_stay_raw() {
        let report = DataPivoter::new().pivot(&[row(1, "SNWD", Some(12.0))]);

        let record = &report.records[0];
        assert_eq!(record.other.get("SNWD"), Some(&12.0));
        assert_eq!(record.tmax, None);
    }

    #[test]
    fn test_extreme_temperatures_are_flagged_not_removed() {
        let report = DataPivoter::new().pivot(&[
            row(1, "TMAX", Some(700.0)),
            row(2, "TMIN", Some(-950.0)),
            row(3, "TMAX", Some(250.0)),
        ]);

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.extreme_temperatures.get("TMAX"), Some(&1));
        assert_eq!(report.extreme_temperatures.get("TMIN"), Some(&1));
        assert_eq!(report.extreme_total(), 2);
    }

    #[test]
    fn test_unmatched_rows_keep_empty_place_fields() {
        let observation = WeatherObservation::new(
            "XX0001".to_string(),
            "NOWHERE".to_string(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
            MetricType::Tmax,
            10.0,
            10.0,
            Some(100.0),
        );
        let report = DataPivoter::new().pivot(&[EnrichedObservation::unmatched(observation)]);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].city, "");
        assert_eq!(report.records[0].latitude, 10.0);
    }

    #[test]
    fn test_from_tenths() {
        assert_eq!(from_tenths(235.0), 23.5);
        assert_eq!(from_tenths(-12.0), -1.2);
        assert!(is_plausible_temperature(60.0));
        assert!(!is_plausible_temperature(60.1));
    }
}
