use crate::analyzers::WeatherStatistics;
use crate::error::Result;
use crate::utils::write_atomically;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Contents of `processing_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub total_records: usize,
    pub unique_cities: usize,
    pub unique_countries: usize,
    pub unique_stations: usize,
    pub date_range: Option<Range<NaiveDate>>,
    pub temperature_range: Option<Range<f64>>,
    pub unmatched_records: usize,
    pub failed_geocodes: usize,
    pub processing_timestamp: DateTime<Utc>,
}

impl ProcessingSummary {
    pub fn new(stats: &WeatherStatistics, unmatched_records: usize, failed_geocodes: usize) -> Self {
        Self {
            total_records: stats.total_records,
            unique_cities: stats.unique_cities,
            unique_countries: stats.unique_countries,
            unique_stations: stats.unique_stations,
            date_range: stats.date_range.map(|(min, max)| Range { min, max }),
            temperature_range: stats.temperature_range.map(|(min, max)| Range { min, max }),
            unmatched_records,
            failed_geocodes,
            processing_timestamp: Utc::now(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomically(path, |out| {
            serde_json::to_writer_pretty(out, self)?;
            Ok(())
        })
    }
}
