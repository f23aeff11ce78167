use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Location, MetricType};

/// Grouping key of the wide table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PivotKey {
    pub city: String,
    pub country: String,
    pub state: String,
    pub suburb: String,
    pub location: Location,
    pub date: NaiveDate,
    pub station_name: String,
}

/// One row per place, day and station with one column per metric
///
/// Temperatures are in °C and precipitation in mm once normalized.
/// Metrics other than the four standard ones are kept in `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotedRecord {
    pub city: String,
    pub country: String,
    pub state: String,
    pub suburb: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "long")]
    pub longitude: f64,
    pub date: NaiveDate,
    #[serde(rename = "name")]
    pub station_name: String,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "PRCP")]
    pub prcp: Option<f64>,
    #[serde(flatten)]
    pub other: BTreeMap<String, f64>,
}

impl PivotedRecord {
    pub fn from_key(key: PivotKey) -> Self {
        Self {
            latitude: key.location.latitude(),
            longitude: key.location.longitude(),
            city: key.city,
            country: key.country,
            state: key.state,
            suburb: key.suburb,
            date: key.date,
            station_name: key.station_name,
            tmax: None,
            tmin: None,
            tavg: None,
            prcp: None,
            other: BTreeMap::new(),
        }
    }

    pub fn metric(&self, metric: &MetricType) -> Option<f64> {
        match metric {
            MetricType::Tmax => self.tmax,
            MetricType::Tmin => self.tmin,
            MetricType::Tavg => self.tavg,
            MetricType::Prcp => self.prcp,
            MetricType::Other(name) => self.other.get(name).copied(),
        }
    }

    pub fn metric_mut(&mut self, metric: &MetricType) -> Option<&mut Option<f64>> {
        match metric {
            MetricType::Tmax => Some(&mut self.tmax),
            MetricType::Tmin => Some(&mut self.tmin),
            MetricType::Tavg => Some(&mut self.tavg),
            MetricType::Prcp => Some(&mut self.prcp),
            MetricType::Other(_) => None,
        }
    }

    /// Temperature columns present on this row, labelled
    pub fn temperatures(&self) -> [(&'static str, Option<f64>); 3] {
        [("TMAX", self.tmax), ("TMIN", self.tmin), ("TAVG", self.tavg)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_output_column_names() {
        let key = PivotKey {
            city: "Sharjah".to_string(),
            country: "United Arab Emirates".to_string(),
            state: "Sharjah".to_string(),
            suburb: String::new(),
            location: Location::from_degrees(25.333, 55.517),
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            station_name: "SHARJAH INTER.".to_string(),
        };
        let mut record = PivotedRecord::from_key(key);
        record.tmax = Some(29.3);
        record.other.insert("SNWD".to_string(), 0.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["city"], "Sharjah");
        assert_eq!(json["lat"], 25.333);
        assert_eq!(json["date"], "2020-01-01");
        assert_eq!(json["name"], "SHARJAH INTER.");
        assert_eq!(json["TMAX"], 29.3);
        assert!(json["TMIN"].is_null());
        assert_eq!(json["SNWD"], 0.0);
    }
}
