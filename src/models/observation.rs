use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::Location;
use crate::utils::constants::{METRIC_PRCP, METRIC_TAVG, METRIC_TMAX, METRIC_TMIN};

/// Measurement kind carried in the `data_type` column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricType {
    Tmin,
    Tmax,
    Tavg,
    Prcp,
    Other(String),
}

impl MetricType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            METRIC_TMIN => MetricType::Tmin,
            METRIC_TMAX => MetricType::Tmax,
            METRIC_TAVG => MetricType::Tavg,
            METRIC_PRCP => MetricType::Prcp,
            other => MetricType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Tmin => METRIC_TMIN,
            MetricType::Tmax => METRIC_TMAX,
            MetricType::Tavg => METRIC_TAVG,
            MetricType::Prcp => METRIC_PRCP,
            MetricType::Other(name) => name,
        }
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self, MetricType::Tmin | MetricType::Tmax | MetricType::Tavg)
    }
}

impl From<String> for MetricType {
    fn from(s: String) -> Self {
        MetricType::parse(&s)
    }
}

impl From<MetricType> for String {
    fn from(metric: MetricType) -> Self {
        metric.as_str().to_string()
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw reading: a station, a day of the reference year and one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeatherObservation {
    pub station_id: String,
    pub station_name: String,
    pub date: NaiveDate,
    pub metric: MetricType,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    // Tenths of a unit, as in the source file
    pub value: Option<f64>,
}

impl WeatherObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        station_id: String,
        station_name: String,
        date: NaiveDate,
        metric: MetricType,
        latitude: f64,
        longitude: f64,
        value: Option<f64>,
    ) -> Self {
        Self {
            station_id,
            station_name,
            date,
            metric,
            latitude,
            longitude,
            value,
        }
    }

    /// The rounded geocoding key for this reading's station
    pub fn location(&self) -> Location {
        Location::from_degrees(self.latitude, self.longitude)
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.validate().is_ok()
    }
}
