use crate::error::{ProcessingError, Result};
use crate::models::{MetricType, WeatherObservation};
use crate::utils::constants::REFERENCE_YEAR;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Row layout of the averaged station export
#[derive(Debug, Deserialize)]
struct RawObservationRow {
    id: String,
    date: String,
    data_type: String,
    lat: Option<f64>,
    long: Option<f64>,
    #[serde(default)]
    name: String,
    #[serde(rename = "AVG")]
    value: Option<f64>,
}

/// Counts collected while reading the raw export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadReport {
    pub rows_read: usize,
    pub invalid_dates: usize,
    pub missing_coordinates: usize,
    pub null_values: BTreeMap<&'static str, usize>,
}

impl ReadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.invalid_dates - self.missing_coordinates
    }
}

pub struct ObservationReader {
    reference_year: i32,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            reference_year: REFERENCE_YEAR,
        }
    }

    /// Read every observation from the raw CSV export
    pub fn read_observations(&self, path: &Path) -> Result<(Vec<WeatherObservation>, ReadReport)> {
        if !path.exists() {
            return Err(ProcessingError::InputNotFound(path.to_path_buf()));
        }

        let size_mb = std::fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0);
        info!("Reading weather data from {}", path.display());
        info!("Input file size: {:.1} MB", size_mb);

        let file = File::open(path)?;
        self.read_from(file)
    }

    /// Read observations from any CSV source with a header row
    pub fn read_from<R: Read>(&self, source: R) -> Result<(Vec<WeatherObservation>, ReadReport)> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
        let mut observations = Vec::new();
        let mut report = ReadReport::default();

        for row in reader.deserialize::<RawObservationRow>() {
            let row = row?;
            report.rows_read += 1;
            self.count_nulls(&row, &mut report);

            let Some(date) = parse_mmdd_date(&row.date, self.reference_year) else {
                report.invalid_dates += 1;
                continue;
            };

            let (Some(latitude), Some(longitude)) = (row.lat, row.long) else {
                report.missing_coordinates += 1;
                continue;
            };

            observations.push(WeatherObservation::new(
                row.id,
                row.name,
                date,
                MetricType::parse(&row.data_type),
                latitude,
                longitude,
                row.value,
            ));
        }

        info!("Loaded {} weather records", report.rows_read);

        if !report.null_values.is_empty() {
            warn!("Null values found: {:?}", report.null_values);
        }
        if report.invalid_dates > 0 {
            warn!(
                "Found {} invalid dates, dropping these rows",
                report.invalid_dates
            );
        }
        if report.missing_coordinates > 0 {
            warn!(
                "Found {} rows without coordinates, dropping these rows",
                report.missing_coordinates
            );
        }

        Ok((observations, report))
    }

    fn count_nulls(&self, row: &RawObservationRow, report: &mut ReadReport) {
        let checks = [
            ("id", row.id.is_empty()),
            ("date", row.date.is_empty()),
            ("data_type", row.data_type.is_empty()),
            ("lat", row.lat.is_none()),
            ("long", row.long.is_none()),
            ("name", row.name.is_empty()),
            ("AVG", row.value.is_none()),
        ];

        for (column, is_null) in checks {
            if is_null {
                *report.null_values.entry(column).or_default() += 1;
            }
        }
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an MMDD day code (e.g. `101` for 1 January) onto the reference year
pub fn parse_mmdd_date(raw: &str, year: i32) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let code = match trimmed.parse::<u32>() {
        Ok(code) => code,
        Err(_) => {
            // Some exports write the code as a float, e.g. "101.0"
            let float = trimmed.parse::<f64>().ok()?;
            if float.fract() != 0.0 || float < 0.0 {
                return None;
            }
            float as u32
        }
    };

    if code > 1231 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, code / 100, code % 100)
}
