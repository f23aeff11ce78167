use crate::models::PivotedRecord;
use crate::processors::data_pivoter::is_plausible_temperature;
use crate::utils::constants::MIN_COLUMN_COMPLETENESS;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

const TOP_COUNTRIES: usize = 10;
const REPORTED_VIOLATIONS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub total_records: usize,
    /// Rows repeating an earlier (city, country, lat, long, date)
    pub duplicate_records: usize,
    /// Percentage of non-empty values per output column, in column order
    pub completeness: Vec<(String, f64)>,
    pub coverage: GeographicCoverage,
    /// Most frequent countries, most records first
    pub top_countries: Vec<(String, usize)>,
    pub temperature_violations: Vec<TemperatureViolation>,
}

impl IntegrityReport {
    /// Columns whose completeness is below the reporting threshold
    pub fn sparse_columns(&self) -> Vec<&str> {
        self.completeness
            .iter()
            .filter(|(_, pct)| *pct < MIN_COLUMN_COMPLETENESS)
            .map(|(column, _)| column.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeographicCoverage {
    pub unique_countries: usize,
    pub unique_cities: usize,
    pub latitude_range: Option<(f64, f64)>,
    pub longitude_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureViolation {
    pub city: String,
    pub station_name: String,
    pub date: NaiveDate,
    pub column: &'static str,
    pub value: f64,
}

/// Data-quality checks over the final wide table
pub struct IntegrityChecker;

impl IntegrityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check_integrity(&self, records: &[PivotedRecord]) -> IntegrityReport {
        IntegrityReport {
            total_records: records.len(),
            duplicate_records: self.count_duplicates(records),
            completeness: self.column_completeness(records),
            coverage: self.geographic_coverage(records),
            top_countries: self.top_countries(records),
            temperature_violations: self.temperature_violations(records),
        }
    }

    fn count_duplicates(&self, records: &[PivotedRecord]) -> usize {
        let mut seen = HashSet::with_capacity(records.len());
        records
            .iter()
            .filter(|r| {
                !seen.insert((
                    r.city.as_str(),
                    r.country.as_str(),
                    r.latitude.to_bits(),
                    r.longitude.to_bits(),
                    r.date,
                ))
            })
            .count()
    }

    fn column_completeness(&self, records: &[PivotedRecord]) -> Vec<(String, f64)> {
        let total = records.len();
        let percent = |present: usize| {
            if total == 0 {
                100.0
            } else {
                100.0 * present as f64 / total as f64
            }
        };
        let text = |field: fn(&PivotedRecord) -> &str| {
            percent(records.iter().filter(|r| !field(r).is_empty()).count())
        };
        let numeric = |field: fn(&PivotedRecord) -> Option<f64>| {
            percent(records.iter().filter(|r| field(r).is_some()).count())
        };

        let mut completeness = vec![
            ("city".to_string(), text(|r| r.city.as_str())),
            ("country".to_string(), text(|r| r.country.as_str())),
            ("state".to_string(), text(|r| r.state.as_str())),
            ("suburb".to_string(), text(|r| r.suburb.as_str())),
            ("lat".to_string(), 100.0),
            ("long".to_string(), 100.0),
            ("date".to_string(), 100.0),
            ("name".to_string(), text(|r| r.station_name.as_str())),
            ("TMAX".to_string(), numeric(|r| r.tmax)),
            ("TMIN".to_string(), numeric(|r| r.tmin)),
            ("TAVG".to_string(), numeric(|r| r.tavg)),
            ("PRCP".to_string(), numeric(|r| r.prcp)),
        ];

        let extra: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.other.keys().map(String::as_str))
            .collect();
        for column in extra {
            let present = records.iter().filter(|r| r.other.contains_key(column)).count();
            completeness.push((column.to_string(), percent(present)));
        }

        completeness
    }

    fn geographic_coverage(&self, records: &[PivotedRecord]) -> GeographicCoverage {
        let non_empty = |values: Vec<&str>| {
            values
                .into_iter()
                .filter(|v| !v.is_empty())
                .collect::<HashSet<_>>()
                .len()
        };

        GeographicCoverage {
            unique_countries: non_empty(records.iter().map(|r| r.country.as_str()).collect()),
            unique_cities: non_empty(records.iter().map(|r| r.city.as_str()).collect()),
            latitude_range: value_range(records.iter().map(|r| r.latitude)),
            longitude_range: value_range(records.iter().map(|r| r.longitude)),
        }
    }

    fn top_countries(&self, records: &[PivotedRecord]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in records.iter().filter(|r| !r.country.is_empty()) {
            *counts.entry(record.country.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(country, count)| (country.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(TOP_COUNTRIES);
        ranked
    }

    fn temperature_violations(&self, records: &[PivotedRecord]) -> Vec<TemperatureViolation> {
        let mut violations = Vec::new();
        for record in records {
            for (column, value) in record.temperatures() {
                if let Some(value) = value.filter(|t| !is_plausible_temperature(*t)) {
                    violations.push(TemperatureViolation {
                        city: record.city.clone(),
                        station_name: record.station_name.clone(),
                        date: record.date,
                        column,
                        value,
                    });
                }
            }
        }
        violations
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Data Validation ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Duplicate Records: {}\n",
            report.duplicate_records
        ));

        summary.push_str("\nData completeness by column:\n");
        for (column, pct) in &report.completeness {
            let flag = if *pct < MIN_COLUMN_COMPLETENESS {
                "  (high null rate)"
            } else {
                ""
            };
            summary.push_str(&format!("  {}: {:.1}%{}\n", column, pct, flag));
        }

        let coverage = &report.coverage;
        summary.push_str("\nGeographic coverage:\n");
        summary.push_str(&format!("  Unique countries: {}\n", coverage.unique_countries));
        summary.push_str(&format!("  Unique cities: {}\n", coverage.unique_cities));
        if let Some((min, max)) = coverage.latitude_range {
            summary.push_str(&format!("  Latitude range: {:.2} to {:.2}\n", min, max));
        }
        if let Some((min, max)) = coverage.longitude_range {
            summary.push_str(&format!("  Longitude range: {:.2} to {:.2}\n", min, max));
        }

        summary.push_str(&format!(
            "\nTop {} countries by record count:\n",
            TOP_COUNTRIES
        ));
        for (country, count) in &report.top_countries {
            summary.push_str(&format!("  {}: {}\n", country, count));
        }

        summary.push_str(&format!(
            "\nTemperature Violations: {}\n",
            report.temperature_violations.len()
        ));
        for (i, violation) in report
            .temperature_violations
            .iter()
            .take(REPORTED_VIOLATIONS)
            .enumerate()
        {
            summary.push_str(&format!(
                "  {}. {} at {} on {}: {}°C\n",
                i + 1,
                violation.column,
                violation.station_name,
                violation.date,
                violation.value
            ));
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |range, v| match range {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}
