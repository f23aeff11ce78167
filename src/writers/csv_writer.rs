use crate::error::Result;
use crate::models::PivotedRecord;
use crate::writers::{extra_metric_columns, BASE_COLUMNS};
use std::io::Write;
use std::path::Path;

/// Writes the wide table as comma-separated values with a header row
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_records(&self, records: &[PivotedRecord], path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(records, file)
    }

    /// Columns are the fixed set followed by extra metrics in name order
    pub fn write_to<W: Write>(&self, records: &[PivotedRecord], out: W) -> Result<()> {
        let extra_columns = extra_metric_columns(records);
        let mut writer = csv::Writer::from_writer(out);

        let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
        header.extend(extra_columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for record in records {
            let mut row = vec![
                record.city.clone(),
                record.country.clone(),
                record.state.clone(),
                record.suburb.clone(),
                record.latitude.to_string(),
                record.longitude.to_string(),
                record.date.format("%Y-%m-%d").to_string(),
                record.station_name.clone(),
                format_cell(record.tmax),
                format_cell(record.tmin),
                format_cell(record.tavg),
                format_cell(record.prcp),
            ];
            row.extend(
                extra_columns
                    .iter()
                    .map(|name| format_cell(record.other.get(name).copied())),
            );
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
