use crate::error::Result;
use crate::models::PivotedRecord;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One JSON object per line, keyed by output column name
pub struct JsonLinesWriter;

impl JsonLinesWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_records(&self, records: &[PivotedRecord], path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(records, BufWriter::new(file))
    }

    pub fn write_to<W: Write>(&self, records: &[PivotedRecord], mut out: W) -> Result<()> {
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Default for JsonLinesWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PivotKey};
    use chrono::NaiveDate;

    #[test]
    fn test_one_object_per_line() -> Result<()> {
        let records: Vec<PivotedRecord> = (1..=3)
            .map(|day| {
                let mut record = PivotedRecord::from_key(PivotKey {
                    city: "Sharjah".to_string(),
                    country: "United Arab Emirates".to_string(),
                    state: String::new(),
                    suburb: String::new(),
                    location: Location::from_degrees(25.333, 55.517),
                    date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
                    station_name: "SHARJAH INTER.".to_string(),
                });
                record.tavg = Some(20.0);
                record
            })
            .collect();

        let mut out = Vec::new();
        JsonLinesWriter::new().write_to(&records, &mut out)?;
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 3);
        let last: serde_json::Value = serde_json::from_str(text.lines().last().unwrap())?;
        assert_eq!(last["date"], "2020-01-03");
        assert_eq!(last["TAVG"], 20.0);
        assert!(last["PRCP"].is_null());
        Ok(())
    }
}
