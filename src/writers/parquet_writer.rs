use crate::error::{ProcessingError, Result};
use crate::models::PivotedRecord;
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use crate::writers::extra_metric_columns;
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

// Days from 0001-01-01 to 1970-01-01; Date32 counts from the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write the wide table, one Arrow batch per row group
    pub fn write_records(&self, records: &[PivotedRecord], path: &Path) -> Result<()> {
        let extra_columns = extra_metric_columns(records);
        let schema = self.create_schema(&extra_columns);

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in records.chunks(self.row_group_size) {
            let batch = self.records_to_batch(chunk, &extra_columns, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    fn create_schema(&self, extra_columns: &[String]) -> Arc<Schema> {
        let mut fields = vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("country", DataType::Utf8, false),
            Field::new("state", DataType::Utf8, false),
            Field::new("suburb", DataType::Utf8, false),
            Field::new("lat", DataType::Float64, false),
            Field::new("long", DataType::Float64, false),
            Field::new("date", DataType::Date32, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("TMAX", DataType::Float64, true),
            Field::new("TMIN", DataType::Float64, true),
            Field::new("TAVG", DataType::Float64, true),
            Field::new("PRCP", DataType::Float64, true),
        ];
        fields.extend(
            extra_columns
                .iter()
                .map(|name| Field::new(name, DataType::Float64, true)),
        );

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(
        &self,
        records: &[PivotedRecord],
        extra_columns: &[String],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let text = |field: fn(&PivotedRecord) -> &str| -> ArrayRef {
            Arc::new(StringArray::from_iter_values(records.iter().map(field)))
        };
        let metric = |field: fn(&PivotedRecord) -> Option<f64>| -> ArrayRef {
            Arc::new(records.iter().map(field).collect::<Float64Array>())
        };

        let dates: Vec<i32> = records
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();

        let mut columns: Vec<ArrayRef> = vec![
            text(|r| r.city.as_str()),
            text(|r| r.country.as_str()),
            text(|r| r.state.as_str()),
            text(|r| r.suburb.as_str()),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.latitude),
            )),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.longitude),
            )),
            Arc::new(Date32Array::from(dates)),
            text(|r| r.station_name.as_str()),
            metric(|r| r.tmax),
            metric(|r| r.tmin),
            metric(|r| r.tavg),
            metric(|r| r.prcp),
        ];
        for name in extra_columns {
            columns.push(Arc::new(
                records
                    .iter()
                    .map(|r| r.other.get(name).copied())
                    .collect::<Float64Array>(),
            ));
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PivotKey};
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn records(count: usize) -> Vec<PivotedRecord> {
        (0..count)
            .map(|i| {
                let mut record = PivotedRecord::from_key(PivotKey {
                    city: "Sharjah".to_string(),
                    country: "United Arab Emirates".to_string(),
                    state: "Sharjah".to_string(),
                    suburb: String::new(),
                    location: Location::from_degrees(25.333, 55.517),
                    date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
                        + chrono::Duration::days(i as i64),
                    station_name: "SHARJAH INTER.".to_string(),
                });
                record.tmax = Some(29.3);
                if i % 2 == 0 {
                    record.other.insert("SNWD".to_string(), 0.0);
                }
                record
            })
            .collect()
    }

    #[test]
    fn test_write_and_inspect() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("weather.parquet");

        let writer = ParquetWriter::new().with_row_group_size(4);
        writer.write_records(&records(10), &path)?;

        let info = writer.get_file_info(&path)?;
        assert_eq!(info.total_rows, 10);
        assert_eq!(info.row_groups, 3);
        assert!(info.summary().contains("Total rows: 10"));

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?;
        let names: Vec<String> = reader
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names[8..], ["TMAX", "TMIN", "TAVG", "PRCP", "SNWD"]);

        let mut batches = reader.build()?;
        let batch = batches.next().unwrap()?;
        let dates = batch
            .column(6)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        // 2020-01-01 is day 18262 of the Unix epoch
        assert_eq!(dates.value(0), 18262);
        Ok(())
    }

    #[test]
    fn test_unsupported_compression() {
        assert!(ParquetWriter::new().with_compression("brotli-9000").is_err());
        assert!(ParquetWriter::new().with_compression("zstd").is_ok());
    }
}
