pub mod csv_writer;
pub mod jsonl_writer;
pub mod parquet_writer;
pub mod side_files;
pub mod summary_writer;

pub use csv_writer::CsvWriter;
pub use jsonl_writer::JsonLinesWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use summary_writer::ProcessingSummary;

use crate::models::PivotedRecord;
use std::collections::BTreeSet;

/// Output columns every table starts with
pub const BASE_COLUMNS: [&str; 12] = [
    "city", "country", "state", "suburb", "lat", "long", "date", "name", "TMAX", "TMIN", "TAVG",
    "PRCP",
];

/// Names of non-standard metrics present in any record, sorted
pub fn extra_metric_columns(records: &[PivotedRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.other.keys())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
