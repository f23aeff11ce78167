/// Metric identifiers as they appear in the `data_type` column
pub const METRIC_TMIN: &str = "TMIN";
pub const METRIC_TMAX: &str = "TMAX";
pub const METRIC_TAVG: &str = "TAVG";
pub const METRIC_PRCP: &str = "PRCP";

/// Year every MMDD source date is mapped onto (leap year so 02-29 survives)
pub const REFERENCE_YEAR: i32 = 2020;

/// Location keys are integer thousandths of a degree
pub const COORDINATE_SCALE: f64 = 1000.0;

/// Coordinate bounds
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Plausible temperature range in °C, values outside are reported not rejected
pub const MIN_PLAUSIBLE_TEMP: f64 = -90.0;
pub const MAX_PLAUSIBLE_TEMP: f64 = 60.0;

/// Source values are stored in tenths of a unit
pub const TENTHS_DIVISOR: f64 = 10.0;

/// Checkpoint overlap below this share of the checkpoint size triggers a warning
pub const MIN_CHECKPOINT_OVERLAP: f64 = 0.5;

/// Completeness below this percentage is reported as a high null rate
pub const MIN_COLUMN_COMPLETENESS: f64 = 50.0;

/// Checkpoint directory file names
pub const CHECKPOINT_FILE: &str = "geocoding_checkpoint.csv";
pub const PROGRESS_FILE: &str = "geocoding_progress.json";
pub const FAILED_GEOCODES_FILE: &str = "failed_geocodes.json";
pub const LOCATION_TABLE_FILE: &str = "ALL_location_specific_data.csv";
pub const UNMATCHED_COORDINATES_FILE: &str = "unmatched_coordinates.csv";
pub const CHECKPOINT_SUBDIR: &str = "city_data";

/// Output directory file names
pub const OUTPUT_CSV_FILE: &str = "global_weather_data_cleaned.csv";
pub const OUTPUT_JSON_FILE: &str = "global_weather_data_cleaned.jsonl";
pub const OUTPUT_PARQUET_FILE: &str = "global_weather_data_cleaned.parquet";
pub const SUMMARY_FILE: &str = "processing_summary.json";

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_GEOCODING_DELAY_SECS: f64 = 1.5;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_PARQUET_COMPRESSION: &str = "snappy";
pub const DEFAULT_INPUT_CSV: &str = "uncleaned_data/AVERAGED_weather_station_data_ALL.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "weather_data";
pub const DEFAULT_CONFIG_FILE: &str = "geoweather.toml";

/// Geocoder defaults
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "geoweather-processor/0.3";
pub const DEFAULT_GEOCODER_LANGUAGE: &str = "en";
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;
