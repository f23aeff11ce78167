//! Pipeline configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `GEOWEATHER__*` environment variables, then command-line flags. The
//! resulting [`PipelineConfig`] is validated once and handed to every stage.

use crate::error::{ProcessingError, Result};
use crate::writers::ParquetWriter;
use crate::utils::constants::{
    CHECKPOINT_SUBDIR, DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_FILE, DEFAULT_GEOCODER_LANGUAGE,
    DEFAULT_GEOCODER_TIMEOUT_SECS, DEFAULT_GEOCODER_URL, DEFAULT_GEOCODER_USER_AGENT,
    DEFAULT_GEOCODING_DELAY_SECS, DEFAULT_INPUT_CSV, DEFAULT_OUTPUT_DIR,
    DEFAULT_PARQUET_COMPRESSION,
};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

const ENV_PREFIX: &str = "GEOWEATHER";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,

    /// Defaults to `<output_dir>/city_data`
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,

    #[validate(range(min = 1))]
    pub batch_size: usize,

    #[validate(range(min = 0.0))]
    pub geocoding_delay_secs: f64,

    pub skip_geocoding: bool,
    pub resume_only: bool,
    pub retry_failed: bool,
    pub run_validation: bool,
    pub emit_json: bool,
    pub emit_parquet: bool,

    /// snappy, gzip, lz4, zstd or none
    pub parquet_compression: String,

    #[validate(nested)]
    pub geocoder: GeocoderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeocoderSettings {
    #[validate(url)]
    pub base_url: String,

    #[validate(length(min = 1))]
    pub user_agent: String,

    #[validate(length(min = 2))]
    pub language: String,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            language: DEFAULT_GEOCODER_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_CSV),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            checkpoint_dir: None,
            batch_size: DEFAULT_BATCH_SIZE,
            geocoding_delay_secs: DEFAULT_GEOCODING_DELAY_SECS,
            skip_geocoding: false,
            resume_only: false,
            retry_failed: false,
            run_validation: false,
            emit_json: true,
            emit_parquet: false,
            parquet_compression: DEFAULT_PARQUET_COMPRESSION.to_string(),
            geocoder: GeocoderSettings::default(),
        }
    }
}

/// Values supplied on the command line; `None`/`false` leaves lower layers alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub checkpoint_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub geocoding_delay_secs: Option<f64>,
    pub skip_geocoding: bool,
    pub resume_only: bool,
    pub retry_failed: bool,
    pub run_validation: bool,
    pub no_json: bool,
    pub parquet: bool,
}

impl PipelineConfig {
    /// Build the layered configuration and validate it
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = PipelineConfig::default();

        let mut builder = Config::builder()
            .set_default("input_path", path_string(&defaults.input_path))?
            .set_default("output_dir", path_string(&defaults.output_dir))?
            .set_default("batch_size", defaults.batch_size as i64)?
            .set_default("geocoding_delay_secs", defaults.geocoding_delay_secs)?
            .set_default("skip_geocoding", defaults.skip_geocoding)?
            .set_default("resume_only", defaults.resume_only)?
            .set_default("retry_failed", defaults.retry_failed)?
            .set_default("run_validation", defaults.run_validation)?
            .set_default("emit_json", defaults.emit_json)?
            .set_default("emit_parquet", defaults.emit_parquet)?
            .set_default("parquet_compression", defaults.parquet_compression.clone())?
            .set_default("geocoder.base_url", defaults.geocoder.base_url.clone())?
            .set_default("geocoder.user_agent", defaults.geocoder.user_agent.clone())?
            .set_default("geocoder.language", defaults.geocoder.language.clone())?
            .set_default("geocoder.timeout_secs", defaults.geocoder.timeout_secs as i64)?;

        match config_file {
            Some(path) if !path.exists() => {
                return Err(ProcessingError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    builder = builder
                        .add_source(File::from(fallback).required(false).format(FileFormat::Toml));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let flag = |set: bool| set.then_some(true);
        builder = builder
            .set_override_option("input_path", overrides.input_path.as_deref().map(path_string))?
            .set_override_option("output_dir", overrides.output_dir.as_deref().map(path_string))?
            .set_override_option(
                "checkpoint_dir",
                overrides.checkpoint_dir.as_deref().map(path_string),
            )?
            .set_override_option("batch_size", overrides.batch_size.map(|b| b as i64))?
            .set_override_option("geocoding_delay_secs", overrides.geocoding_delay_secs)?
            .set_override_option("skip_geocoding", flag(overrides.skip_geocoding))?
            .set_override_option("resume_only", flag(overrides.resume_only))?
            .set_override_option("retry_failed", flag(overrides.retry_failed))?
            .set_override_option("run_validation", flag(overrides.run_validation))?
            .set_override_option("emit_json", overrides.no_json.then_some(false))?
            .set_override_option("emit_parquet", flag(overrides.parquet))?;

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field validation plus the cross-field rules
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if !self.geocoding_delay_secs.is_finite() {
            return Err(ProcessingError::Config(format!(
                "Geocoding delay must be a finite number of seconds, got {}",
                self.geocoding_delay_secs
            )));
        }

        // Fails on an unknown codec name
        ParquetWriter::new().with_compression(&self.parquet_compression)?;

        if self.skip_geocoding && self.resume_only {
            return Err(ProcessingError::Config(
                "--skip-geocoding and --resume-only cannot be combined".to_string(),
            ));
        }

        Ok(())
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(CHECKPOINT_SUBDIR))
    }

    /// Zero for values `check` would reject
    pub fn geocoding_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.geocoding_delay_secs).unwrap_or_default()
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
