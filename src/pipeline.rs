//! End-to-end run: read, geocode, merge, pivot, validate and write

use crate::analyzers::{WeatherAnalyzer, WeatherStatistics};
use crate::checkpoint::{CsvCheckpointStore, LocationStore};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::geocoding::{GeocodeResolver, ReverseGeocoder};
use crate::processors::{
    BatchDriver, DataMerger, DataPivoter, GeocodingMode, IntegrityChecker, IntegrityReport,
    LocationExtractor,
};
use crate::readers::ObservationReader;
use crate::utils::ProgressReporter;
use crate::utils::constants::{
    FAILED_GEOCODES_FILE, LOCATION_TABLE_FILE, OUTPUT_CSV_FILE, OUTPUT_JSON_FILE,
    OUTPUT_PARQUET_FILE, SUMMARY_FILE, UNMATCHED_COORDINATES_FILE,
};
use crate::writers::side_files::{
    remove_stale_file, write_failed_geocodes, write_location_table, write_unmatched_coordinates,
};
use crate::writers::{CsvWriter, JsonLinesWriter, ParquetWriter, ProcessingSummary};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

const BANNER_WIDTH: usize = 80;

/// What a run did, for the caller to report on
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub unique_locations: usize,
    pub provider_calls: usize,
    pub failed_geocodes: usize,
    pub unmatched_rows: usize,
    pub records_written: usize,
    /// Set when resume-only mode stopped the run after geocoding
    pub stopped_after_geocoding: bool,
    pub integrity: Option<IntegrityReport>,
    pub statistics: Option<WeatherStatistics>,
    pub outputs: Vec<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
    silent: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            silent: false,
        }
    }

    /// Suppress the terminal progress bar
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn mode(&self) -> GeocodingMode {
        if self.config.skip_geocoding {
            GeocodingMode::Skip
        } else if self.config.resume_only {
            GeocodingMode::ResumeOnly
        } else {
            GeocodingMode::Full
        }
    }

    /// Run against the CSV checkpoint in the configured checkpoint directory
    pub async fn run<G: ReverseGeocoder>(&self, geocoder: G) -> Result<PipelineReport> {
        let mut store = CsvCheckpointStore::new(self.config.checkpoint_dir());
        self.run_with_store(geocoder, &mut store).await
    }

    pub async fn run_with_store<G, S>(&self, geocoder: G, store: &mut S) -> Result<PipelineReport>
    where
        G: ReverseGeocoder,
        S: LocationStore,
    {
        let started = Instant::now();
        self.config.check()?;
        self.log_configuration();

        let mut report = PipelineReport::default();
        let checkpoint_dir = self.config.checkpoint_dir();

        // Step 1: read raw observations
        let spinner = ProgressReporter::new_spinner("Reading weather data...", self.silent);
        let (observations, read_report) =
            ObservationReader::new().read_observations(&self.config.input_path)?;
        spinner.finish_with_message(&format!("Read {} rows", read_report.rows_read));
        report.rows_read = read_report.rows_read;
        report.rows_kept = read_report.rows_kept();

        // Step 2: distinct rounded locations
        let location_set = LocationExtractor::new().extract(&observations);
        report.unique_locations = location_set.len();

        // Step 3: geocode with checkpointing
        let mode = self.mode();
        let mut resolver = GeocodeResolver::new(geocoder, self.config.geocoding_delay());
        let mut driver = BatchDriver::new(self.config.batch_size)
            .with_mode(mode)
            .with_retry_failed(self.config.retry_failed)
            .with_geocoding_delay(self.config.geocoding_delay())
            .with_silent(self.silent);
        let outcome = driver
            .run(&location_set.locations, &mut resolver, store)
            .await?;
        report.provider_calls = outcome.calls_made;
        report.failed_geocodes = outcome.failed.len();

        if mode != GeocodingMode::Skip {
            let path = checkpoint_dir.join(FAILED_GEOCODES_FILE);
            if outcome.failed.is_empty() {
                remove_stale_file(&path)?;
            } else {
                write_failed_geocodes(&path, &outcome.failed)?;
                info!("Saved failed geocodes to: {}", path.display());
            }
            let path = checkpoint_dir.join(LOCATION_TABLE_FILE);
            write_location_table(&path, &outcome.all_locations)?;
            info!("Saved location table to: {}", path.display());
        }

        if mode == GeocodingMode::ResumeOnly {
            info!("Resume-only mode: geocoding complete, exiting.");
            report.stopped_after_geocoding = true;
            return Ok(report);
        }

        // Step 4: join readings with places
        let merge = DataMerger::new().merge(observations, &outcome.locations)?;
        report.unmatched_rows = merge.rows_without_city();
        let path = checkpoint_dir.join(UNMATCHED_COORDINATES_FILE);
        if merge.unmatched_coordinates.is_empty() {
            remove_stale_file(&path)?;
        } else {
            write_unmatched_coordinates(&path, &merge.unmatched_coordinates)?;
            warn!(
                "Saved {} unmatched coordinate pairs to: {}",
                merge.unmatched_coordinates.len(),
                path.display()
            );
        }

        // Step 5: wide table in whole units
        let pivot = DataPivoter::new().pivot(&merge.enriched);
        let records = pivot.records;

        // Step 6: optional validation report
        if self.config.run_validation {
            let checker = IntegrityChecker::new();
            let integrity = checker.check_integrity(&records);
            for line in checker.generate_summary(&integrity).lines() {
                info!("{}", line);
            }
            let sparse = integrity.sparse_columns();
            if !sparse.is_empty() {
                warn!("Columns with high null rates: {}", sparse.join(", "));
            }
            if integrity.duplicate_records > 0 {
                warn!("Found {} duplicate records", integrity.duplicate_records);
            }
            report.integrity = Some(integrity);
        }

        // Step 7: outputs
        std::fs::create_dir_all(&self.config.output_dir)?;

        let csv_path = self.config.output_dir.join(OUTPUT_CSV_FILE);
        CsvWriter::new().write_records(&records, &csv_path)?;
        info!("Saved CSV to: {}", csv_path.display());
        report.outputs.push(csv_path);

        if self.config.emit_json {
            let json_path = self.config.output_dir.join(OUTPUT_JSON_FILE);
            JsonLinesWriter::new().write_records(&records, &json_path)?;
            info!("Saved JSON Lines to: {}", json_path.display());
            report.outputs.push(json_path);
        }

        if self.config.emit_parquet {
            let parquet_path = self.config.output_dir.join(OUTPUT_PARQUET_FILE);
            let writer =
                ParquetWriter::new().with_compression(&self.config.parquet_compression)?;
            writer.write_records(&records, &parquet_path)?;
            info!("{}", writer.get_file_info(&parquet_path)?.summary());
            report.outputs.push(parquet_path);
        }

        let statistics = WeatherAnalyzer::new().analyze(&records);
        for line in statistics.summary().lines() {
            info!("{}", line);
        }

        let summary_path = self.config.output_dir.join(SUMMARY_FILE);
        ProcessingSummary::new(&statistics, report.unmatched_rows, report.failed_geocodes)
            .write(&summary_path)?;
        info!("Saved processing summary to: {}", summary_path.display());
        report.outputs.push(summary_path);

        report.records_written = records.len();
        report.statistics = Some(statistics);

        let elapsed = started.elapsed().as_secs_f64();
        info!("{}", "=".repeat(BANNER_WIDTH));
        info!(
            "SUCCESS! Total time: {:.1} minutes ({:.0} seconds)",
            elapsed / 60.0,
            elapsed
        );
        info!("{}", "=".repeat(BANNER_WIDTH));

        Ok(report)
    }

    fn log_configuration(&self) {
        let config = &self.config;
        info!("{}", "=".repeat(BANNER_WIDTH));
        info!("Weather data processing pipeline");
        info!("{}", "=".repeat(BANNER_WIDTH));
        info!("Configuration:");
        info!("  Input file: {}", config.input_path.display());
        info!("  Output directory: {}", config.output_dir.display());
        info!("  Checkpoint directory: {}", config.checkpoint_dir().display());
        info!("  Batch size: {}", config.batch_size);
        info!("  Geocoding delay: {}s", config.geocoding_delay_secs);
        info!("  Skip geocoding: {}", config.skip_geocoding);
        info!("  Resume only: {}", config.resume_only);
        info!("  Retry failed: {}", config.retry_failed);
        info!("  Validate: {}", config.run_validation);
        info!("  JSON output: {}", config.emit_json);
        info!(
            "  Parquet output: {} ({})",
            config.emit_parquet, config.parquet_compression
        );
    }
}
