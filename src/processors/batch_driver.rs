use crate::checkpoint::{plan_resume, GeocodeLedger, LocationStore, ResumePlan};
use crate::error::{ProcessingError, Result};
use crate::geocoding::{GeocodeResolver, ReverseGeocoder};
use crate::models::{GeocodedLocation, Location, ProgressMetadata};
use crate::utils::constants::DEFAULT_BATCH_SIZE;
use crate::utils::progress::ProgressReporter;
use chrono::Utc;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How the driver treats the geocoding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeocodingMode {
    /// Resume from the checkpoint and geocode whatever is pending
    #[default]
    Full,
    /// Like `Full`, but the caller stops once geocoding is done
    ResumeOnly,
    /// Never call the provider; a checkpoint must already exist
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Resuming,
    ProcessingBatch(usize),
    Complete,
}

/// Result of driving the geocoding of one required location set
#[derive(Debug, Clone)]
pub struct GeocodeOutcome {
    /// Entries for the required locations, in required order
    pub locations: Vec<GeocodedLocation>,
    /// Every entry the checkpoint now holds, including ones for other inputs
    pub all_locations: Vec<GeocodedLocation>,
    /// Required locations whose lookup produced no city
    pub failed: Vec<Location>,
    pub calls_made: usize,
    pub batches_processed: usize,
    pub low_overlap: bool,
}

/// Sequential, checkpointed geocoding in fixed-size batches
pub struct BatchDriver {
    batch_size: usize,
    mode: GeocodingMode,
    retry_failed: bool,
    geocoding_delay: Duration,
    silent: bool,
    state: DriverState,
}

impl BatchDriver {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            mode: GeocodingMode::Full,
            retry_failed: false,
            geocoding_delay: Duration::ZERO,
            silent: false,
            state: DriverState::NotStarted,
        }
    }

    pub fn with_mode(mut self, mode: GeocodingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retry_failed(mut self, retry_failed: bool) -> Self {
        self.retry_failed = retry_failed;
        self
    }

    /// Only used to estimate the remaining time before any call has finished
    pub fn with_geocoding_delay(mut self, delay: Duration) -> Self {
        self.geocoding_delay = delay;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Geocode every required location not already covered by the store
    ///
    /// The store is saved after each batch and at no other point. Nothing is
    /// saved and the provider is never called when no location is pending.
    pub async fn run<G, S>(
        &mut self,
        required: &[Location],
        resolver: &mut GeocodeResolver<G>,
        store: &mut S,
    ) -> Result<GeocodeOutcome>
    where
        G: ReverseGeocoder,
        S: LocationStore,
    {
        self.state = DriverState::NotStarted;
        let checkpoint = store.load()?;

        if self.mode == GeocodingMode::Skip {
            let Some(checkpoint) = checkpoint else {
                return Err(ProcessingError::CheckpointMissing(
                    store.path().map(Path::to_path_buf).unwrap_or_default(),
                ));
            };
            info!(
                "Skipping geocoding, using {} checkpointed locations",
                checkpoint.len()
            );
            let ledger = GeocodeLedger::from_records(&checkpoint.locations);
            let missing = required.len() - ledger.resolved_among(required);
            if missing > 0 {
                warn!(
                    "{} locations in the input have no checkpoint entry and will be unmatched",
                    missing
                );
            }
            self.state = DriverState::Complete;
            return Ok(Self::outcome(required, &ledger, 0, 0, false));
        }

        let (plan, mut ledger) = match checkpoint {
            Some(checkpoint) => (
                plan_resume(required, &checkpoint, self.retry_failed)?,
                GeocodeLedger::from_records(&checkpoint.locations),
            ),
            None => {
                info!("No checkpoint found, starting fresh geocoding");
                (ResumePlan::fresh(required), GeocodeLedger::new())
            }
        };

        if plan.pending.is_empty() {
            info!("All {} locations already geocoded", required.len());
            if self.mode == GeocodingMode::ResumeOnly {
                info!("Resume-only mode: nothing left to geocode");
            }
            self.state = DriverState::Complete;
            return Ok(Self::outcome(required, &ledger, 0, 0, plan.low_overlap));
        }

        if !plan.already_geocoded.is_empty() {
            self.state = DriverState::Resuming;
            info!(
                "Resuming: {}/{} locations already geocoded, {} remaining",
                plan.already_geocoded.len(),
                required.len(),
                plan.pending.len()
            );
        }

        let total_batches = plan.pending.len().div_ceil(self.batch_size);
        info!(
            "Geocoding {} locations in {} batches of up to {}",
            plan.pending.len(),
            total_batches,
            self.batch_size
        );

        let progress = ProgressReporter::new(
            plan.pending.len() as u64,
            "Geocoding locations...",
            self.silent,
        );
        let started = Instant::now();
        let calls_before = resolver.calls();
        let mut processed = 0;
        let mut batches_processed = 0;

        for batch in plan.pending.chunks(self.batch_size) {
            let batch_number = ledger.resolved_among(required) / self.batch_size + 1;
            self.state = DriverState::ProcessingBatch(batch_number);
            progress.set_message(&format!("Batch {} ({} locations)", batch_number, batch.len()));

            let mut results = Vec::with_capacity(batch.len());
            for location in batch {
                results.push(resolver.resolve(*location).await);
                processed += 1;
                progress.update(processed as u64);
            }
            ledger.put_all(results);
            batches_processed += 1;

            let remaining = plan.pending.len() - processed;
            let metadata = ProgressMetadata {
                completed: ledger.resolved_among(required),
                total: required.len(),
                failed_count: Self::failed_among(&ledger, required),
                last_updated: Utc::now(),
                current_batch: batch_number,
                estimated_time_remaining_minutes: estimate_remaining_minutes(
                    started.elapsed(),
                    processed,
                    remaining,
                    self.geocoding_delay,
                ),
            };
            info!(
                "Batch {} complete: {}/{} locations ({:.1}%), ~{:.1} minutes remaining",
                batch_number,
                metadata.completed,
                metadata.total,
                metadata.percent_complete(),
                metadata.estimated_time_remaining_minutes
            );
            store.save(&ledger.snapshot(metadata))?;
        }

        progress.finish_with_message(&format!("Geocoded {} locations", processed));
        self.state = DriverState::Complete;

        let calls_made = resolver.calls() - calls_before;
        let outcome = Self::outcome(
            required,
            &ledger,
            calls_made,
            batches_processed,
            plan.low_overlap,
        );
        if !outcome.failed.is_empty() {
            warn!(
                "Failed to geocode {} of {} locations",
                outcome.failed.len(),
                required.len()
            );
        }

        Ok(outcome)
    }

    fn failed_among(ledger: &GeocodeLedger, required: &[Location]) -> usize {
        required
            .iter()
            .filter_map(|l| ledger.get(l))
            .filter(|entry| !entry.is_resolved())
            .count()
    }

    fn outcome(
        required: &[Location],
        ledger: &GeocodeLedger,
        calls_made: usize,
        batches_processed: usize,
        low_overlap: bool,
    ) -> GeocodeOutcome {
        let locations = ledger.select(required);
        let failed = locations
            .iter()
            .filter(|entry| !entry.is_resolved())
            .map(|entry| entry.location)
            .collect();

        GeocodeOutcome {
            locations,
            all_locations: ledger.entries().to_vec(),
            failed,
            calls_made,
            batches_processed,
            low_overlap,
        }
    }
}

impl Default for BatchDriver {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

/// Remaining minutes at the observed throughput
///
/// Before any throughput is measurable the configured delay per call is used.
pub fn estimate_remaining_minutes(
    elapsed: Duration,
    processed: usize,
    remaining: usize,
    fallback_delay: Duration,
) -> f64 {
    let elapsed_secs = elapsed.as_secs_f64();
    let seconds = if processed > 0 && elapsed_secs > 0.0 {
        remaining as f64 * elapsed_secs / processed as f64
    } else {
        remaining as f64 * fallback_delay.as_secs_f64()
    };
    seconds / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryStore;
    use crate::geocoding::AddressMap;
    use crate::models::CheckpointRecord;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CountingGeocoder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ReverseGeocoder for CountingGeocoder {
        async fn reverse(&self, location: &Location) -> Result<Option<AddressMap>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if location.latitude() < 0.0 {
                return Ok(None);
            }
            Ok(json!({"town": format!("Town {}", location.latitude()), "country": "Testland"})
                .as_object()
                .cloned())
        }
    }

    fn required(count: usize) -> Vec<Location> {
        (1..=count)
            .map(|i| Location::from_degrees(i as f64, i as f64))
            .collect()
    }

    fn resolver(geocoder: &CountingGeocoder) -> GeocodeResolver<CountingGeocoder> {
        GeocodeResolver::new(geocoder.clone(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_fresh_run_saves_after_every_batch() -> Result<()> {
        let geocoder = CountingGeocoder::default();
        let mut resolver = resolver(&geocoder);
        let mut store = MemoryStore::new();
        let mut driver = BatchDriver::new(2).with_silent(true);

        let outcome = driver.run(&required(5), &mut resolver, &mut store).await?;

        assert_eq!(outcome.calls_made, 5);
        assert_eq!(outcome.batches_processed, 3);
        assert_eq!(outcome.locations.len(), 5);
        assert_eq!(outcome.locations[0].city, "Town 1");
        assert_eq!(driver.state(), DriverState::Complete);

        let completed: Vec<usize> = store.history().iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![2, 4, 5]);
        let batches: Vec<usize> = store.history().iter().map(|p| p.current_batch).collect();
        assert_eq!(batches, vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_checkpoint_makes_no_calls() -> Result<()> {
        let geocoder = CountingGeocoder::default();
        let mut store = MemoryStore::new();
        BatchDriver::new(10)
            .with_silent(true)
            .run(&required(3), &mut resolver(&geocoder), &mut store)
            .await?;
        let saved = store.load()?;

        let mut driver = BatchDriver::new(10)
            .with_mode(GeocodingMode::ResumeOnly)
            .with_silent(true);
        let outcome = driver
            .run(&required(3), &mut resolver(&geocoder), &mut store)
            .await?;

        assert_eq!(outcome.calls_made, 0);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load()?, saved);
        Ok(())
    }

    #[tokio::test]
    async fn test_resume_geocodes_only_pending() -> Result<()> {
        let geocoder = CountingGeocoder::default();
        let existing = GeocodedLocation::new(
            Location::from_degrees(2.0, 2.0),
            "Cached".to_string(),
            String::new(),
            "Testland".to_string(),
            String::new(),
        );
        let stale = GeocodedLocation::unresolved(Location::from_degrees(50.0, 50.0));
        let mut store = MemoryStore::with_record(CheckpointRecord::new(
            vec![existing.clone(), stale.clone()],
            None,
        ));
        let mut driver = BatchDriver::new(10).with_silent(true);

        let outcome = driver
            .run(&required(3), &mut resolver(&geocoder), &mut store)
            .await?;

        assert_eq!(outcome.calls_made, 2);
        assert_eq!(outcome.locations[1], existing);
        // Entries for other inputs survive every save
        assert!(store.load()?.unwrap().locations.contains(&stale));
        assert_eq!(outcome.all_locations.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_lookups_are_reported() -> Result<()> {
        let geocoder = CountingGeocoder::default();
        let mut store = MemoryStore::new();
        let locations = vec![
            Location::from_degrees(1.0, 1.0),
            Location::from_degrees(-1.0, 1.0),
        ];

        let outcome = BatchDriver::new(10)
            .with_silent(true)
            .run(&locations, &mut resolver(&geocoder), &mut store)
            .await?;

        assert_eq!(outcome.failed, vec![Location::from_degrees(-1.0, 1.0)]);
        assert_eq!(store.history()[0].failed_count, 1);
        assert_eq!(store.history()[0].completed, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_mode_requires_checkpoint() {
        let geocoder = CountingGeocoder::default();
        let mut store = MemoryStore::new();
        let mut driver = BatchDriver::new(10)
            .with_mode(GeocodingMode::Skip)
            .with_silent(true);

        let result = driver
            .run(&required(2), &mut resolver(&geocoder), &mut store)
            .await;

        assert!(matches!(result, Err(ProcessingError::CheckpointMissing(_))));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_skip_mode_uses_checkpoint_only() -> Result<()> {
        let geocoder = CountingGeocoder::default();
        let cached = GeocodedLocation::new(
            Location::from_degrees(1.0, 1.0),
            "Cached".to_string(),
            String::new(),
            "Testland".to_string(),
            String::new(),
        );
        let mut store = MemoryStore::with_record(CheckpointRecord::new(vec![cached.clone()], None));

        let outcome = BatchDriver::new(10)
            .with_mode(GeocodingMode::Skip)
            .with_silent(true)
            .run(&required(2), &mut resolver(&geocoder), &mut store)
            .await?;

        assert_eq!(outcome.locations, vec![cached]);
        assert_eq!(outcome.calls_made, 0);
        assert_eq!(store.save_count(), 0);
        Ok(())
    }

    #[test]
    fn test_estimate_remaining_minutes() {
        let measured = estimate_remaining_minutes(Duration::from_secs(60), 30, 60, Duration::ZERO);
        assert!((measured - 2.0).abs() < 1e-9);

        let fallback =
            estimate_remaining_minutes(Duration::ZERO, 0, 40, Duration::from_millis(1500));
        assert!((fallback - 1.0).abs() < 1e-9);
    }
}
