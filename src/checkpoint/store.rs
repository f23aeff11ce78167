use crate::error::{ProcessingError, Result};
use crate::models::{CheckpointRecord, GeocodedLocation, Location, ProgressMetadata};
use crate::utils::constants::{CHECKPOINT_FILE, PROGRESS_FILE};
use crate::utils::coordinates::parse_coordinate_pair;
use crate::utils::write_atomically;
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const REQUIRED_COLUMNS: [&str; 4] = ["lat", "long", "city", "country"];
const CHECKPOINT_HEADER: [&str; 6] = ["lat", "long", "city", "state", "country", "suburb"];

/// Durable home of geocoding progress
pub trait LocationStore {
    /// Prior progress, or `None` when nothing trustworthy exists
    fn load(&self) -> Result<Option<CheckpointRecord>>;

    /// Persist the full accumulated set and its progress metadata
    fn save(&mut self, record: &CheckpointRecord) -> Result<()>;

    /// Directory backing the store, if it lives on disk
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Checkpoint kept as a CSV table plus a JSON progress file
pub struct CsvCheckpointStore {
    dir: PathBuf,
}

/// Column positions resolved from a checkpoint header
struct CheckpointColumns {
    lat: usize,
    long: usize,
    city: usize,
    country: usize,
    state: Option<usize>,
    suburb: Option<usize>,
}

impl CheckpointColumns {
    fn from_headers(headers: &StringRecord) -> std::result::Result<Self, Vec<&'static str>> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            lat: position("lat").unwrap_or_default(),
            long: position("long").unwrap_or_default(),
            city: position("city").unwrap_or_default(),
            country: position("country").unwrap_or_default(),
            state: position("state"),
            suburb: position("suburb"),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<GeocodedLocation> {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let (latitude, longitude) = parse_coordinate_pair(
            record.get(self.lat).unwrap_or_default(),
            record.get(self.long).unwrap_or_default(),
        )?;

        Ok(GeocodedLocation::new(
            Location::from_degrees(latitude, longitude),
            field(Some(self.city)),
            field(self.state),
            field(Some(self.country)),
            field(self.suburb),
        ))
    }
}

impl CsvCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    /// Progress metadata is informational; an unreadable file is ignored
    pub fn load_progress(&self) -> Option<ProgressMetadata> {
        let path = self.progress_path();
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(progress) => Some(progress),
            Err(e) => {
                warn!("Ignoring unreadable progress file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn read_locations(&self, path: &Path) -> Option<Vec<GeocodedLocation>> {
        let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
            Ok(reader) => reader,
            Err(e) => {
                error!("Could not open checkpoint {}: {}", path.display(), e);
                return None;
            }
        };

        let columns = match reader.headers() {
            Ok(headers) => CheckpointColumns::from_headers(headers),
            Err(e) => {
                error!("Could not read checkpoint header: {}", e);
                return None;
            }
        };
        let columns = match columns {
            Ok(columns) => columns,
            Err(missing) => {
                error!("Checkpoint missing required columns: {:?}", missing);
                error!("Checkpoint appears corrupted. Starting fresh geocoding.");
                return None;
            }
        };

        let mut locations = Vec::new();
        let mut skipped = 0;
        for (line, record) in reader.records().enumerate() {
            match record.map_err(ProcessingError::from).and_then(|r| columns.parse(&r)) {
                Ok(location) => locations.push(location),
                Err(e) => {
                    debug!("Skipping checkpoint row {}: {}", line + 2, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(
                "Skipped {} malformed checkpoint rows; those locations will be geocoded again",
                skipped
            );
        }

        Some(locations)
    }
}

impl LocationStore for CsvCheckpointStore {
    fn load(&self) -> Result<Option<CheckpointRecord>> {
        let path = self.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }

        info!("Found existing geocoding checkpoint: {}", path.display());
        let Some(locations) = self.read_locations(&path) else {
            return Ok(None);
        };
        info!("Loaded {} previously geocoded locations", locations.len());

        Ok(Some(CheckpointRecord::new(locations, self.load_progress())))
    }

    fn save(&mut self, record: &CheckpointRecord) -> Result<()> {
        if let Some(progress) = &record.progress {
            info!(
                "Saving checkpoint... ({}/{} locations)",
                progress.completed, progress.total
            );
        }

        // Table first: it is the source of truth, the progress file only describes it
        write_atomically(&self.checkpoint_path(), |out| {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(CHECKPOINT_HEADER)?;
            for entry in &record.locations {
                writer.write_record([
                    entry.location.latitude().to_string(),
                    entry.location.longitude().to_string(),
                    entry.city.clone(),
                    entry.state.clone(),
                    entry.country.clone(),
                    entry.suburb.clone(),
                ])?;
            }
            writer.flush()?;
            Ok(())
        })?;

        if let Some(progress) = &record.progress {
            write_atomically(&self.progress_path(), |out| {
                serde_json::to_writer_pretty(out, progress)?;
                Ok(())
            })?;
        }

        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<CheckpointRecord>,
    history: Vec<ProgressMetadata>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CheckpointRecord) -> Self {
        Self {
            record: Some(record),
            history: Vec::new(),
        }
    }

    pub fn save_count(&self) -> usize {
        self.history.len()
    }

    /// Progress of every save, oldest first
    pub fn history(&self) -> &[ProgressMetadata] {
        &self.history
    }
}

impl LocationStore for MemoryStore {
    fn load(&self) -> Result<Option<CheckpointRecord>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &CheckpointRecord) -> Result<()> {
        if let Some(progress) = &record.progress {
            self.history.push(progress.clone());
        }
        self.record = Some(record.clone());
        Ok(())
    }
}
