use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::GeocodedLocation;

/// Progress metadata written beside the checkpoint table
///
/// Field names match the JSON keys of the progress file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetadata {
    pub completed: usize,
    pub total: usize,
    pub failed_count: usize,
    pub last_updated: DateTime<Utc>,
    pub current_batch: usize,
    pub estimated_time_remaining_minutes: f64,
}

impl ProgressMetadata {
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * self.completed as f64 / self.total as f64
        }
    }
}

/// Everything geocoded so far plus the progress of the run that wrote it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointRecord {
    pub locations: Vec<GeocodedLocation>,
    pub progress: Option<ProgressMetadata>,
}

impl CheckpointRecord {
    pub fn new(locations: Vec<GeocodedLocation>, progress: Option<ProgressMetadata>) -> Self {
        Self {
            locations,
            progress,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.locations.iter().filter(|l| !l.is_resolved()).count()
    }
}
