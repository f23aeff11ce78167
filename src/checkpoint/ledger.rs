use crate::models::{CheckpointRecord, GeocodedLocation, Location, ProgressMetadata};
use std::collections::HashMap;
use tracing::warn;

/// Every geocoded location known to this run, keyed by [`Location`]
///
/// Insertion order is kept so the persisted table stays stable between
/// saves. Entries are only ever added or replaced, never removed.
#[derive(Debug, Clone, Default)]
pub struct GeocodeLedger {
    entries: Vec<GeocodedLocation>,
    index: HashMap<Location, usize>,
}

impl GeocodeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from checkpoint rows, keeping the first entry of a duplicated key
    pub fn from_records(records: &[GeocodedLocation]) -> Self {
        let mut ledger = Self::new();
        let mut duplicates = 0;

        for record in records {
            if ledger.index.contains_key(&record.location) {
                duplicates += 1;
                continue;
            }
            ledger.insert(record.clone());
        }

        if duplicates > 0 {
            warn!(
                "Checkpoint contains {} duplicate location rows; keeping the first of each",
                duplicates
            );
        }

        ledger
    }

    fn insert(&mut self, record: GeocodedLocation) {
        self.index.insert(record.location, self.entries.len());
        self.entries.push(record);
    }

    pub fn get(&self, location: &Location) -> Option<&GeocodedLocation> {
        self.index.get(location).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.index.contains_key(location)
    }

    /// Insert new locations and replace the entries of known ones
    pub fn put_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = GeocodedLocation>,
    {
        for record in records {
            match self.index.get(&record.location) {
                Some(&i) => self.entries[i] = record,
                None => self.insert(record),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GeocodedLocation] {
        &self.entries
    }

    /// Number of `required` locations that already have an entry
    pub fn resolved_among(&self, required: &[Location]) -> usize {
        required.iter().filter(|l| self.contains(l)).count()
    }

    /// Entries for `required`, in the order given, skipping unknown ones
    pub fn select(&self, required: &[Location]) -> Vec<GeocodedLocation> {
        required
            .iter()
            .filter_map(|l| self.get(l).cloned())
            .collect()
    }

    pub fn snapshot(&self, progress: ProgressMetadata) -> CheckpointRecord {
        CheckpointRecord::new(self.entries.clone(), Some(progress))
    }
}
