use crate::error::{ProcessingError, Result};
use crate::models::{CheckpointRecord, GeocodedLocation, Location};
use crate::utils::constants::MIN_CHECKPOINT_OVERLAP;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// How the required location set splits against a loaded checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePlan {
    /// Checkpoint entries covering required locations, in required order
    pub already_geocoded: Vec<GeocodedLocation>,
    /// Required locations that still need a provider call, in required order
    pub pending: Vec<Location>,
    /// Distinct checkpoint locations that are also required
    pub overlap: usize,
    pub low_overlap: bool,
}

impl ResumePlan {
    /// Plan for a run without any checkpoint
    pub fn fresh(required: &[Location]) -> Self {
        Self {
            already_geocoded: Vec::new(),
            pending: required.to_vec(),
            overlap: 0,
            low_overlap: false,
        }
    }
}

/// Split `required` into locations the checkpoint covers and pending ones
///
/// Failed lookups (empty city) count as covered unless `retry_failed` is set.
/// Fails with [`ProcessingError::IntegrityViolation`] when joining the
/// checkpoint back onto the required set does not reproduce its row count,
/// which happens when the checkpoint holds the same location more than once.
pub fn plan_resume(
    required: &[Location],
    checkpoint: &CheckpointRecord,
    retry_failed: bool,
) -> Result<ResumePlan> {
    let mut by_location: HashMap<Location, Vec<&GeocodedLocation>> = HashMap::new();
    for entry in &checkpoint.locations {
        by_location.entry(entry.location).or_default().push(entry);
    }

    let required_keys: HashSet<&Location> = required.iter().collect();
    let overlap = by_location
        .keys()
        .filter(|location| required_keys.contains(location))
        .count();

    let checkpoint_size = by_location.len();
    let low_overlap =
        checkpoint_size > 0 && (overlap as f64) < MIN_CHECKPOINT_OVERLAP * checkpoint_size as f64;

    info!(
        "Checkpoint overlap: {}/{} checkpoint locations are in the current data",
        overlap, checkpoint_size
    );
    if low_overlap {
        warn!("{}", "=".repeat(60));
        warn!("WARNING: low overlap between checkpoint and current data");
        warn!(
            "Only {} of {} checkpoint locations appear in the current input",
            overlap, checkpoint_size
        );
        warn!("The input data may have changed since the checkpoint was written");
        warn!("{}", "=".repeat(60));
    }

    // Left join of required locations against the checkpoint table
    let mut joined_rows = 0;
    let mut already_geocoded = Vec::new();
    let mut pending = Vec::new();

    for location in required {
        match by_location.get(location) {
            Some(matches) => {
                joined_rows += matches.len();
                let first = matches[0];
                if retry_failed && !first.is_resolved() {
                    pending.push(*location);
                } else {
                    already_geocoded.push(first.clone());
                }
            }
            None => {
                joined_rows += 1;
                pending.push(*location);
            }
        }
    }

    if joined_rows != required.len() {
        return Err(ProcessingError::IntegrityViolation {
            stage: "Checkpoint merge",
            expected: required.len(),
            actual: joined_rows,
        });
    }

    info!(
        "Resume point: {} already geocoded, {} pending",
        already_geocoded.len(),
        pending.len()
    );

    Ok(ResumePlan {
        already_geocoded,
        pending,
        overlap,
        low_overlap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(lat: f64, lon: f64, city: &str) -> GeocodedLocation {
        GeocodedLocation::new(
            Location::from_degrees(lat, lon),
            city.to_string(),
            String::new(),
            if city.is_empty() { "" } else { "Country" }.to_string(),
            String::new(),
        )
    }

    fn locations(pairs: &[(f64, f64)]) -> Vec<Location> {
        pairs
            .iter()
            .map(|&(lat, lon)| Location::from_degrees(lat, lon))
            .collect()
    }

    #[test]
    fn test_partial_checkpoint() -> Result<()> {
        let required = locations(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let checkpoint = CheckpointRecord::new(vec![entry(2.0, 2.0, "Two")], None);

        let plan = plan_resume(&required, &checkpoint, false)?;

        assert_eq!(plan.already_geocoded, vec![entry(2.0, 2.0, "Two")]);
        assert_eq!(plan.pending, locations(&[(1.0, 1.0), (3.0, 3.0)]));
        assert_eq!(plan.overlap, 1);
        assert!(!plan.low_overlap);
        Ok(())
    }

    #[test]
    fn test_checkpoint_rows_are_rounded_like_input() -> Result<()> {
        let required = locations(&[(25.3334, 55.5169)]);
        let checkpoint = CheckpointRecord::new(vec![entry(25.333, 55.517, "Sharjah")], None);

        let plan = plan_resume(&required, &checkpoint, false)?;

        assert!(plan.pending.is_empty());
        assert_eq!(plan.already_geocoded[0].city, "Sharjah");
        Ok(())
    }

    #[test]
    fn test_failed_entries_retried_only_on_request() -> Result<()> {
        let required = locations(&[(1.0, 1.0)]);
        let checkpoint = CheckpointRecord::new(vec![entry(1.0, 1.0, "")], None);

        let kept = plan_resume(&required, &checkpoint, false)?;
        assert!(kept.pending.is_empty());

        let retried = plan_resume(&required, &checkpoint, true)?;
        assert_eq!(retried.pending, required);
        assert!(retried.already_geocoded.is_empty());
        Ok(())
    }

    #[test]
    fn test_low_overlap_is_a_warning_not_an_error() -> Result<()> {
        let required = locations(&[(1.0, 1.0)]);
        let checkpoint = CheckpointRecord::new(
            vec![
                entry(1.0, 1.0, "One"),
                entry(7.0, 7.0, "Seven"),
                entry(8.0, 8.0, "Eight"),
            ],
            None,
        );

        let plan = plan_resume(&required, &checkpoint, false)?;

        assert!(plan.low_overlap);
        assert!(plan.pending.is_empty());
        Ok(())
    }

    #[test]
    fn test_duplicate_required_key_is_fatal() {
        let required = locations(&[(1.0, 1.0), (2.0, 2.0)]);
        let checkpoint = CheckpointRecord::new(
            vec![entry(1.0, 1.0, "One"), entry(1.0, 1.0, "Uno")],
            None,
        );

        let err = plan_resume(&required, &checkpoint, false).unwrap_err();
        match err {
            ProcessingError::IntegrityViolation {
                stage,
                expected,
                actual,
            } => {
                assert_eq!(stage, "Checkpoint merge");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fresh_plan() {
        let required = locations(&[(1.0, 1.0)]);
        let plan = ResumePlan::fresh(&required);
        assert_eq!(plan.pending, required);
        assert_eq!(plan.overlap, 0);
    }
}
