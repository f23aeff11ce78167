//! Small files written next to the checkpoint for later investigation

use crate::error::Result;
use crate::models::{GeocodedLocation, Location};
use crate::utils::write_atomically;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// `[[lat, long], ...]` for every location the geocoder could not name
pub fn write_failed_geocodes(path: &Path, failed: &[Location]) -> Result<()> {
    write_atomically(path, |out| {
        serde_json::to_writer_pretty(out, failed)?;
        Ok(())
    })
}

/// Distinct coordinates of readings that found no geocoded location
pub fn write_unmatched_coordinates(path: &Path, unmatched: &[Location]) -> Result<()> {
    write_atomically(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["lat", "long"])?;
        for location in unmatched {
            writer.write_record([
                location.latitude().to_string(),
                location.longitude().to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Final place table for every known location
pub fn write_location_table(path: &Path, locations: &[GeocodedLocation]) -> Result<()> {
    write_atomically(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["lat", "long", "city", "state", "country", "suburb"])?;
        for entry in locations {
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
    })
}

/// Delete a side file left by an earlier run whose list is now empty
pub fn remove_stale_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed outdated {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
