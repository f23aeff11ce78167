pub mod checkpoint;
pub mod enriched;
pub mod location;
pub mod observation;
pub mod pivoted;

pub use checkpoint::{CheckpointRecord, ProgressMetadata};
pub use enriched::EnrichedObservation;
pub use location::{GeocodedLocation, Location};
pub use observation::{MetricType, WeatherObservation};
pub use pivoted::{PivotKey, PivotedRecord};
