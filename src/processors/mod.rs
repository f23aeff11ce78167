pub mod batch_driver;
pub mod data_merger;
pub mod data_pivoter;
pub mod integrity_checker;
pub mod location_extractor;

pub use batch_driver::{BatchDriver, DriverState, GeocodeOutcome, GeocodingMode};
pub use data_merger::{DataMerger, MergeReport};
pub use data_pivoter::{DataPivoter, PivotReport};
pub use integrity_checker::{
    GeographicCoverage, IntegrityChecker, IntegrityReport, TemperatureViolation,
};
pub use location_extractor::{LocationExtractor, LocationSet};
