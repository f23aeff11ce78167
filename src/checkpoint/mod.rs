//! Durable geocoding progress
//!
//! The checkpoint is the union of every location geocoded so far. It is
//! rewritten in full after each batch and only ever grows.

pub mod ledger;
pub mod reconcile;
pub mod store;

pub use ledger::GeocodeLedger;
pub use reconcile::{plan_resume, ResumePlan};
pub use store::{CsvCheckpointStore, LocationStore, MemoryStore};
