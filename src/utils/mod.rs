pub mod atomic;
pub mod constants;
pub mod coordinates;
pub mod logging;
pub mod progress;

pub use atomic::write_atomically;
pub use constants::*;
pub use coordinates::{round_coordinate, round_to};
pub use progress::ProgressReporter;
