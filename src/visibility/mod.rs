mod cache;
mod evaluator;
mod types;

pub use evaluator::{Evaluator, RefreshState};
pub use types::{RefreshOutcome, TrackedSatellite};
