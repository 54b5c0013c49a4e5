mod cadence;
mod types;

pub use cadence::Scheduler;
pub use types::RunMode;
