mod backoff;
mod client;
mod error;
mod location;
mod parsing;
mod types;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::{ApiSettings, HttpPassProvider, PassProvider};
pub use error::FetchError;
pub use location::Location;
pub use types::PassWindow;

#[cfg(test)]
pub mod testing;
