use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The nearest predicted pass of one satellite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassWindow {
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub peak_elevation_deg: f64,
}

impl PassWindow {
    /// Inclusive on both ends.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.rise <= now && now <= self.set
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPass {
    pub rise: RawEvent,
    pub culmination: RawEvent,
    pub set: RawEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub utc_timestamp: RawTimestamp,
    #[serde(default)]
    pub alt: Option<RawAltitude>,
}

/// Unix seconds, sent either as a number or as a digit string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Number(i64),
    Text(String),
}

/// The upstream encodes altitudes either as numbers or as strings like "46.00".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAltitude {
    Number(f64),
    Text(String),
}
