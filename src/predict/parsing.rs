use chrono::{DateTime, Utc};

use crate::predict::error::FetchError;
use crate::predict::types::{PassWindow, RawAltitude, RawPass, RawTimestamp};

pub fn parse_altitude(alt: &RawAltitude) -> Option<f64> {
    let value = match alt {
        RawAltitude::Number(v) => *v,
        RawAltitude::Text(s) => s.trim().parse().ok()?,
    };
    value.is_finite().then_some(value)
}

fn parse_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>, FetchError> {
    let secs = match raw {
        RawTimestamp::Number(secs) => *secs,
        RawTimestamp::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| FetchError::Malformed(format!("bad timestamp: {:?}", s)))?,
    };
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| FetchError::Malformed(format!("timestamp out of range: {}", secs)))
}

pub fn window_from_raw(raw: &RawPass) -> Result<PassWindow, FetchError> {
    let rise = parse_timestamp(&raw.rise.utc_timestamp)?;
    let set = parse_timestamp(&raw.set.utc_timestamp)?;
    if rise > set {
        return Err(FetchError::Malformed(format!(
            "rise {} after set {}",
            rise.timestamp(),
            set.timestamp()
        )));
    }

    let peak_elevation_deg = raw
        .culmination
        .alt
        .as_ref()
        .and_then(parse_altitude)
        .ok_or_else(|| FetchError::Malformed("culmination.alt missing or invalid".into()))?;

    Ok(PassWindow {
        rise,
        set,
        peak_elevation_deg,
    })
}
