use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::emit::Sink;
use crate::predict::{ApiSettings, Location};
use crate::visibility::TrackedSatellite;

const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;
const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Validated, immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub location: Location,
    pub min_elevation_deg: f64,
    pub period: Duration,
    /// Sorted by NORAD id.
    pub satellites: Vec<TrackedSatellite>,
    pub outputs: Vec<Sink>,
    pub api: ApiSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    lat: f64,
    lon: f64,
    #[serde(default = "default_min_elevation")]
    min_elevation_deg: f64,
    #[serde(default = "default_period", deserialize_with = "human_duration")]
    period: Duration,
    satellites: serde_yaml::Mapping,
    outputs: Vec<String>,
    #[serde(default)]
    api: RawApiConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApiConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default, deserialize_with = "optional_human_duration")]
    timeout: Option<Duration>,
    #[serde(default, deserialize_with = "optional_human_duration")]
    retry_delay: Option<Duration>,
    #[serde(default, deserialize_with = "optional_human_duration")]
    backoff_base: Option<Duration>,
    #[serde(default, deserialize_with = "optional_human_duration")]
    backoff_max: Option<Duration>,
}

fn default_min_elevation() -> f64 {
    DEFAULT_MIN_ELEVATION_DEG
}

fn default_period() -> Duration {
    DEFAULT_PERIOD
}

fn human_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(d)?;
    humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
}

fn optional_human_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    human_duration(d).map(Some)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let invalid = |msg: String| ConfigError::Invalid(msg);

        let location = Location::new(self.lat, self.lon).ok_or_else(|| {
            invalid(format!(
                "lat must be within -90..90 and lon within -180..180 (got {}, {})",
                self.lat, self.lon
            ))
        })?;

        if !(0.0..=90.0).contains(&self.min_elevation_deg) {
            return Err(invalid(format!(
                "min_elevation_deg must be between 0 and 90 inclusive (got {})",
                self.min_elevation_deg
            )));
        }

        if self.period.is_zero() {
            return Err(invalid("period must be greater than zero".into()));
        }

        let satellites = parse_satellites(&self.satellites)?;

        if self.outputs.is_empty() {
            return Err(invalid("outputs must be a non-empty list".into()));
        }
        let outputs = self
            .outputs
            .iter()
            .map(|s| s.parse::<Sink>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.to_string()))?;

        let defaults = ApiSettings::default();
        let api = ApiSettings {
            base_url: self.api.base_url.unwrap_or(defaults.base_url),
            timeout: self.api.timeout.unwrap_or(defaults.timeout),
            retry_delay: self.api.retry_delay.unwrap_or(defaults.retry_delay),
            backoff_base: self.api.backoff_base.unwrap_or(defaults.backoff_base),
            backoff_max: self.api.backoff_max.unwrap_or(defaults.backoff_max),
        };
        if api.timeout.is_zero() {
            return Err(invalid("api.timeout must be greater than zero".into()));
        }
        if api.backoff_max < api.backoff_base {
            return Err(invalid("api.backoff_max must not be below api.backoff_base".into()));
        }

        Ok(Config {
            location,
            min_elevation_deg: self.min_elevation_deg,
            period: self.period,
            satellites,
            outputs,
            api,
        })
    }
}

/// Keys may be integers or digit strings; labels are trimmed.
fn parse_satellites(map: &serde_yaml::Mapping) -> Result<Vec<TrackedSatellite>, ConfigError> {
    let invalid = |msg: String| ConfigError::Invalid(msg);

    if map.is_empty() {
        return Err(invalid(
            "satellites must be a non-empty mapping of NORAD id -> label".into(),
        ));
    }

    let mut satellites = BTreeMap::new();
    for (key, value) in map {
        let norad_id = match key {
            serde_yaml::Value::Number(n) => n.as_u64(),
            serde_yaml::Value::String(s) if s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
            _ => None,
        }
        .filter(|&id| id > 0)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| {
            invalid(format!(
                "satellite ids must be positive integers, got {}",
                describe(key)
            ))
        })?;

        let label = value
            .as_str()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| invalid(format!("label for NORAD {} must be a non-empty string", norad_id)))?;

        if satellites.insert(norad_id, label.to_string()).is_some() {
            return Err(invalid(format!("NORAD {} listed more than once", norad_id)));
        }
    }

    Ok(satellites
        .into_iter()
        .map(|(norad_id, label)| TrackedSatellite::new(norad_id, label))
        .collect())
}

fn describe(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID: &str = r#"
lat: 37.8
lon: -122.4
satellites:
  25544: " blue "
  "48915": pink
outputs:
  - stdout
  - file:/tmp/passes.log
  - tcp:127.0.0.1:9000
"#;

    fn with(replace: &str, by: &str) -> Result<Config, ConfigError> {
        assert!(VALID.contains(replace), "fixture lacks {replace:?}");
        Config::from_str(&VALID.replace(replace, by))
    }

    fn assert_invalid(result: Result<Config, ConfigError>) {
        match result {
            Err(ConfigError::Invalid(_)) | Err(ConfigError::Yaml(_)) => {}
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn applies_defaults_and_normalizes() {
        let config = Config::from_str(VALID).unwrap();
        assert_eq!(config.location, Location::new(37.8, -122.4).unwrap());
        assert_eq!(config.min_elevation_deg, 10.0);
        assert_eq!(config.period, Duration::from_secs(10));
        assert_eq!(
            config.satellites,
            vec![
                TrackedSatellite::new(25544, "blue"),
                TrackedSatellite::new(48915, "pink"),
            ]
        );
        assert_eq!(
            config.outputs,
            vec![
                Sink::Stdout,
                Sink::File(PathBuf::from("/tmp/passes.log")),
                Sink::Tcp {
                    host: "127.0.0.1".into(),
                    port: 9000
                },
            ]
        );
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn reads_optional_sections() {
        let yaml = format!(
            "{}min_elevation_deg: 0\nperiod: 2s 500ms\napi:\n  base_url: http://localhost:8080\n  timeout: 1s\n  backoff_base: 30s\n  backoff_max: 1h\n",
            VALID
        );
        let config = Config::from_str(&yaml).unwrap();
        assert_eq!(config.min_elevation_deg, 0.0);
        assert_eq!(config.period, Duration::from_millis(2500));
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout, Duration::from_secs(1));
        assert_eq!(config.api.retry_delay, ApiSettings::default().retry_delay);
        assert_eq!(config.api.backoff_base, Duration::from_secs(30));
        assert_eq!(config.api.backoff_max, Duration::from_secs(3600));
    }

    #[test]
    fn rejects_out_of_range_coordinates_and_elevation() {
        assert_invalid(with("lat: 37.8", "lat: 123.0"));
        assert_invalid(with("lon: -122.4", "lon: -222.0"));
        assert_invalid(with("lat: 37.8", "lat: 37.8\nmin_elevation_deg: 90.5"));
        assert_invalid(with("lat: 37.8", "lat: 37.8\nmin_elevation_deg: -1"));
        assert!(with("lat: 37.8", "lat: 37.8\nmin_elevation_deg: 90").is_ok());
    }

    #[test]
    fn rejects_bad_satellites() {
        assert_invalid(with("  25544: \" blue \"\n  \"48915\": pink\n", "  {}\n"));
        assert_invalid(with("25544: \" blue \"", "-1: red"));
        assert_invalid(with("25544: \" blue \"", "0: red"));
        assert_invalid(with("25544: \" blue \"", "25544: \"  \""));
        assert_invalid(with("25544: \" blue \"", "iss: blue"));
        assert_invalid(with("\"48915\": pink", "\"25544\": pink"));
    }

    #[test]
    fn rejects_disallowed_outputs() {
        assert_invalid(with("  - tcp:127.0.0.1:9000", "  - udp:1.2.3.4:9999"));
        assert_invalid(with("  - tcp:127.0.0.1:9000", "  - tcp:127.0.0.1:99999"));
        assert_invalid(with("  - file:/tmp/passes.log", "  - \"file:\""));
        assert_invalid(with(
            "outputs:\n  - stdout\n  - file:/tmp/passes.log\n  - tcp:127.0.0.1:9000\n",
            "outputs: []\n",
        ));
    }

    #[test]
    fn rejects_bad_durations_and_unknown_keys() {
        assert_invalid(with("lat: 37.8", "lat: 37.8\nperiod: 0s"));
        assert_invalid(with("lat: 37.8", "lat: 37.8\nperiod: soon"));
        assert_invalid(with("lat: 37.8", "lat: 37.8\nmin_elev: 5"));
    }

    #[test]
    fn empty_document_and_missing_file_fail() {
        assert!(matches!(Config::from_str(""), Err(ConfigError::Yaml(_))));
        assert!(matches!(Config::from_str("- a\n- b\n"), Err(ConfigError::Yaml(_))));
        assert!(matches!(
            Config::from_file("/nonexistent/satlight.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.satellites.len(), 2);
    }
}
