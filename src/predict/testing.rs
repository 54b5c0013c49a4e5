use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use chrono::DateTime;

use crate::predict::{FetchError, Location, PassProvider, PassWindow};

pub fn window(rise: i64, set: i64, peak_elevation_deg: f64) -> PassWindow {
    PassWindow {
        rise: DateTime::from_timestamp(rise, 0).unwrap(),
        set: DateTime::from_timestamp(set, 0).unwrap(),
        peak_elevation_deg,
    }
}

/// In-memory provider recording every call.
#[derive(Default)]
pub struct ScriptedProvider {
    pub windows: Mutex<HashMap<u32, PassWindow>>,
    pub failing: Mutex<HashSet<u32>>,
    pub calls: Mutex<Vec<u32>>,
    pub latency: Duration,
}

impl ScriptedProvider {
    pub fn with_windows(windows: impl IntoIterator<Item = (u32, PassWindow)>) -> Self {
        Self {
            windows: Mutex::new(windows.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, norad_id: u32, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(norad_id);
        } else {
            set.remove(&norad_id);
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl PassProvider for ScriptedProvider {
    async fn fetch(&self, norad_id: u32, _location: &Location) -> Result<PassWindow, FetchError> {
        self.calls.lock().unwrap().push(norad_id);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.lock().unwrap().contains(&norad_id) {
            return Err(FetchError::Status(503));
        }
        self.windows
            .lock()
            .unwrap()
            .get(&norad_id)
            .copied()
            .ok_or(FetchError::NoPass)
    }
}
