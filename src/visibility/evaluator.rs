use chrono::{DateTime, Utc};

use crate::predict::{Backoff, FetchError, Location, PassProvider, PassWindow};
use crate::visibility::cache::PassCache;
use crate::visibility::types::{EvaluationReport, OverheadSet, RefreshOutcome, TrackedSatellite};

/// Mutable state carried from one cycle to the next.
pub struct RefreshState {
    pub cache: PassCache,
    pub backoff: Backoff,
    cursor: usize,
}

impl RefreshState {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            cache: PassCache::new(),
            backoff,
            cursor: 0,
        }
    }
}

/// The peak elevation gates the whole rise-to-set window, so a satellite can
/// count as overhead near the window edges while still low on the horizon.
pub fn is_overhead(window: &PassWindow, now: DateTime<Utc>, min_elevation_deg: f64) -> bool {
    window.contains(now) && window.peak_elevation_deg >= min_elevation_deg
}

pub struct Evaluator {
    satellites: Vec<TrackedSatellite>,
    location: Location,
    min_elevation_deg: f64,
}

impl Evaluator {
    pub fn new(
        mut satellites: Vec<TrackedSatellite>,
        location: Location,
        min_elevation_deg: f64,
    ) -> Self {
        satellites.sort_by_key(|s| s.norad_id);
        Self {
            satellites,
            location,
            min_elevation_deg,
        }
    }

    pub async fn evaluate<P: PassProvider>(
        &self,
        now: DateTime<Utc>,
        state: &mut RefreshState,
        provider: &P,
    ) -> EvaluationReport {
        let refreshed = self.refresh_one(now, state, provider).await;

        let overhead: OverheadSet = self
            .satellites
            .iter()
            .filter(|sat| {
                state
                    .cache
                    .get(sat.norad_id)
                    .is_some_and(|w| is_overhead(w, now, self.min_elevation_deg))
            })
            .cloned()
            .collect();

        EvaluationReport {
            overhead,
            refreshed,
        }
    }

    /// Starting at the cursor, the first satellite not backing off.
    fn next_due(&self, now: DateTime<Utc>, state: &RefreshState) -> Option<usize> {
        let count = self.satellites.len();
        (0..count)
            .map(|offset| (state.cursor + offset) % count)
            .find(|&i| state.backoff.is_ready(self.satellites[i].norad_id, now))
    }

    async fn refresh_one<P: PassProvider>(
        &self,
        now: DateTime<Utc>,
        state: &mut RefreshState,
        provider: &P,
    ) -> Option<RefreshOutcome> {
        let Some(index) = self.next_due(now, state) else {
            log::debug!("all {} satellites backing off, no fetch this cycle", self.satellites.len());
            return None;
        };
        state.cursor = (index + 1) % self.satellites.len();
        let norad_id = self.satellites[index].norad_id;

        let success = match provider.fetch(norad_id, &self.location).await {
            Ok(window) => {
                state.cache.put(norad_id, window);
                state.backoff.record_success(norad_id);
                true
            }
            Err(FetchError::NoPass) => {
                log::info!("satellite {}: no upcoming pass", norad_id);
                state.backoff.record_success(norad_id);
                false
            }
            Err(e) => {
                let delay = state.backoff.record_failure(norad_id, now);
                let failures = state.backoff.state(norad_id).failures;
                if failures > 1 {
                    log::error!(
                        "satellite {}: fetch failed ({}) {} times in a row: {}; next attempt in {}",
                        norad_id,
                        e.class(),
                        failures,
                        e,
                        humantime::format_duration(delay)
                    );
                } else {
                    log::warn!(
                        "satellite {}: fetch failed ({}): {}; next attempt in {}",
                        norad_id,
                        e.class(),
                        e,
                        humantime::format_duration(delay)
                    );
                }
                false
            }
        };

        Some(RefreshOutcome { norad_id, success })
    }
}
