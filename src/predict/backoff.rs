use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay before the next poll after `failures` consecutive failures:
    /// `base * 2^(failures - 1)` plus up to `base / 2` of jitter, capped at `max`.
    pub fn delay<R: Rng + ?Sized>(&self, failures: u32, rng: &mut R) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exponent = (failures - 1).min(31);
        let scaled = self.base.saturating_mul(1u32 << exponent);

        let jitter_cap = (self.base / 2).as_millis() as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rng.random_range(0..=jitter_cap)
        };

        scaled
            .saturating_add(Duration::from_millis(jitter))
            .min(self.max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackoffState {
    pub failures: u32,
    pub not_before: Option<DateTime<Utc>>,
}

/// Per-satellite failure bookkeeping, kept across cycles.
pub struct Backoff {
    policy: BackoffPolicy,
    rng: Box<dyn RngCore + Send>,
    states: HashMap<u32, BackoffState>,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_os_rng())
    }

    pub fn with_rng<R: RngCore + Send + 'static>(policy: BackoffPolicy, rng: R) -> Self {
        Self {
            policy,
            rng: Box::new(rng),
            states: HashMap::new(),
        }
    }

    pub fn state(&self, norad_id: u32) -> BackoffState {
        self.states.get(&norad_id).copied().unwrap_or_default()
    }

    pub fn is_ready(&self, norad_id: u32, now: DateTime<Utc>) -> bool {
        match self.state(norad_id).not_before {
            Some(not_before) => now >= not_before,
            None => true,
        }
    }

    /// Returns the delay imposed on the satellite.
    pub fn record_failure(&mut self, norad_id: u32, now: DateTime<Utc>) -> Duration {
        let state = self.states.entry(norad_id).or_default();
        state.failures = state.failures.saturating_add(1);
        let delay = self.policy.delay(state.failures, &mut *self.rng);
        let step = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
        state.not_before = Some(now.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC));
        delay
    }

    pub fn record_success(&mut self, norad_id: u32) {
        self.states.remove(&norad_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(300),
        }
    }

    #[test]
    fn delay_doubles_within_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = policy();
        for (failures, expected) in [(1, 10), (2, 20), (3, 40), (4, 80), (5, 160)] {
            let delay = policy.delay(failures, &mut rng);
            let floor = Duration::from_secs(expected);
            assert!(delay >= floor, "{failures}: {delay:?} < {floor:?}");
            assert!(delay <= floor + Duration::from_secs(5), "{failures}: {delay:?}");
        }
    }

    #[test]
    fn delay_is_capped() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = policy();
        assert_eq!(policy.delay(6, &mut rng), Duration::from_secs(300));
        assert_eq!(policy.delay(40, &mut rng), Duration::from_secs(300));
        assert_eq!(policy.delay(0, &mut rng), Duration::ZERO);
    }

    #[test]
    fn same_seed_gives_same_delays() {
        let policy = policy();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for failures in 1..6 {
            assert_eq!(policy.delay(failures, &mut a), policy.delay(failures, &mut b));
        }
    }

    #[test]
    fn failure_blocks_until_delay_elapses_and_success_resets() {
        let mut backoff = Backoff::with_rng(policy(), StdRng::seed_from_u64(1));
        let now = DateTime::from_timestamp(1_000, 0).unwrap();

        assert!(backoff.is_ready(25544, now));
        let delay = backoff.record_failure(25544, now);
        assert!(delay >= Duration::from_secs(10));
        assert!(!backoff.is_ready(25544, now));
        assert!(backoff.is_ready(43013, now));

        let later = now + TimeDelta::from_std(delay).unwrap();
        assert!(backoff.is_ready(25544, later));

        backoff.record_failure(25544, later);
        assert_eq!(backoff.state(25544).failures, 2);

        backoff.record_success(25544);
        assert_eq!(backoff.state(25544), BackoffState::default());
        assert!(backoff.is_ready(25544, later));
    }
}
