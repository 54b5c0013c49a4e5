use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::time::Instant;

use crate::config::Config;
use crate::emit::{dispatch, format_line, Sink};
use crate::predict::{Backoff, BackoffPolicy, PassProvider};
use crate::scheduler::types::{CadenceState, CycleReport, RunMode};
use crate::visibility::{Evaluator, RefreshOutcome, RefreshState};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

/// Time left in the period after `work`; zero on overrun.
pub fn sleep_for(period: Duration, work: Duration) -> Duration {
    period.saturating_sub(work)
}

pub struct Scheduler<P> {
    evaluator: Evaluator,
    refresh: RefreshState,
    provider: P,
    sinks: Vec<Sink>,
    period: Duration,
    clock: Clock,
    state: CadenceState,
}

impl<P: PassProvider> Scheduler<P> {
    pub fn new(config: &Config, provider: P) -> Self {
        let policy = BackoffPolicy {
            base: config.api.backoff_base,
            max: config.api.backoff_max,
        };
        Self {
            evaluator: Evaluator::new(
                config.satellites.clone(),
                config.location,
                config.min_elevation_deg,
            ),
            refresh: RefreshState::new(Backoff::new(policy)),
            provider,
            sinks: config.outputs.clone(),
            period: config.period,
            clock: Box::new(Utc::now),
            state: CadenceState::Idle,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn transition(&mut self, next: CadenceState) {
        log::trace!("cadence {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs cycles until `shutdown` fires (or its sender is dropped), or after
    /// a single cycle in [`RunMode::Once`]. Returns the number of cycles run.
    pub async fn run(&mut self, mode: RunMode, mut shutdown: oneshot::Receiver<()>) -> u64 {
        let mut cycles = 0u64;

        loop {
            if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                log::info!("shutdown requested after {} cycles", cycles);
                break;
            }

            let started = Instant::now();
            self.transition(CadenceState::Running);
            let outcome = AssertUnwindSafe(self.run_cycle()).catch_unwind().await;
            self.transition(CadenceState::Idle);
            let work = started.elapsed();
            cycles += 1;

            let sleep = match mode {
                RunMode::Once => Duration::ZERO,
                RunMode::Forever => sleep_for(self.period, work),
            };

            let report = outcome.unwrap_or_else(|panic| {
                log::error!(
                    "cycle {} aborted by panic: {}; continuing",
                    cycles,
                    panic_message(panic.as_ref())
                );
                CycleReport::default()
            });
            log::info!(
                "heartbeat cycle={} overhead={} emitted={} refreshed={} work={:?} sleep={:?}",
                cycles,
                report.overhead,
                report.emitted(),
                describe_refresh(report.refreshed),
                work,
                sleep
            );
            if let Some(d) = report.dispatch {
                if d.failed > 0 {
                    log::debug!("{} of {} sinks failed", d.failed, d.failed + d.delivered);
                }
            }

            if mode == RunMode::Once {
                break;
            }
            if sleep.is_zero() {
                log::warn!(
                    "cycle {} overran the {:?} period by {:?}",
                    cycles,
                    self.period,
                    work - self.period
                );
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(sleep) => {}
                _ = &mut shutdown => {
                    log::info!("shutdown requested after {} cycles", cycles);
                    break;
                }
            }
        }

        cycles
    }

    /// One evaluate, format, dispatch pass. Never sleeps.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let now = (self.clock)();
        let evaluation = self
            .evaluator
            .evaluate(now, &mut self.refresh, &self.provider)
            .await;
        log::debug!(
            "refreshed {:?}, {} windows cached",
            evaluation.refreshed,
            self.refresh.cache.len()
        );

        let delivery = match format_line(&evaluation.overhead) {
            Some(line) => Some(dispatch(&line, &self.sinks).await),
            None => None,
        };

        CycleReport {
            overhead: evaluation.overhead.len(),
            refreshed: evaluation.refreshed,
            dispatch: delivery,
        }
    }
}

fn describe_refresh(refreshed: Option<RefreshOutcome>) -> String {
    match refreshed {
        Some(r) if r.success => r.norad_id.to_string(),
        Some(r) => format!("{}(failed)", r.norad_id),
        None => "-".to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
