//! Event loop that decides when to reclaim memory
//!
//! Three trigger sources feed one loop: manual requests, periodic samples and
//! the scheduled-clean timer. Each event is handled to completion before the
//! next is selected, so reclaim runs never overlap.

use crate::events::{StatusEvent, StatusSink};
use crate::metrics::CoordinatorMetrics;
use crate::policy::{should_report, CoordinatorState, SCHEDULED_COOLDOWN, THRESHOLD_COOLDOWN};
use crate::CleanerConfig;
use memgo_domain::{Reclaimer, StatsProvider, Trigger};
use std::fmt::Display;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

/// What handling one event amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do (usage below threshold)
    Idle,
    /// Reclaim ran and succeeded
    Cleaned,
    /// Reclaim ran and failed
    CleanFailed,
    /// A clean was due but withheld by cooldown
    Suppressed,
    /// The probe failed; the tick was skipped
    ProbeFailed,
}

/// Monitoring and cleaning coordinator
///
/// Owns all mutable bookkeeping (last clean, last report) and is the only
/// caller of the reclaimer.
///
/// # Examples
///
/// ```no_run
/// use memgo_agent::{CleanerConfig, Coordinator, TracingSink};
/// use memgo_probe::{HostStats, StepReclaimer};
///
/// #[tokio::main]
/// async fn main() {
///     let (_manual_tx, manual_rx) = tokio::sync::mpsc::channel(16);
///     let mut coordinator = Coordinator::new(
///         CleanerConfig::default(),
///         HostStats::detect(),
///         StepReclaimer::detect(),
///         TracingSink,
///     );
///
///     // Run until Ctrl+C
///     coordinator
///         .run(manual_rx, async {
///             tokio::signal::ctrl_c().await.ok();
///         })
///         .await;
/// }
/// ```
pub struct Coordinator<S, R, K> {
    config: CleanerConfig,
    stats: S,
    reclaimer: R,
    sink: K,
    state: CoordinatorState,
    metrics: CoordinatorMetrics,
}

impl<S, R, K> Coordinator<S, R, K>
where
    S: StatsProvider,
    S::Error: Display,
    R: Reclaimer,
    R::Error: Display,
    K: StatusSink,
{
    /// Create a coordinator that has never cleaned
    pub fn new(config: CleanerConfig, stats: S, reclaimer: R, sink: K) -> Self {
        Self {
            config,
            stats,
            reclaimer,
            sink,
            state: CoordinatorState::new(),
            metrics: CoordinatorMetrics::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Current bookkeeping
    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Mutable bookkeeping, for seeding a known last-clean time
    pub fn state_mut(&mut self) -> &mut CoordinatorState {
        &mut self.state
    }

    /// Counters collected so far
    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    /// The stats provider
    pub fn stats(&self) -> &S {
        &self.stats
    }

    /// The reclaimer
    pub fn reclaimer(&self) -> &R {
        &self.reclaimer
    }

    /// Handle a manual request: always clean, ignoring cooldown
    pub fn on_manual(&mut self, now: Instant) -> Outcome {
        self.clean(Trigger::Manual, None, now)
    }

    /// Handle a sample tick
    ///
    /// Reports the sample (subject to suppression) and cleans if usage is at
    /// or above the threshold and the threshold cooldown has passed.
    pub fn on_sample(&mut self, now: Instant) -> Outcome {
        let sample = match self.stats.sample() {
            Ok(sample) => sample,
            Err(e) => {
                self.metrics.record_probe_failure();
                self.sink.emit(&StatusEvent::ProbeFailed {
                    error: e.to_string(),
                });
                return Outcome::ProbeFailed;
            }
        };

        let threshold = self.config.threshold_percent;
        let above = sample.exceeds(threshold);
        let report = should_report(self.state.last_reported(), &sample, now, threshold);
        if report {
            self.state.record_report(sample, above, now);
            self.sink.emit(&StatusEvent::sample(&sample, threshold));
        }
        self.metrics.record_sample(report);

        if !above {
            return Outcome::Idle;
        }
        if !self.state.cooldown_elapsed(now, THRESHOLD_COOLDOWN) {
            tracing::trace!(used_percent = sample.used_percent(), "Threshold clean in cooldown");
            self.metrics.record_suppressed(Trigger::Threshold);
            return Outcome::Suppressed;
        }

        self.clean(Trigger::Threshold, Some(sample.used_percent()), now)
    }

    /// Handle a scheduled-clean tick
    ///
    /// Cleans unless the last clean was within the scheduled cooldown, in
    /// which case the tick is skipped without error.
    pub fn on_scheduled(&mut self, now: Instant) -> Outcome {
        if !self.state.cooldown_elapsed(now, SCHEDULED_COOLDOWN) {
            let since = self
                .state
                .last_clean_at()
                .map(|last| now.saturating_duration_since(last))
                .unwrap_or_default();
            self.metrics.record_suppressed(Trigger::Scheduled);
            self.sink.emit(&StatusEvent::ScheduledCleanSkipped {
                since_last_clean_secs: since.as_secs_f64(),
            });
            return Outcome::Suppressed;
        }

        self.clean(Trigger::Scheduled, None, now)
    }

    /// Run the reclaimer once and record its completion
    ///
    /// The last-clean time advances on failure too, so a failing reclaimer
    /// is not retried on every tick.
    fn clean(&mut self, trigger: Trigger, used_percent: Option<f64>, now: Instant) -> Outcome {
        self.sink.emit(&StatusEvent::CleaningStarted {
            trigger,
            used_percent,
        });

        let reclaimer = &self.reclaimer;
        let result = run_blocking(|| reclaimer.reclaim());
        self.state.record_clean(now.max(Instant::now()));

        match result {
            Ok(()) => {
                self.metrics.record_clean(trigger, true);
                self.sink.emit(&StatusEvent::CleaningCompleted { trigger });
                Outcome::Cleaned
            }
            Err(e) => {
                self.metrics.record_clean(trigger, false);
                self.sink.emit(&StatusEvent::CleaningFailed {
                    trigger,
                    error: e.to_string(),
                });
                Outcome::CleanFailed
            }
        }
    }

    /// Run the event loop until `shutdown` resolves
    ///
    /// Sources are polled in priority order: shutdown, manual, sample tick,
    /// scheduled tick. An in-flight reclaim always finishes before shutdown is
    /// observed. When the manual channel closes, the loop keeps monitoring.
    pub async fn run<F>(&mut self, mut manual: mpsc::Receiver<()>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut sample_ticker = interval(self.config.sample_interval);
        sample_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut schedule_ticker = self.config.scheduled_interval().and_then(|period| {
            let Some(start) = Instant::now().checked_add(period) else {
                tracing::warn!(?period, "Scheduled interval out of range, scheduled cleaning disabled");
                return None;
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            Some(ticker)
        });

        tokio::pin!(shutdown);
        let mut manual_open = true;

        tracing::info!(
            "Coordinator started (sample interval: {:?}, threshold: {}%, schedule: {})",
            self.config.sample_interval,
            self.config.threshold_percent,
            self.config.schedule_description()
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping coordinator");
                    break;
                }
                request = manual.recv(), if manual_open => match request {
                    Some(()) => {
                        self.on_manual(Instant::now());
                    }
                    None => {
                        tracing::debug!("Manual trigger input closed");
                        manual_open = false;
                    }
                },
                _ = sample_ticker.tick() => {
                    self.on_sample(Instant::now());
                }
                _ = next_tick(&mut schedule_ticker) => {
                    self.on_scheduled(Instant::now());
                }
            }
        }

        tracing::info!("Coordinator stopped. Final metrics:\n{}", self.metrics.summary());
    }
}

/// Run a blocking call without starving other tasks
///
/// On a multi-thread runtime the worker hands its queue to another thread for
/// the duration of the call. Elsewhere the call simply runs inline.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Wait for the next tick, or forever if there is no ticker
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
