//! Cooldown and report-suppression policy
//!
//! Everything here is a pure function of the coordinator's state and the
//! current instant, so it can be tested without timers.

use memgo_domain::MemorySample;
use std::time::Duration;
use tokio::time::Instant;

/// Minimum time since the last clean before a threshold breach cleans again
pub const THRESHOLD_COOLDOWN: Duration = Duration::from_secs(30);

/// Minimum time since the last clean before a scheduled tick cleans
pub const SCHEDULED_COOLDOWN: Duration = Duration::from_secs(60);

/// Usage change (in percentage points) that always warrants a new report
pub const REPORT_DELTA_PERCENT: f64 = 1.0;

/// Longest a sample may go unreported
pub const REPORT_MAX_SILENCE: Duration = Duration::from_secs(1);

/// The most recently reported sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedSample {
    /// Sample that was reported
    pub sample: MemorySample,
    /// Whether it was at or above the threshold
    pub above_threshold: bool,
    /// When it was reported
    pub at: Instant,
}

/// Mutable bookkeeping owned by the coordinator
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    last_clean_at: Option<Instant>,
    last_reported: Option<ReportedSample>,
}

impl CoordinatorState {
    /// Fresh state: never cleaned, nothing reported
    pub fn new() -> Self {
        Self::default()
    }

    /// When the last reclaim finished, if ever
    pub fn last_clean_at(&self) -> Option<Instant> {
        self.last_clean_at
    }

    /// The last reported sample, if any
    pub fn last_reported(&self) -> Option<&ReportedSample> {
        self.last_reported.as_ref()
    }

    /// Record that a reclaim finished at `at`
    ///
    /// The timestamp never moves backwards.
    pub fn record_clean(&mut self, at: Instant) {
        self.last_clean_at = Some(match self.last_clean_at {
            Some(previous) => previous.max(at),
            None => at,
        });
    }

    /// Record that `sample` was reported at `at`
    pub fn record_report(&mut self, sample: MemorySample, above_threshold: bool, at: Instant) {
        self.last_reported = Some(ReportedSample {
            sample,
            above_threshold,
            at,
        });
    }

    /// Whether more than `cooldown` has passed since the last clean
    pub fn cooldown_elapsed(&self, now: Instant, cooldown: Duration) -> bool {
        cooldown_elapsed(self.last_clean_at, now, cooldown)
    }
}

/// Whether more than `cooldown` separates `last_clean_at` from `now`
///
/// A host that has never been cleaned is always past its cooldown.
pub fn cooldown_elapsed(last_clean_at: Option<Instant>, now: Instant, cooldown: Duration) -> bool {
    match last_clean_at {
        Some(last) => now.saturating_duration_since(last) > cooldown,
        None => true,
    }
}

/// Whether a new sample should be reported
///
/// True if nothing was reported yet, usage moved by more than
/// [`REPORT_DELTA_PERCENT`], the sample crossed the threshold in either
/// direction, or more than [`REPORT_MAX_SILENCE`] passed since the last report.
pub fn should_report(
    previous: Option<&ReportedSample>,
    sample: &MemorySample,
    now: Instant,
    threshold_percent: u8,
) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    (sample.used_percent() - previous.sample.used_percent()).abs() > REPORT_DELTA_PERCENT
        || sample.exceeds(threshold_percent) != previous.above_threshold
        || now.saturating_duration_since(previous.at) > REPORT_MAX_SILENCE
}
