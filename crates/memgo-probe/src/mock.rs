//! Deterministic test doubles
//!
//! These never touch the host. They are used by the agent's tests and are
//! handy for embedding the coordinator without root privileges.

use crate::{ProbeError, ReclaimError, StepFailure};
use memgo_domain::{MemorySample, Reclaimer, StatsProvider};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted probe result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedReading {
    /// Return this sample
    Sample(MemorySample),
    /// Fail with `ProbeError::Unavailable`
    Fail,
}

/// Stats provider replaying a fixed script
///
/// Readings are returned in order; the last one repeats once the script is
/// exhausted.
#[derive(Debug)]
pub struct ScriptedStats {
    readings: Mutex<VecDeque<ScriptedReading>>,
    calls: AtomicUsize,
}

impl ScriptedStats {
    /// Provider replaying `readings`
    pub fn new(readings: impl IntoIterator<Item = ScriptedReading>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider that always reports `used_percent` of a 100 GB host
    pub fn fixed(used_percent: f64) -> Self {
        Self::new([ScriptedReading::Sample(sample_at(used_percent))])
    }

    /// Number of times `sample` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatsProvider for ScriptedStats {
    type Error = ProbeError;

    fn sample(&self) -> Result<MemorySample, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut readings = self.readings.lock();
        let reading = if readings.len() > 1 {
            readings.pop_front()
        } else {
            readings.front().copied()
        };

        match reading {
            Some(ScriptedReading::Sample(sample)) => Ok(sample),
            Some(ScriptedReading::Fail) => {
                Err(ProbeError::Unavailable("scripted failure".to_string()))
            }
            None => Err(ProbeError::Unavailable("empty script".to_string())),
        }
    }
}

/// A sample of a 100 GB host at the given usage
///
/// With a 100 GB total, whole-number percentages round-trip exactly.
///
/// # Panics
/// Panics if `used_percent` is outside 0 to 100.
pub fn sample_at(used_percent: f64) -> MemorySample {
    MemorySample::from_gb(100.0, 100.0 - used_percent)
        .expect("used_percent must be within 0..=100")
}

/// Reclaimer that counts calls and detects overlapping runs
///
/// It deliberately takes no lock of its own, so any overlap it records was
/// let through by the caller.
#[derive(Debug, Default)]
pub struct RecordingReclaimer {
    calls: AtomicUsize,
    overlaps: AtomicUsize,
    in_flight: AtomicBool,
    fail: AtomicBool,
    delay: Duration,
}

impl RecordingReclaimer {
    /// Reclaimer that always succeeds immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Reclaimer whose runs take `delay` of wall-clock time
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Make subsequent runs fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of completed or in-progress runs
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of runs that started while another was in progress
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

impl Reclaimer for RecordingReclaimer {
    type Error = ReclaimError;

    fn reclaim(&self) -> Result<(), ReclaimError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.store(false, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ReclaimError::AllStepsFailed {
                failures: vec![StepFailure {
                    step: "scripted".to_string(),
                    reason: "scripted failure".to_string(),
                }],
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_replays_then_repeats_last() {
        let stats = ScriptedStats::new([
            ScriptedReading::Sample(sample_at(10.0)),
            ScriptedReading::Fail,
            ScriptedReading::Sample(sample_at(50.0)),
        ]);

        assert_eq!(stats.sample().unwrap().used_percent(), 10.0);
        assert!(stats.sample().is_err());
        assert_eq!(stats.sample().unwrap().used_percent(), 50.0);
        assert_eq!(stats.sample().unwrap().used_percent(), 50.0);
        assert_eq!(stats.calls(), 4);
    }

    #[test]
    fn test_empty_script_fails() {
        let stats = ScriptedStats::new([]);
        assert!(matches!(stats.sample(), Err(ProbeError::Unavailable(_))));
    }

    #[test]
    fn test_recording_reclaimer() {
        let reclaimer = RecordingReclaimer::new();
        reclaimer.reclaim().unwrap();

        reclaimer.set_failing(true);
        assert!(reclaimer.reclaim().is_err());

        assert_eq!(reclaimer.calls(), 2);
        assert_eq!(reclaimer.overlaps(), 0);
    }
}
