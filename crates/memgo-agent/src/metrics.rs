//! Metrics collection for coordinator operations

use memgo_domain::Trigger;
use std::collections::HashMap;

/// Counters kept by the coordinator over its lifetime
///
/// Tracks samples taken and reported, and cleans attempted, failed or
/// suppressed per trigger.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorMetrics {
    /// Reclaim runs per trigger (successful or not)
    pub cleans: HashMap<Trigger, usize>,

    /// Failed reclaim runs per trigger
    pub clean_failures: HashMap<Trigger, usize>,

    /// Cleans withheld by a cooldown, per trigger
    pub suppressed: HashMap<Trigger, usize>,

    /// Successful probe reads
    pub samples_taken: usize,

    /// Samples that passed report suppression
    pub samples_reported: usize,

    /// Failed probe reads
    pub probe_failures: usize,
}

impl CoordinatorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished reclaim run
    pub fn record_clean(&mut self, trigger: Trigger, succeeded: bool) {
        *self.cleans.entry(trigger).or_insert(0) += 1;
        if !succeeded {
            *self.clean_failures.entry(trigger).or_insert(0) += 1;
        }
    }

    /// Record a clean withheld by cooldown
    pub fn record_suppressed(&mut self, trigger: Trigger) {
        *self.suppressed.entry(trigger).or_insert(0) += 1;
    }

    /// Record a successful sample
    pub fn record_sample(&mut self, reported: bool) {
        self.samples_taken += 1;
        if reported {
            self.samples_reported += 1;
        }
    }

    /// Record a failed probe read
    pub fn record_probe_failure(&mut self) {
        self.probe_failures += 1;
    }

    /// Reclaim runs for one trigger
    pub fn cleans_for(&self, trigger: Trigger) -> usize {
        self.cleans.get(&trigger).copied().unwrap_or(0)
    }

    /// Cooldown suppressions for one trigger
    pub fn suppressed_for(&self, trigger: Trigger) -> usize {
        self.suppressed.get(&trigger).copied().unwrap_or(0)
    }

    /// Reclaim runs across all triggers
    pub fn total_cleans(&self) -> usize {
        self.cleans.values().sum()
    }

    /// Failed reclaim runs across all triggers
    pub fn total_failures(&self) -> usize {
        self.clean_failures.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Coordinator Metrics Summary".to_string(),
            "===========================".to_string(),
            format!("Samples taken: {}", self.samples_taken),
            format!("Samples reported: {}", self.samples_reported),
            format!("Probe failures: {}", self.probe_failures),
            String::new(),
        ];

        if !self.cleans.is_empty() {
            lines.push("Cleans by trigger:".to_string());
            for trigger in Trigger::all() {
                if let Some(count) = self.cleans.get(&trigger) {
                    let failed = self.clean_failures.get(&trigger).copied().unwrap_or(0);
                    lines.push(format!("  {}: {} ({} failed)", trigger, count, failed));
                }
            }
            lines.push(format!("  Total: {}", self.total_cleans()));
            lines.push(String::new());
        }

        if !self.suppressed.is_empty() {
            lines.push("Suppressed by cooldown:".to_string());
            for trigger in Trigger::all() {
                if let Some(count) = self.suppressed.get(&trigger) {
                    lines.push(format!("  {}: {}", trigger, count));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CoordinatorMetrics::new();
        assert_eq!(metrics.total_cleans(), 0);
        assert_eq!(metrics.total_failures(), 0);
        assert_eq!(metrics.samples_taken, 0);
    }

    #[test]
    fn test_record_clean() {
        let mut metrics = CoordinatorMetrics::new();
        metrics.record_clean(Trigger::Manual, true);
        metrics.record_clean(Trigger::Threshold, false);
        metrics.record_clean(Trigger::Manual, true);

        assert_eq!(metrics.cleans_for(Trigger::Manual), 2);
        assert_eq!(metrics.cleans_for(Trigger::Threshold), 1);
        assert_eq!(metrics.cleans_for(Trigger::Scheduled), 0);
        assert_eq!(metrics.total_cleans(), 3);
        assert_eq!(metrics.total_failures(), 1);
    }

    #[test]
    fn test_record_sample() {
        let mut metrics = CoordinatorMetrics::new();
        metrics.record_sample(true);
        metrics.record_sample(false);
        metrics.record_probe_failure();

        assert_eq!(metrics.samples_taken, 2);
        assert_eq!(metrics.samples_reported, 1);
        assert_eq!(metrics.probe_failures, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = CoordinatorMetrics::new();
        metrics.record_clean(Trigger::Scheduled, true);
        metrics.record_suppressed(Trigger::Threshold);
        metrics.record_sample(true);

        metrics.reset();

        assert_eq!(metrics.total_cleans(), 0);
        assert_eq!(metrics.suppressed_for(Trigger::Threshold), 0);
        assert_eq!(metrics.samples_taken, 0);
    }

    #[test]
    fn test_summary() {
        let mut metrics = CoordinatorMetrics::new();
        metrics.record_clean(Trigger::Manual, true);
        metrics.record_clean(Trigger::Threshold, false);
        metrics.record_suppressed(Trigger::Scheduled);
        metrics.record_sample(true);

        let summary = metrics.summary();
        assert!(summary.contains("Samples taken: 1"));
        assert!(summary.contains("manual: 1 (0 failed)"));
        assert!(summary.contains("threshold: 1 (1 failed)"));
        assert!(summary.contains("Total: 2"));
        assert!(summary.contains("scheduled: 1"));
    }
}
