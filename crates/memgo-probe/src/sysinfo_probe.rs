//! Portable probe backed by the `sysinfo` crate

use crate::ProbeError;
use memgo_domain::{MemorySample, StatsProvider};
use parking_lot::Mutex;
use sysinfo::System;

/// Reads memory counters through `sysinfo`
///
/// Used on platforms without a dedicated probe (Windows and the BSDs).
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    /// Create a new probe
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProbe").finish_non_exhaustive()
    }
}

impl StatsProvider for SysinfoProbe {
    type Error = ProbeError;

    fn sample(&self) -> Result<MemorySample, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable("sysinfo reports no memory".to_string()));
        }

        // Some platforms do not expose an "available" figure
        let available = match system.available_memory() {
            0 => total.saturating_sub(system.used_memory()),
            n => n.min(total),
        };

        Ok(MemorySample::from_bytes(total, available)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysinfo_sample_is_consistent() {
        let probe = SysinfoProbe::new();
        let sample = probe.sample().unwrap();

        assert!(sample.total_gb() > 0.0);
        assert!(sample.available_gb() <= sample.total_gb());
        let expected = (sample.total_gb() - sample.available_gb()) * 100.0 / sample.total_gb();
        assert!((sample.used_percent() - expected).abs() < 1e-9);
    }
}
