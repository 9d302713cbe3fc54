//! macOS probe backed by `sysctl` and `vm_stat`

use crate::command::capture_stdout;
use crate::ProbeError;
use memgo_domain::{MemorySample, StatsProvider};
use std::time::Duration;

const DEFAULT_PAGE_SIZE: u64 = 4096;

/// How long `sysctl` or `vm_stat` may run before the sample is abandoned
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Page counters parsed from `vm_stat` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmStat {
    /// Page size in bytes
    pub page_size: u64,
    /// Pages on the free list
    pub free_pages: u64,
    /// Pages on the inactive list
    pub inactive_pages: u64,
}

impl VmStat {
    /// Free plus inactive memory in bytes
    pub fn reclaimable_bytes(&self) -> u64 {
        self.free_pages
            .saturating_add(self.inactive_pages)
            .saturating_mul(self.page_size)
    }
}

/// Reads memory counters through the macOS command-line utilities
#[derive(Debug, Clone)]
pub struct VmStatProbe {
    timeout: Duration,
}

impl VmStatProbe {
    /// Create a new probe
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Set how long each utility may run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-utility timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for VmStatProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsProvider for VmStatProbe {
    type Error = ProbeError;

    fn sample(&self) -> Result<MemorySample, ProbeError> {
        let memsize = capture_stdout("sysctl", &["-n", "hw.memsize"], self.timeout)?;
        let total = parse_memsize(&memsize)?;
        let stat = parse_vm_stat(&capture_stdout("vm_stat", &[], self.timeout)?);
        build_sample(total, &stat)
    }
}

/// Parse the byte count printed by `sysctl -n hw.memsize`
pub fn parse_memsize(output: &str) -> Result<u64, ProbeError> {
    let trimmed = output.trim();
    trimmed.parse().map_err(|_| ProbeError::Parse {
        field: "hw.memsize".to_string(),
        value: trimmed.to_string(),
    })
}

/// Parse page size and page counts from `vm_stat` output
///
/// Lines that are absent or unparseable leave their counter at its default.
pub fn parse_vm_stat(output: &str) -> VmStat {
    let mut stat = VmStat {
        page_size: DEFAULT_PAGE_SIZE,
        free_pages: 0,
        inactive_pages: 0,
    };

    for line in output.lines() {
        if let Some((_, rest)) = line.split_once("page size of ") {
            if let Some(size) = rest.split_whitespace().next().and_then(|s| s.parse().ok()) {
                stat.page_size = size;
            }
        } else if let Some(count) = page_count(line, "Pages free:") {
            stat.free_pages = count;
        } else if let Some(count) = page_count(line, "Pages inactive:") {
            stat.inactive_pages = count;
        }
    }

    stat
}

fn page_count(line: &str, label: &str) -> Option<u64> {
    let rest = line.trim_start().strip_prefix(label)?;
    rest.trim().trim_end_matches('.').parse().ok()
}

/// Combine the total and page counters into a sample
///
/// An available figure of zero or above the total means `vm_stat` output
/// was not understood.
pub fn build_sample(total_bytes: u64, stat: &VmStat) -> Result<MemorySample, ProbeError> {
    let available = stat.reclaimable_bytes();
    if available == 0 || available > total_bytes {
        return Err(ProbeError::Unavailable(format!(
            "vm_stat reports {} available bytes of {}",
            available, total_bytes
        )));
    }
    Ok(MemorySample::from_bytes(total_bytes, available)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VM_STAT: &str = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                               65536.
Pages active:                            400000.
Pages inactive:                          196608.
Pages speculative:                         5000.
";

    #[test]
    fn test_parse_vm_stat() {
        let stat = parse_vm_stat(VM_STAT);
        assert_eq!(stat.page_size, 16384);
        assert_eq!(stat.free_pages, 65536);
        assert_eq!(stat.inactive_pages, 196608);
        assert_eq!(stat.reclaimable_bytes(), 262144 * 16384);
    }

    #[test]
    fn test_parse_vm_stat_defaults_page_size() {
        let stat = parse_vm_stat("Pages free: 10.\n");
        assert_eq!(stat.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(stat.free_pages, 10);
        assert_eq!(stat.inactive_pages, 0);
    }

    #[test]
    fn test_parse_memsize() {
        assert_eq!(parse_memsize("17179869184\n").unwrap(), 17179869184);
        assert!(matches!(parse_memsize("n/a"), Err(ProbeError::Parse { .. })));
    }

    #[test]
    fn test_build_sample() {
        let total = 16u64 * 1024 * 1024 * 1024;
        let sample = build_sample(total, &parse_vm_stat(VM_STAT)).unwrap();
        assert_eq!(sample.total_gb(), 16.0);
        assert_eq!(sample.available_gb(), 4.0);
        assert_eq!(sample.used_percent(), 75.0);
    }

    #[test]
    fn test_build_sample_rejects_implausible() {
        let empty = parse_vm_stat("");
        assert!(matches!(build_sample(1 << 30, &empty), Err(ProbeError::Unavailable(_))));

        let huge = VmStat { page_size: 4096, free_pages: u64::MAX / 8192, inactive_pages: 0 };
        assert!(matches!(build_sample(1 << 30, &huge), Err(ProbeError::Unavailable(_))));
    }

    #[test]
    fn test_query_timeout() {
        assert_eq!(VmStatProbe::default().timeout(), DEFAULT_QUERY_TIMEOUT);

        let probe = VmStatProbe::new().with_timeout(Duration::from_millis(250));
        assert_eq!(probe.timeout(), Duration::from_millis(250));
    }
}
