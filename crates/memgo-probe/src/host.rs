//! Platform-selected stats provider

use crate::{MeminfoProbe, Platform, ProbeError, SysinfoProbe, VmStatProbe};
use memgo_domain::{MemorySample, StatsProvider};

/// Stats provider variant chosen once at startup
#[derive(Debug)]
pub enum HostStats {
    /// `/proc/meminfo` (Linux)
    Meminfo(MeminfoProbe),
    /// `sysctl` + `vm_stat` (macOS)
    VmStat(VmStatProbe),
    /// `sysinfo` crate (everything else)
    Sysinfo(SysinfoProbe),
}

impl HostStats {
    /// Provider for the current platform
    pub fn detect() -> Self {
        Self::for_platform(Platform::current())
    }

    /// Provider for `platform`
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Linux => HostStats::Meminfo(MeminfoProbe::new()),
            Platform::MacOs => HostStats::VmStat(VmStatProbe::new()),
            Platform::Windows | Platform::Other(_) => HostStats::Sysinfo(SysinfoProbe::new()),
        }
    }

    /// Short name of the backing probe
    pub fn name(&self) -> &'static str {
        match self {
            HostStats::Meminfo(_) => "meminfo",
            HostStats::VmStat(_) => "vm_stat",
            HostStats::Sysinfo(_) => "sysinfo",
        }
    }
}

impl StatsProvider for HostStats {
    type Error = ProbeError;

    fn sample(&self) -> Result<MemorySample, ProbeError> {
        match self {
            HostStats::Meminfo(probe) => probe.sample(),
            HostStats::VmStat(probe) => probe.sample(),
            HostStats::Sysinfo(probe) => probe.sample(),
        }
    }
}
