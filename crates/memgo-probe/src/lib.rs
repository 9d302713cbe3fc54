//! Memgo Probe Layer
//!
//! Platform implementations of the `StatsProvider` and `Reclaimer` traits from
//! `memgo-domain`. Each trait has one variant per platform family, selected
//! once at startup.
//!
//! # Stats providers
//!
//! - `MeminfoProbe`: Linux, parses `/proc/meminfo`
//! - `VmStatProbe`: macOS, shells out to `sysctl` and `vm_stat`
//! - `SysinfoProbe`: everything else, via the `sysinfo` crate
//! - `HostStats`: enum dispatch over the three
//!
//! # Reclaimers
//!
//! `StepReclaimer` runs an ordered list of best-effort steps under a lock.
//! A failed step never stops the remaining ones. On Windows the list starts
//! with in-process `NativeCall`s that trim working sets and purge the standby
//! list.
//!
//! # Examples
//!
//! ```
//! use memgo_probe::meminfo::parse_meminfo;
//!
//! let sample = parse_meminfo("MemTotal: 1000 kB\nMemAvailable: 250 kB\n").unwrap();
//! assert_eq!(sample.used_percent(), 75.0);
//! ```
//!
//! ```no_run
//! use memgo_domain::{Reclaimer, StatsProvider};
//! use memgo_probe::{HostStats, StepReclaimer};
//!
//! let stats = HostStats::detect();
//! println!("{}", stats.sample().unwrap());
//!
//! let reclaimer = StepReclaimer::detect();
//! reclaimer.reclaim().ok();
//! ```

#![warn(missing_docs)]

mod command;
mod error;
mod host;
pub mod meminfo;
pub mod mock;
pub mod native;
mod platform;
pub mod reclaim;
mod sysinfo_probe;
pub mod vmstat;

pub use error::{ProbeError, ReclaimError, StepFailure};
pub use host::HostStats;
pub use meminfo::MeminfoProbe;
pub use native::{MemoryListCommand, NativeCall};
pub use platform::Platform;
pub use reclaim::{ReclaimStep, StepAction, StepReclaimer};
pub use sysinfo_probe::SysinfoProbe;
pub use vmstat::VmStatProbe;
