//! Linux probe backed by `/proc/meminfo`

use crate::ProbeError;
use memgo_domain::{MemorySample, StatsProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default location of the kernel's memory counters
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// Reads memory counters from the `/proc/meminfo` pseudo-file
#[derive(Debug, Clone)]
pub struct MeminfoProbe {
    path: PathBuf,
}

impl MeminfoProbe {
    /// Probe reading the system `/proc/meminfo`
    pub fn new() -> Self {
        Self::with_path(PROC_MEMINFO)
    }

    /// Probe reading a meminfo-formatted file at `path`
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this probe reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for MeminfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsProvider for MeminfoProbe {
    type Error = ProbeError;

    fn sample(&self) -> Result<MemorySample, ProbeError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ProbeError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_meminfo(&content)
    }
}

/// Build a sample from meminfo text
///
/// Values are in KiB. `MemAvailable` is preferred; kernels that lack it (or
/// report zero) fall back to `MemFree`.
pub fn parse_meminfo(content: &str) -> Result<MemorySample, ProbeError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            fields.insert(key.trim_end_matches(':'), value);
        }
    }

    let total = kib_field(&fields, "MemTotal")?;
    let available = match kib_field(&fields, "MemAvailable") {
        Ok(value) if value > 0 => value,
        _ => kib_field(&fields, "MemFree")?,
    };

    Ok(MemorySample::from_kib(total, available)?)
}

fn kib_field(fields: &HashMap<&str, &str>, name: &str) -> Result<u64, ProbeError> {
    let raw = fields
        .get(name)
        .ok_or_else(|| ProbeError::MissingField(name.to_string()))?;
    raw.parse().map_err(|_| ProbeError::Parse {
        field: name.to_string(),
        value: raw.to_string(),
    })
}
