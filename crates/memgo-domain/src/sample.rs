//! Memory sample module

use std::fmt;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const KIB_PER_GB: f64 = 1024.0 * 1024.0;

/// A point-in-time measurement of host memory
///
/// Produced fresh on every sampling tick and never persisted. The three
/// fields are always mutually consistent:
/// `used_percent == (total_gb - available_gb) * 100 / total_gb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySample {
    total_gb: f64,
    available_gb: f64,
    used_percent: f64,
}

/// Reasons a set of raw counters cannot form a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// Total memory reported as zero
    ZeroTotal,
    /// Available memory exceeds total memory
    AvailableExceedsTotal,
    /// A counter was negative, NaN or infinite
    NotFinite,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::ZeroTotal => write!(f, "total memory is zero"),
            SampleError::AvailableExceedsTotal => write!(f, "available memory exceeds total"),
            SampleError::NotFinite => write!(f, "memory counter is negative or not finite"),
        }
    }
}

impl std::error::Error for SampleError {}

impl MemorySample {
    /// Build a sample from gigabyte figures
    ///
    /// # Errors
    /// Returns an error if `total_gb` is zero, either value is negative or
    /// non-finite, or `available_gb > total_gb`.
    pub fn from_gb(total_gb: f64, available_gb: f64) -> Result<Self, SampleError> {
        if !total_gb.is_finite() || !available_gb.is_finite() || total_gb < 0.0 || available_gb < 0.0 {
            return Err(SampleError::NotFinite);
        }
        if total_gb == 0.0 {
            return Err(SampleError::ZeroTotal);
        }
        if available_gb > total_gb {
            return Err(SampleError::AvailableExceedsTotal);
        }

        Ok(Self {
            total_gb,
            available_gb,
            used_percent: (total_gb - available_gb) * 100.0 / total_gb,
        })
    }

    /// Build a sample from byte counts
    pub fn from_bytes(total: u64, available: u64) -> Result<Self, SampleError> {
        Self::from_gb(total as f64 / BYTES_PER_GB, available as f64 / BYTES_PER_GB)
    }

    /// Build a sample from KiB counts (the unit of `/proc/meminfo`)
    pub fn from_kib(total: u64, available: u64) -> Result<Self, SampleError> {
        Self::from_gb(total as f64 / KIB_PER_GB, available as f64 / KIB_PER_GB)
    }

    /// Total physical memory in GiB
    pub fn total_gb(&self) -> f64 {
        self.total_gb
    }

    /// Memory available for new allocations in GiB
    pub fn available_gb(&self) -> f64 {
        self.available_gb
    }

    /// Share of total memory in use, 0 to 100
    pub fn used_percent(&self) -> f64 {
        self.used_percent
    }

    /// Whether usage is at or above the given threshold percentage
    pub fn exceeds(&self, threshold_percent: u8) -> bool {
        self.used_percent >= f64::from(threshold_percent)
    }
}

impl fmt::Display for MemorySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% used | {:.2} GB available | {:.2} GB total",
            self.used_percent, self.available_gb, self.total_gb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_creation() {
        let sample = MemorySample::from_gb(16.0, 4.0).unwrap();
        assert_eq!(sample.total_gb(), 16.0);
        assert_eq!(sample.available_gb(), 4.0);
        assert_eq!(sample.used_percent(), 75.0);
    }

    #[test]
    fn test_fully_free_and_fully_used() {
        assert_eq!(MemorySample::from_gb(8.0, 8.0).unwrap().used_percent(), 0.0);
        assert_eq!(MemorySample::from_gb(8.0, 0.0).unwrap().used_percent(), 100.0);
    }

    #[test]
    fn test_rejects_zero_total() {
        assert_eq!(MemorySample::from_gb(0.0, 0.0), Err(SampleError::ZeroTotal));
        assert_eq!(MemorySample::from_kib(0, 0), Err(SampleError::ZeroTotal));
    }

    #[test]
    fn test_rejects_available_above_total() {
        assert_eq!(
            MemorySample::from_gb(4.0, 5.0),
            Err(SampleError::AvailableExceedsTotal)
        );
    }

    #[test]
    fn test_rejects_nan() {
        assert_eq!(MemorySample::from_gb(f64::NAN, 1.0), Err(SampleError::NotFinite));
        assert_eq!(MemorySample::from_gb(4.0, -1.0), Err(SampleError::NotFinite));
    }

    #[test]
    fn test_unit_conversions() {
        let from_kib = MemorySample::from_kib(16 * 1024 * 1024, 8 * 1024 * 1024).unwrap();
        assert_eq!(from_kib.total_gb(), 16.0);
        assert_eq!(from_kib.used_percent(), 50.0);

        let from_bytes = MemorySample::from_bytes(1 << 33, 1 << 31).unwrap();
        assert_eq!(from_bytes.total_gb(), 8.0);
        assert_eq!(from_bytes.available_gb(), 2.0);
    }

    #[test]
    fn test_exceeds_is_inclusive() {
        let sample = MemorySample::from_gb(10.0, 1.0).unwrap();
        assert!(sample.exceeds(90));
        assert!(!sample.exceeds(91));
    }

    #[test]
    fn test_display() {
        let sample = MemorySample::from_gb(16.0, 4.0).unwrap();
        assert_eq!(
            sample.to_string(),
            "75.0% used | 4.00 GB available | 16.00 GB total"
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: used_percent is derived from the two GB figures
        #[test]
        fn test_used_percent_identity(total in 0.001f64..4096.0, frac in 0.0f64..=1.0) {
            let available = total * frac;
            let sample = MemorySample::from_gb(total, available).unwrap();
            let expected = (total - available) * 100.0 / total;

            prop_assert!((sample.used_percent() - expected).abs() < 1e-9);
            prop_assert!(sample.used_percent() >= 0.0);
            prop_assert!(sample.used_percent() <= 100.0 + 1e-9);
            prop_assert!(sample.available_gb() <= sample.total_gb());
        }

        /// Property: KiB counters always produce a consistent sample
        #[test]
        fn test_kib_counters_consistent(total in 1u64..u32::MAX as u64, avail_share in 0u64..=100) {
            let available = total * avail_share / 100;
            let sample = MemorySample::from_kib(total, available).unwrap();
            let expected = (sample.total_gb() - sample.available_gb()) * 100.0 / sample.total_gb();

            prop_assert!((sample.used_percent() - expected).abs() < 1e-9);
        }
    }
}
