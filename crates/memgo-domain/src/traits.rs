//! Trait definitions for external interactions
//!
//! These traits define the boundaries between scheduling logic and the host
//! operating system. Platform implementations live in `memgo-probe`.

use crate::MemorySample;

/// Trait for reading host memory counters
///
/// Implemented by the infrastructure layer (memgo-probe)
pub trait StatsProvider {
    /// Error type for probe operations
    type Error;

    /// Take a consistent snapshot of host memory
    ///
    /// Has no side effects beyond reading OS-exposed counters. Failures are
    /// transient from the caller's point of view.
    fn sample(&self) -> Result<MemorySample, Self::Error>;
}

/// Trait for best-effort memory reclamation
///
/// Implemented by the infrastructure layer (memgo-probe)
///
/// Implementations must serialize concurrent calls: a call in progress blocks
/// any overlapping call until it completes. Calling twice in a row is safe.
pub trait Reclaimer {
    /// Error type for reclaim operations
    type Error;

    /// Run the platform's reclamation steps
    ///
    /// Fails only when no reclamation activity could be carried out at all.
    fn reclaim(&self) -> Result<(), Self::Error>;
}

impl<T: StatsProvider + ?Sized> StatsProvider for &T {
    type Error = T::Error;

    fn sample(&self) -> Result<MemorySample, Self::Error> {
        (**self).sample()
    }
}

impl<T: Reclaimer + ?Sized> Reclaimer for &T {
    type Error = T::Error;

    fn reclaim(&self) -> Result<(), Self::Error> {
        (**self).reclaim()
    }
}

impl<T: StatsProvider + ?Sized> StatsProvider for std::sync::Arc<T> {
    type Error = T::Error;

    fn sample(&self) -> Result<MemorySample, Self::Error> {
        (**self).sample()
    }
}

impl<T: Reclaimer + ?Sized> Reclaimer for std::sync::Arc<T> {
    type Error = T::Error;

    fn reclaim(&self) -> Result<(), Self::Error> {
        (**self).reclaim()
    }
}
