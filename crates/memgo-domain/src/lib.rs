//! Memgo Domain Layer
//!
//! Core value types and trait boundaries for the memgo agent. This crate has
//! ZERO external dependencies; platform code lives in `memgo-probe` and the
//! scheduling logic lives in `memgo-agent`.
//!
//! ## Key Concepts
//!
//! - **MemorySample**: a point-in-time snapshot of host memory usage
//! - **Trigger**: the origin of a reclamation request (manual, threshold, schedule)
//! - **StatsProvider**: reads host memory counters
//! - **Reclaimer**: performs best-effort OS memory reclamation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sample;
pub mod traits;
pub mod trigger;

// Re-exports for convenience
pub use sample::{MemorySample, SampleError};
pub use traits::{Reclaimer, StatsProvider};
pub use trigger::Trigger;
