//! Error types for probe and reclaim operations

use memgo_domain::SampleError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading memory counters
///
/// Always transient from the agent's point of view: the tick is skipped and
/// the next one tries again.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Reading a counter file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A required counter was absent
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A counter could not be parsed as a number
    #[error("Invalid value for {field}: {value:?}")]
    Parse {
        /// Counter name
        field: String,
        /// Raw text that failed to parse
        value: String,
    },

    /// Counters were present but inconsistent
    #[error("Inconsistent counters: {0}")]
    Sample(#[from] SampleError),

    /// A helper process failed
    #[error("Command `{program}` failed: {reason}")]
    Command {
        /// Program that was run
        program: String,
        /// What went wrong
        reason: String,
    },

    /// The stats facility is unavailable
    #[error("Stats unavailable: {0}")]
    Unavailable(String),
}

/// A single reclaim step that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Step name
    pub step: String,
    /// Why it failed
    pub reason: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.reason)
    }
}

/// Errors that can occur during reclamation
#[derive(Error, Debug)]
pub enum ReclaimError {
    /// No reclaim steps exist for this platform
    #[error("Unsupported platform: {platform}")]
    Unsupported {
        /// Platform name as reported by the OS
        platform: String,
    },

    /// Every reclaim step failed
    #[error("All {} reclaim steps failed: {}", .failures.len(), join_failures(.failures))]
    AllStepsFailed {
        /// One entry per failed step
        failures: Vec<StepFailure>,
    },
}

fn join_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
