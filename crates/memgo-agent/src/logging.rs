//! Tracing subscriber setup

use crate::AgentError;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "info";

/// Build the log filter from an explicit directive, `RUST_LOG`, or the default
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, AgentError> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| AgentError::Logging(format!("invalid log filter {:?}: {}", directive, e))),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber, logging to stderr
///
/// Stdout is left free for JSON status lines.
pub fn init(directive: Option<&str>) -> Result<(), AgentError> {
    let filter = build_filter(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AgentError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_filter() {
        let filter = build_filter(Some("memgo_agent=debug,warn")).unwrap();
        assert!(filter.to_string().contains("memgo_agent=debug"));
    }

    #[test]
    fn test_invalid_filter() {
        let err = build_filter(Some("memgo_agent=loudest")).unwrap_err();
        assert!(matches!(err, AgentError::Logging(_)));
    }
}
