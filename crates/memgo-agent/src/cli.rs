//! Command-line arguments

use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

/// Memory monitor that cleans RAM on a threshold, a schedule, or on Enter
#[derive(Debug, Parser)]
#[command(name = "memgo", version, about)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply if it does not exist)
    #[arg(short, long, env = "MEMGO_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Emit status events as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// Log filter directive, e.g. "debug" or "memgo_agent=trace"
    #[arg(long, env = "MEMGO_LOG")]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["memgo"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("Memgo.toml"));
        assert!(!cli.json);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "memgo",
            "--config",
            "/etc/memgo.toml",
            "--json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/memgo.toml"));
        assert!(cli.json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["memgo", "--bogus"]).is_err());
    }
}
