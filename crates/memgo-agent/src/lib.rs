//! Memgo Agent
//!
//! Long-running memory monitor that reclaims host memory on demand, on a
//! schedule, or when usage crosses a threshold.
//!
//! # Overview
//!
//! The agent is responsible for:
//! - **Sampling**: reading host memory counters on a fixed cadence
//! - **Reporting**: emitting status events, suppressing redundant samples
//! - **Cleaning**: invoking the platform reclaimer through a shared cooldown gate
//!
//! # Trigger sources
//!
//! | Source | Fires | Cooldown |
//! |--------|-------|----------|
//! | **Manual** | One line of stdin | None (always honoured) |
//! | **Threshold** | Sample with usage >= `CLEAN_ABOVE` | 30 s since last clean |
//! | **Scheduled** | Every `CLEAN_INTERVAL` minutes | 60 s since last clean |
//!
//! All three run through one [`Coordinator`] loop, so at most one reclaim is
//! ever in progress.
//!
//! # Usage
//!
//! ```no_run
//! use memgo_agent::{input, CleanerConfig, Coordinator, TracingSink};
//! use memgo_probe::{HostStats, StepReclaimer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CleanerConfig::load("Memgo.toml")?;
//!     let reclaimer = StepReclaimer::detect().with_command_timeout(config.command_timeout);
//!     let mut coordinator = Coordinator::new(config, HostStats::detect(), reclaimer, TracingSink);
//!
//!     coordinator
//!         .run(input::spawn_stdin_trigger(), input::shutdown_signal())
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [AUTOCLEANER]
//! CLEAN_ABOVE = 90
//! CLEAN_INTERVAL = 0
//!
//! [CONFIG]
//! UPDATE_INTERVAL = 0.5
//! COMMAND_TIMEOUT = 30
//! ```

#![warn(missing_docs)]

pub mod cli;
mod config;
mod coordinator;
mod error;
pub mod events;
pub mod input;
pub mod logging;
mod metrics;
pub mod policy;

pub use cli::Cli;
pub use config::{CleanerConfig, ConfigFile, DEFAULT_CONFIG_FILE};
pub use coordinator::{Coordinator, Outcome};
pub use error::{AgentError, ConfigError};
pub use events::{ChannelSink, JsonLinesSink, StatusEvent, StatusSink, TracingSink};
pub use metrics::CoordinatorMetrics;
pub use policy::CoordinatorState;
