//! Memgo - memory monitor and cleaner

use clap::Parser;
use memgo_agent::{
    input, logging, AgentError, CleanerConfig, Cli, Coordinator, JsonLinesSink, StatusSink,
    TracingSink,
};
use memgo_probe::{HostStats, StepReclaimer};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), AgentError> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let config = CleanerConfig::load(&cli.config)?;
    config.log_banner();

    // Platform backends are chosen once and never re-detected
    let stats = HostStats::detect();
    let reclaimer = StepReclaimer::detect().with_command_timeout(config.command_timeout);
    tracing::info!(
        probe = stats.name(),
        platform = %reclaimer.platform(),
        steps = reclaimer.steps().len(),
        "Selected platform backends"
    );

    let sink: Box<dyn StatusSink + Send + Sync> = if cli.json {
        Box::new(JsonLinesSink::stdout())
    } else {
        Box::new(TracingSink)
    };

    tracing::info!("Monitoring memory usage. Press Enter to clean RAM manually. Press Ctrl+C to exit...");

    let mut coordinator = Coordinator::new(config, stats, reclaimer, sink);
    coordinator
        .run(input::spawn_stdin_trigger(), input::shutdown_signal())
        .await;

    Ok(())
}
