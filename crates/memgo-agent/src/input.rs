//! External trigger sources: manual input lines and shutdown signals

use std::io::{BufRead, BufReader};
use std::thread;
use tokio::sync::mpsc;

/// Default capacity of the manual trigger channel
pub const MANUAL_CHANNEL_CAPACITY: usize = 16;

/// Turn each line read from `reader` into one manual trigger
///
/// Lines are read on a dedicated OS thread. A blocked read there never holds
/// up runtime shutdown; the thread is simply abandoned when the process exits.
/// The returned channel closes when the reader hits EOF or an error, or the
/// receiver is dropped.
pub fn spawn_line_trigger<R>(reader: R, capacity: usize) -> mpsc::Receiver<()>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);

    let spawned = thread::Builder::new()
        .name("memgo-manual-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                if let Err(e) = line {
                    tracing::warn!("Failed to read manual input: {}", e);
                    return;
                }
                if tx.blocking_send(()).is_err() {
                    return;
                }
            }
            tracing::debug!("Manual input reached EOF");
        });

    if let Err(e) = spawned {
        tracing::warn!("Failed to start manual input reader: {}", e);
    }

    rx
}

/// Manual triggers from standard input, one per line
pub fn spawn_stdin_trigger() -> mpsc::Receiver<()> {
    spawn_line_trigger(BufReader::new(std::io::stdin()), MANUAL_CHANNEL_CAPACITY)
}

/// Resolve on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Exiting...");
}
