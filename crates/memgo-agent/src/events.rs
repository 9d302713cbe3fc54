//! Status events and the sinks that present them
//!
//! The coordinator emits one [`StatusEvent`] per observable step. Sinks are a
//! one-way boundary: they never block the loop and never report back.

use memgo_domain::{MemorySample, Trigger};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Something the coordinator wants the outside world to know
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A sample passed report suppression
    SampleReported {
        /// Usage percentage
        used_percent: f64,
        /// Available memory in GB
        available_gb: f64,
        /// Total memory in GB
        total_gb: f64,
        /// Configured threshold
        threshold_percent: u8,
        /// Whether usage is at or above the threshold
        above_threshold: bool,
    },

    /// A reclaim run is starting
    CleaningStarted {
        /// Why the clean was requested
        #[serde(serialize_with = "serialize_trigger")]
        trigger: Trigger,
        /// Usage that caused a threshold clean
        #[serde(skip_serializing_if = "Option::is_none")]
        used_percent: Option<f64>,
    },

    /// A reclaim run finished successfully
    CleaningCompleted {
        /// Why the clean was requested
        #[serde(serialize_with = "serialize_trigger")]
        trigger: Trigger,
    },

    /// A reclaim run failed
    CleaningFailed {
        /// Why the clean was requested
        #[serde(serialize_with = "serialize_trigger")]
        trigger: Trigger,
        /// Failure description
        error: String,
    },

    /// Reading memory counters failed; the tick was skipped
    ProbeFailed {
        /// Failure description
        error: String,
    },

    /// A scheduled tick fell inside the cooldown window
    ScheduledCleanSkipped {
        /// Seconds since the previous clean
        since_last_clean_secs: f64,
    },
}

fn serialize_trigger<S: Serializer>(trigger: &Trigger, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(trigger.as_str())
}

impl StatusEvent {
    /// Event for a sample that should be shown
    pub fn sample(sample: &MemorySample, threshold_percent: u8) -> Self {
        StatusEvent::SampleReported {
            used_percent: sample.used_percent(),
            available_gb: sample.available_gb(),
            total_gb: sample.total_gb(),
            threshold_percent,
            above_threshold: sample.exceeds(threshold_percent),
        }
    }
}

/// Receiver of status events
pub trait StatusSink {
    /// Present one event
    fn emit(&self, event: &StatusEvent);
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn emit(&self, event: &StatusEvent) {
        (**self).emit(event)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    fn emit(&self, event: &StatusEvent) {
        (**self).emit(event)
    }
}

/// Sink that turns events into `tracing` records
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn emit(&self, event: &StatusEvent) {
        match event {
            StatusEvent::SampleReported {
                used_percent,
                available_gb,
                total_gb,
                above_threshold,
                ..
            } => {
                if *above_threshold {
                    tracing::warn!(
                        used_percent,
                        available_gb,
                        total_gb,
                        "Memory: {:.1}% used | {:.2} GB available | {:.2} GB total",
                        used_percent,
                        available_gb,
                        total_gb
                    );
                } else {
                    tracing::info!(
                        used_percent,
                        available_gb,
                        total_gb,
                        "Memory: {:.1}% used | {:.2} GB available | {:.2} GB total",
                        used_percent,
                        available_gb,
                        total_gb
                    );
                }
            }
            StatusEvent::CleaningStarted { trigger, used_percent } => match used_percent {
                Some(used) => tracing::info!(
                    trigger = %trigger,
                    used_percent = used,
                    "Memory usage above threshold ({:.1}% used), cleaning RAM",
                    used
                ),
                None => tracing::info!(trigger = %trigger, "Cleaning RAM ({} request)", trigger),
            },
            StatusEvent::CleaningCompleted { trigger } => {
                tracing::info!(trigger = %trigger, "RAM cleaned successfully");
            }
            StatusEvent::CleaningFailed { trigger, error } => {
                tracing::error!(trigger = %trigger, %error, "Failed to clean RAM");
            }
            StatusEvent::ProbeFailed { error } => {
                tracing::error!(%error, "Failed to get memory stats");
            }
            StatusEvent::ScheduledCleanSkipped { since_last_clean_secs } => {
                tracing::debug!(
                    since_last_clean_secs,
                    "Scheduled clean skipped, last clean too recent"
                );
            }
        }
    }
}

/// Sink writing one JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> StatusSink for JsonLinesSink<W> {
    fn emit(&self, event: &StatusEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize status event: {}", e);
                return;
            }
        };

        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to write status event: {}", e);
        }
    }
}

/// Sink forwarding events into an unbounded channel
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<StatusEvent>,
}

impl ChannelSink {
    /// Sink feeding `sender`
    pub fn new(sender: UnboundedSender<StatusEvent>) -> Self {
        Self { sender }
    }
}

impl StatusSink for ChannelSink {
    fn emit(&self, event: &StatusEvent) {
        let _ = self.sender.send(event.clone());
    }
}
