//! Best-effort reclamation built from independent steps
//!
//! Each platform gets an ordered list of [`ReclaimStep`]s. Steps run one after
//! another; a failing step is logged and the rest still run.

use crate::command::run_with_timeout;
use crate::native::{MemoryListCommand, NativeCall};
use crate::{Platform, ReclaimError, StepFailure};
use memgo_domain::Reclaimer;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for each external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// What a reclaim step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run an external program
    Command {
        /// Program name or path
        program: String,
        /// Arguments
        args: Vec<String>,
    },

    /// Write to a kernel tunable or other file
    WriteFile {
        /// Target file
        path: PathBuf,
        /// Bytes to write
        contents: String,
    },

    /// Make an in-process OS call
    Native(NativeCall),
}

/// One independent reclamation directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimStep {
    name: String,
    action: StepAction,
}

impl ReclaimStep {
    /// Step that runs `program` with `args`
    pub fn command(name: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            action: StepAction::Command {
                program: program.into(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    /// Step that writes `contents` to `path`
    pub fn write_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            action: StepAction::WriteFile {
                path: path.into(),
                contents: contents.into(),
            },
        }
    }

    /// Step that makes an in-process OS call
    pub fn native(name: impl Into<String>, call: NativeCall) -> Self {
        Self {
            name: name.into(),
            action: StepAction::Native(call),
        }
    }

    /// Step name, used in logs and failure reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the step does
    pub fn action(&self) -> &StepAction {
        &self.action
    }

    fn run(&self, command_timeout: Duration) -> Result<(), String> {
        match &self.action {
            StepAction::Command { program, args } => {
                run_with_timeout(program, args, command_timeout).map(|_| ())
            }
            StepAction::WriteFile { path, contents } => {
                std::fs::write(path, contents).map_err(|e| e.to_string())
            }
            StepAction::Native(call) => call.invoke(),
        }
    }
}

/// Steps for a given platform, in the order they run
pub fn platform_steps(platform: Platform) -> Vec<ReclaimStep> {
    match platform {
        Platform::Linux => vec![
            ReclaimStep::command("sync", "sync", &[]),
            ReclaimStep::write_file("drop_pagecache", "/proc/sys/vm/drop_caches", "1"),
            ReclaimStep::write_file("drop_slab", "/proc/sys/vm/drop_caches", "2"),
            ReclaimStep::write_file("drop_all_caches", "/proc/sys/vm/drop_caches", "3"),
            ReclaimStep::write_file("compact_memory", "/proc/sys/vm/compact_memory", "1"),
        ],
        Platform::MacOs => vec![
            ReclaimStep::command("purge", "purge", &[]),
            ReclaimStep::command("sync", "sync", &[]),
            ReclaimStep::command("flush_dns_cache", "dscacheutil", &["-flushcache"]),
        ],
        Platform::Windows => {
            let mut steps = vec![
                ReclaimStep::native("trim_working_set", NativeCall::TrimWorkingSet),
                ReclaimStep::native("flush_file_cache", NativeCall::FlushFileCache),
            ];
            steps.extend(
                MemoryListCommand::all()
                    .into_iter()
                    .map(|command| ReclaimStep::native(command.as_str(), NativeCall::MemoryList(command))),
            );
            steps.extend([
                ReclaimStep::command(
                    "clear_recycle_bin",
                    "powershell",
                    &["-Command", "Clear-RecycleBin -Force -ErrorAction SilentlyContinue"],
                ),
                ReclaimStep::command(
                    "process_idle_tasks",
                    "rundll32.exe",
                    &["advapi32.dll,ProcessIdleTasks"],
                ),
                ReclaimStep::command("flush_dns_cache", "ipconfig", &["/flushdns"]),
            ]);
            steps
        }
        Platform::Other(_) => Vec::new(),
    }
}

/// Reclaimer that runs a fixed list of steps under a lock
///
/// Concurrent callers block until the current run finishes, so steps from two
/// runs never interleave.
pub struct StepReclaimer {
    platform: Platform,
    steps: Vec<ReclaimStep>,
    command_timeout: Duration,
    lock: Mutex<()>,
}

impl StepReclaimer {
    /// Reclaimer for the current platform
    pub fn detect() -> Self {
        Self::for_platform(Platform::current())
    }

    /// Reclaimer using the standard steps for `platform`
    pub fn for_platform(platform: Platform) -> Self {
        Self::with_steps(platform, platform_steps(platform))
    }

    /// Reclaimer running custom steps
    pub fn with_steps(platform: Platform, steps: Vec<ReclaimStep>) -> Self {
        Self {
            platform,
            steps,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            lock: Mutex::new(()),
        }
    }

    /// Set the per-command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Platform the steps were chosen for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Configured steps
    pub fn steps(&self) -> &[ReclaimStep] {
        &self.steps
    }

    /// Whether a reclaim run is in progress
    pub fn is_busy(&self) -> bool {
        self.lock.is_locked()
    }
}

impl std::fmt::Debug for StepReclaimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepReclaimer")
            .field("platform", &self.platform)
            .field("steps", &self.steps)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl Reclaimer for StepReclaimer {
    type Error = ReclaimError;

    fn reclaim(&self) -> Result<(), ReclaimError> {
        let _guard = self.lock.lock();

        if self.steps.is_empty() {
            return Err(ReclaimError::Unsupported {
                platform: self.platform.to_string(),
            });
        }

        let mut failures = Vec::new();
        for step in &self.steps {
            match step.run(self.command_timeout) {
                Ok(()) => tracing::debug!(step = step.name(), "Reclaim step succeeded"),
                Err(reason) => {
                    tracing::warn!(step = step.name(), %reason, "Reclaim step failed");
                    failures.push(StepFailure {
                        step: step.name().to_string(),
                        reason,
                    });
                }
            }
        }

        if failures.len() == self.steps.len() {
            return Err(ReclaimError::AllStepsFailed { failures });
        }

        tracing::debug!(
            attempted = self.steps.len(),
            failed = failures.len(),
            "Reclaim run finished"
        );
        Ok(())
    }
}
