//! Helpers for running platform utilities

use crate::ProbeError;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `program` and return its stdout as text, killing it after `timeout`
///
/// Used for short, read-only queries such as `sysctl` and `vm_stat`.
pub(crate) fn capture_stdout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ProbeError> {
    let command_error = |reason: String| ProbeError::Command {
        program: program.to_string(),
        reason,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| command_error(e.to_string()))?;

    // Drain stdout on its own thread so a full pipe cannot stall the child
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| command_error("stdout was not captured".to_string()))?;
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let status = wait_with_deadline(&mut child, timeout);
    let output = reader
        .join()
        .map_err(|_| command_error("stdout reader panicked".to_string()))?;

    status.map_err(command_error)?;
    let output = output.map_err(|e| command_error(format!("failed to read stdout: {}", e)))?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Run a command to completion, killing it if it outlives `timeout`
///
/// All stdio is detached. Returns a human-readable reason on failure,
/// including a non-zero exit.
pub(crate) fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<ExitStatus, String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to start: {}", e))?;

    wait_with_deadline(&mut child, timeout)
}

/// Poll `child` until it exits or `timeout` passes
///
/// On timeout the child is killed and reaped.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<ExitStatus, String> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(status),
            Ok(Some(status)) => return Err(format!("exited with {}", status)),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {:?}", timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(format!("failed to wait: {}", e)),
        }
    }
}
