//! Child-process execution for IQ-TREE command lines.
//!
//! The runner knows nothing about log formats. It launches the command,
//! waits for it, captures stdout and stderr, and classifies the result into
//! "could not launch", "ran but failed", or success.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::command::CommandSpec;
use crate::error::RunError;

/// Result of one successful process execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Exit code (always 0 for outcomes returned by [`ProcessRunner`]).
    pub exit_code: i32,

    /// Captured stdout followed by captured stderr.
    pub output: String,

    /// The command that was run.
    pub command: CommandSpec,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam between the facade and process execution.
///
/// Implementations must be safe to call concurrently; each call is independent.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run the command to completion.
    async fn execute(&self, command: &CommandSpec) -> Result<RunOutcome, RunError>;
}

/// Executes commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout_secs: u64,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each execution by `timeout_secs` (0 disables the bound).
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

#[async_trait]
impl Executor for ProcessRunner {
    async fn execute(&self, command: &CommandSpec) -> Result<RunOutcome, RunError> {
        let start = Instant::now();

        let exe = command.executable().unwrap_or_default().to_string();
        if exe.is_empty() {
            return Err(RunError::Launch {
                executable: exe,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "command has no executable",
                ),
            });
        }

        debug!(command = %command, "Spawning process");

        let child = Command::new(&exe)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Launch {
                executable: exe.clone(),
                source,
            })?;

        let waited = if self.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| RunError::TimedOut {
                command: command.clone(),
                timeout_secs: self.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };

        // Failure while waiting on an already spawned child is not a
        // configuration problem, so report it as an execution failure.
        let output = waited.map_err(|e| RunError::ExecutionFailed {
            command: command.clone(),
            status: None,
            output: e.to_string(),
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(RunError::ExecutionFailed {
                command: command.clone(),
                status: output.status.code(),
                output: text,
            });
        }

        debug!(duration_ms, "Process finished");

        Ok(RunOutcome {
            exit_code: output.status.code().unwrap_or(0),
            output: text,
            command: command.clone(),
            duration_ms,
        })
    }
}
