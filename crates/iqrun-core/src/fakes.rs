//! In-memory stand-in for the IQ-TREE executable (testing only).
//!
//! [`ScriptedExecutor`] satisfies the [`Executor`] contract without spawning
//! anything: it records every command, then writes a canned log and any
//! configured artifacts under the command's `-pre` value.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::RunError;
use crate::facade::{artifact_path, LOG_SUFFIX};
use crate::runner::{Executor, RunOutcome};

#[derive(Debug, Clone)]
enum Behaviour {
    Succeed,
    Fail { status: i32, output: String },
    Unlaunchable,
}

/// Scripted executor that "runs" IQ-TREE by writing files.
#[derive(Debug)]
pub struct ScriptedExecutor {
    log: String,
    artifacts: Vec<(String, String)>,
    behaviour: Behaviour,
    commands: Mutex<Vec<CommandSpec>>,
}

impl ScriptedExecutor {
    /// Succeeds and writes `log` to `<prefix>.log`.
    pub fn new(log: impl Into<String>) -> Self {
        Self {
            log: log.into(),
            artifacts: Vec::new(),
            behaviour: Behaviour::Succeed,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Also write `contents` to `<prefix><suffix>`.
    pub fn with_artifact(mut self, suffix: &str, contents: impl Into<String>) -> Self {
        self.artifacts.push((suffix.to_string(), contents.into()));
        self
    }

    /// Write the log, then report a non-zero exit.
    pub fn failing(mut self, status: i32, output: impl Into<String>) -> Self {
        self.behaviour = Behaviour::Fail {
            status,
            output: output.into(),
        };
        self
    }

    /// Report that the executable could not be launched.
    pub fn unlaunchable(mut self) -> Self {
        self.behaviour = Behaviour::Unlaunchable;
        self
    }

    /// Every command executed so far, in call order.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }

    /// `-pre` values of every command executed so far.
    pub fn prefixes(&self) -> Vec<PathBuf> {
        self.commands()
            .iter()
            .filter_map(|c| c.value_of("pre").map(PathBuf::from))
            .collect()
    }

    async fn write_outputs(&self, command: &CommandSpec) -> Result<(), RunError> {
        let Some(prefix) = command.value_of("pre").map(PathBuf::from) else {
            return Ok(());
        };
        let io_failure = |e: std::io::Error| RunError::ExecutionFailed {
            command: command.clone(),
            status: None,
            output: e.to_string(),
        };

        tokio::fs::write(artifact_path(&prefix, LOG_SUFFIX), &self.log)
            .await
            .map_err(io_failure)?;
        for (suffix, contents) in &self.artifacts {
            tokio::fs::write(artifact_path(&prefix, suffix), contents)
                .await
                .map_err(io_failure)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<RunOutcome, RunError> {
        self.commands.lock().unwrap().push(command.clone());

        if let Behaviour::Unlaunchable = self.behaviour {
            return Err(RunError::Launch {
                executable: command.executable().unwrap_or_default().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted: not found"),
            });
        }

        self.write_outputs(command).await?;

        match &self.behaviour {
            Behaviour::Fail { status, output } => Err(RunError::ExecutionFailed {
                command: command.clone(),
                status: Some(*status),
                output: output.clone(),
            }),
            _ => Ok(RunOutcome {
                exit_code: 0,
                output: self.log.clone(),
                command: command.clone(),
                duration_ms: 0,
            }),
        }
    }
}
