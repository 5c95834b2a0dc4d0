//! Error taxonomy for iqrun.
//!
//! Each layer has its own enum so callers can tell configuration problems
//! (the executable could not be launched) apart from inference failures
//! (the tool ran and exited non-zero) and from logs that do not carry the
//! statistics a caller asked for.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::command::CommandSpec;

/// Errors produced while assembling an argument vector.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("extra flag name must not be empty")]
    EmptyFlagName,

    #[error("extra flag -{flag} is reserved by the selected run mode")]
    ReservedFlag { flag: String },
}

/// Errors produced by the process runner.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not launch '{executable}': {source}")]
    Launch {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed (status={status:?}): {command}\n{output}")]
    ExecutionFailed {
        command: CommandSpec,
        status: Option<i32>,
        output: String,
    },

    #[error("command timed out after {timeout_secs}s: {command}")]
    TimedOut {
        command: CommandSpec,
        timeout_secs: u64,
    },
}

impl RunError {
    /// True when the executable itself is unusable (missing, not executable).
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, RunError::Launch { .. })
    }
}

/// Statistic fields that an extractor may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Patterns,
    Gaps,
    InvariantSites,
    FinalLogLikelihood,
    Runtime,
    AverageRfDistance,
    RelativeRfDistance,
    UniqueTopologies,
    ParsimonyScore,
    UserTrees,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Patterns => "patterns",
            Field::Gaps => "gaps",
            Field::InvariantSites => "invariant sites",
            Field::FinalLogLikelihood => "final log-likelihood",
            Field::Runtime => "runtime",
            Field::AverageRfDistance => "average RF distance",
            Field::RelativeRfDistance => "relative RF distance",
            Field::UniqueTopologies => "unique topologies",
            Field::ParsimonyScore => "parsimony score",
            Field::UserTrees => "user trees table",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced by log extractors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{field} not found in {}", log.display())]
    FieldNotFound { field: Field, log: PathBuf },

    #[error("could not read log {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// The missing field, if this is a field-not-found error.
    pub fn missing_field(&self) -> Option<Field> {
        match self {
            ExtractError::FieldNotFound { field, .. } => Some(*field),
            ExtractError::Read { .. } => None,
        }
    }
}

/// Errors produced by batch collection over many logs.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("could not read log list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log #{index}: {source}")]
    Extract {
        index: usize,
        #[source]
        source: ExtractError,
    },

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Errors returned by facade operations.
#[derive(Debug, thiserror::Error)]
pub enum IqRunError {
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("run reported success but did not produce {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, IqRunError>;
