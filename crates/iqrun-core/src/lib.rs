//! iqrun core library
//!
//! Drives the IQ-TREE executable as a subprocess and turns its free-form
//! logs into typed, serializable records.
//!
//! - [`command`] builds argument vectors for every run mode.
//! - [`runner`] executes them and classifies failures.
//! - [`extract`] parses log text with ordered fallback patterns.
//! - [`facade`] composes the three into named operations.
//! - [`batch`] and [`stats`] aggregate one statistic over many logs.

pub mod batch;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod facade;
pub mod fakes;
pub mod runner;
pub mod stats;
pub mod telemetry;

pub use command::{CommandBuilder, CommandSpec, ExtraFlags, FlagValue, RunMode, StartTree};
pub use config::IqTreeConfig;
pub use error::{
    BatchError, CommandError, ConfigError, ExtractError, Field, IqRunError, Result, RunError,
};
pub use extract::{
    AlignmentComposition, Extracted, LikelihoodTrace, LogSummary, LogText, ModelEstimate, Notice,
    TopologyDistanceSummary, TopologyTest, TreeTestResult,
};
pub use facade::IqTree;
pub use runner::{Executor, ProcessRunner, RunOutcome};
pub use stats::SampleStats;
