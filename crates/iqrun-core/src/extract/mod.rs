//! Typed statistics from IQ-TREE log text.
//!
//! Extractors are plain functions over a [`LogText`]. They hold no state,
//! never touch the file again after it has been read, and report
//! non-fatal gaps (a missing starting likelihood or iteration count) as
//! [`Notice`]s next to the value instead of logging them.

pub mod composition;
pub mod distance;
pub mod iterations;
pub mod likelihood;
pub mod model;
pub mod parsimony;
pub(crate) mod patterns;
pub mod runtime;
pub mod significance;
pub mod summary;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Field};

pub use composition::{alignment_composition, AlignmentComposition};
pub use distance::{topology_distances, TopologyDistanceSummary};
pub use iterations::iteration_count;
pub use likelihood::{
    all_log_likelihoods, final_log_likelihood, likelihood_trace, starting_log_likelihood,
    LikelihoodTrace,
};
pub use model::{model_estimate, ModelEstimate};
pub use parsimony::{first_parsimony_score, parsimony_scores};
pub use runtime::{all_runtimes, runtime};
pub use significance::{plausible_trees, significance_tests, TopologyTest, TreeTestResult};
pub use summary::{log_summary, LogSummary};

/// Log contents together with the path they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogText {
    source: PathBuf,
    text: String,
}

impl LogText {
    pub fn new(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    /// Read a log from disk. Invalid UTF-8 is replaced rather than rejected.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn missing(&self, field: Field) -> ExtractError {
        ExtractError::FieldNotFound {
            field,
            log: self.source.clone(),
        }
    }
}

/// Non-fatal condition raised while extracting a defaultable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// No initial log-likelihood line; the value was set to negative infinity.
    StartingLikelihoodMissing { log: PathBuf },
    /// No iteration count line; the value was set to zero.
    IterationCountMissing { log: PathBuf },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::StartingLikelihoodMissing { log } => write!(
                f,
                "starting log-likelihood not found in {}, using -inf",
                log.display()
            ),
            Notice::IterationCountMissing { log } => write!(
                f,
                "iteration count not found in {}, using 0",
                log.display()
            ),
        }
    }
}

/// A value plus the notices raised while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extracted<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Extracted<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            notices: Vec::new(),
        }
    }

    pub fn with_notice(value: T, notice: Notice) -> Self {
        Self {
            value,
            notices: vec![notice],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }

    /// Move this value's notices into `sink` and return the bare value.
    pub fn drain_into(self, sink: &mut Vec<Notice>) -> T {
        sink.extend(self.notices);
        self.value
    }
}
