//! Run one extractor over many log files.
//!
//! Files are read and parsed concurrently, but results always come back in
//! input order, and the reported error is the first failing log in that
//! order regardless of which task finished first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{BatchError, ExtractError};
use crate::extract::{final_log_likelihood, first_parsimony_score, runtime, LogText};

/// Read a list of log paths, one per line. Blank lines are skipped and
/// relative paths are kept as written.
pub async fn read_log_list(path: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BatchError::List {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Apply `extractor` to every log in `paths`.
pub async fn collect<T, F>(paths: &[PathBuf], extractor: F) -> Result<Vec<T>, BatchError>
where
    T: Send + 'static,
    F: Fn(&LogText) -> Result<T, ExtractError> + Send + Sync + 'static,
{
    let extractor = Arc::new(extractor);
    let mut join_set = JoinSet::new();
    for (idx, path) in paths.iter().cloned().enumerate() {
        let extractor = Arc::clone(&extractor);
        join_set.spawn(async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ExtractError::Read {
                    path: path.clone(),
                    source,
                });
            let result = bytes.and_then(|bytes| {
                let log = LogText::new(&path, String::from_utf8_lossy(&bytes).into_owned());
                (extractor.as_ref())(&log)
            });
            (idx, result)
        });
    }

    let mut slots: Vec<Option<Result<T, ExtractError>>> = (0..paths.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, result) = joined.map_err(|e| BatchError::Task(e.to_string()))?;
        slots[idx] = Some(result);
    }

    let mut values = Vec::with_capacity(paths.len());
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(value)) => values.push(value),
            Some(Err(source)) => return Err(BatchError::Extract { index, source }),
            None => {
                return Err(BatchError::Task(format!(
                    "no result for log #{index}"
                )))
            }
        }
    }
    debug!(count = values.len(), "Collected values from logs");
    Ok(values)
}

/// Final log-likelihood of each log.
pub async fn collect_log_likelihoods(paths: &[PathBuf]) -> Result<Vec<f64>, BatchError> {
    collect(paths, final_log_likelihood).await
}

/// First parsimony score of each log.
pub async fn collect_parsimony_scores(paths: &[PathBuf]) -> Result<Vec<u64>, BatchError> {
    collect(paths, first_parsimony_score).await
}

/// Last reported runtime of each log, in seconds.
pub async fn collect_runtimes(paths: &[PathBuf]) -> Result<Vec<f64>, BatchError> {
    collect(paths, runtime).await
}
