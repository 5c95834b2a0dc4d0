//! One-record summary of a search or evaluation log.

use serde::{Deserialize, Serialize};

use super::{
    final_log_likelihood, iteration_count, model_estimate, runtime, Extracted, LogText,
    ModelEstimate,
};
use crate::error::ExtractError;

/// Headline statistics of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub log_likelihood: f64,
    pub iterations: u64,
    pub runtime_secs: Option<f64>,
    pub model: ModelEstimate,
}

/// Final likelihood (required), iteration count (defaulted), runtime and
/// model parameters (optional).
pub fn log_summary(log: &LogText) -> Result<Extracted<LogSummary>, ExtractError> {
    let log_likelihood = final_log_likelihood(log)?;

    let mut notices = Vec::new();
    let iterations = iteration_count(log).drain_into(&mut notices);

    Ok(Extracted {
        value: LogSummary {
            log_likelihood,
            iterations,
            runtime_secs: runtime(log).ok(),
            model: model_estimate(log),
        },
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;
    use crate::extract::Notice;

    #[test]
    fn test_search_log_summary() {
        let text = "\
Model of evolution: LG+G4
Log-likelihood of the tree: -2345.5
Total number of iterations: 100
Total wall-clock time used: 61.0 sec (0h:1m:1s)
";
        let summary = log_summary(&LogText::new("search.log", text)).unwrap();
        assert!(summary.is_clean());
        assert_eq!(summary.value.log_likelihood, -2345.5);
        assert_eq!(summary.value.iterations, 100);
        assert_eq!(summary.value.runtime_secs, Some(61.0));
        assert_eq!(summary.value.model.model_of_evolution.as_deref(), Some("LG+G4"));
    }

    #[test]
    fn test_eval_log_without_iterations() {
        let text = "Log-likelihood: -99.0\nTime: 0.5 seconds\n";
        let summary = log_summary(&LogText::new("eval.log", text)).unwrap();
        assert_eq!(summary.value.iterations, 0);
        assert_eq!(summary.value.runtime_secs, Some(0.5));
        assert!(matches!(
            summary.notices.as_slice(),
            [Notice::IterationCountMissing { .. }]
        ));
    }

    #[test]
    fn test_missing_likelihood_fails() {
        let err = log_summary(&LogText::new("x.log", "Total number of iterations: 3\n")).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::FinalLogLikelihood));
    }
}
