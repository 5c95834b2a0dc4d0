//! Starting, final, and per-step log-likelihood values.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::patterns::{all_matches, last_match, latest_match, number, Variant};
use super::{Extracted, LogText, Notice};
use crate::error::{ExtractError, Field};

/// Log-likelihood values observed over one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodTrace {
    /// Initial tree likelihood, or negative infinity when the log has none.
    pub starting: f64,
    /// Likelihood the run reported last.
    pub final_value: f64,
    /// Every reported likelihood, in file order.
    pub all_observed: Vec<f64>,
    /// Maximum of `all_observed`.
    pub best: f64,
}

static FINAL: LazyLock<Vec<Variant<f64>>> = LazyLock::new(|| {
    vec![
        Variant::new(r"Optimal log-likelihood:\s*({NUM})", |c| number(c, 1)),
        Variant::new(r"BEST SCORE FOUND\s*:\s*({NUM})", |c| number(c, 1)),
        Variant::new(r"Log-likelihood of the tree:\s*({NUM})", |c| number(c, 1)),
        Variant::new(r"Log-likelihood:\s*({NUM})", |c| number(c, 1)),
    ]
});

static STARTING: LazyLock<Vec<Variant<f64>>> = LazyLock::new(|| {
    vec![
        Variant::new(r"Initial log-likelihood:\s*({NUM})", |c| number(c, 1)),
        Variant::new(r"Initial tree log-likelihood:\s*({NUM})", |c| number(c, 1)),
    ]
});

/// The final log-likelihood: the last line in the log carrying any of the
/// known phrasings.
pub fn final_log_likelihood(log: &LogText) -> Result<f64, ExtractError> {
    latest_match(&FINAL, log.text()).ok_or_else(|| log.missing(Field::FinalLogLikelihood))
}

/// Every final-likelihood line in file order. Empty when none is present.
pub fn all_log_likelihoods(log: &LogText) -> Vec<f64> {
    all_matches(&FINAL, log.text())
}

/// The initial likelihood; negative infinity plus a notice when absent.
pub fn starting_log_likelihood(log: &LogText) -> Extracted<f64> {
    match last_match(&STARTING, log.text()) {
        Some(value) => Extracted::clean(value),
        None => Extracted::with_notice(
            f64::NEG_INFINITY,
            Notice::StartingLikelihoodMissing {
                log: log.source().to_path_buf(),
            },
        ),
    }
}

/// Starting, final, and all observed likelihoods.
///
/// Fails only when no final likelihood can be found.
pub fn likelihood_trace(log: &LogText) -> Result<Extracted<LikelihoodTrace>, ExtractError> {
    let final_value = final_log_likelihood(log)?;
    let mut all_observed = all_log_likelihoods(log);
    if all_observed.is_empty() {
        all_observed.push(final_value);
    }
    let best = all_observed
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let Extracted { value: starting, notices } = starting_log_likelihood(log);

    Ok(Extracted {
        value: LikelihoodTrace {
            starting,
            final_value,
            all_observed,
            best,
        },
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_LOG: &str = "\
Initial log-likelihood: -12345.678
Log-likelihood: -12100.5
Log-likelihood: -12050.25
BEST SCORE FOUND : -12000.125
";

    #[test]
    fn test_final_prefers_variant_order() {
        let log = LogText::new("search.log", SEARCH_LOG);
        assert_eq!(final_log_likelihood(&log).unwrap(), -12000.125);
    }

    #[test]
    fn test_final_scans_from_end() {
        let log = LogText::new(
            "eval.log",
            "Log-likelihood of the tree: -10.0\nLog-likelihood of the tree: -9.5\n",
        );
        assert_eq!(final_log_likelihood(&log).unwrap(), -9.5);
    }

    #[test]
    fn test_final_is_latest_line_not_first_phrasing() {
        let log = LogText::new(
            "resumed.log",
            "Optimal log-likelihood: -13000.500\n\
             Iteration 10 / LogL: -12500.0 / Time: 0h:0m:5s\n\
             BEST SCORE FOUND : -12345.678\n",
        );
        assert_eq!(final_log_likelihood(&log).unwrap(), -12345.678);

        let trace = likelihood_trace(&log).unwrap();
        assert_eq!(trace.value.final_value, -12345.678);
        assert_eq!(trace.value.best, trace.value.final_value);
    }

    #[test]
    fn test_all_observed_in_order() {
        let log = LogText::new("search.log", SEARCH_LOG);
        assert_eq!(
            all_log_likelihoods(&log),
            vec![-12100.5, -12050.25, -12000.125]
        );
    }

    #[test]
    fn test_trace_best_is_maximum() {
        let log = LogText::new("search.log", SEARCH_LOG);
        let trace = likelihood_trace(&log).unwrap();
        assert!(trace.is_clean());
        assert_eq!(trace.value.starting, -12345.678);
        assert_eq!(trace.value.best, -12000.125);
        assert_eq!(trace.value.all_observed.len(), 3);
    }

    #[test]
    fn test_missing_start_defaults_with_notice() {
        let log = LogText::new("eval.log", "Optimal log-likelihood: -500.0\n");
        let trace = likelihood_trace(&log).unwrap();
        assert_eq!(trace.value.starting, f64::NEG_INFINITY);
        assert_eq!(trace.notices.len(), 1);
        assert!(matches!(
            trace.notices[0],
            Notice::StartingLikelihoodMissing { .. }
        ));
    }

    #[test]
    fn test_alternate_starting_phrase() {
        let log = LogText::new("run.log", "Initial tree log-likelihood: -77.5\n");
        let start = starting_log_likelihood(&log);
        assert!(start.is_clean());
        assert_eq!(start.value, -77.5);
    }

    #[test]
    fn test_missing_final_fails() {
        let log = LogText::new("run.log", "Initial log-likelihood: -1.0\n");
        let err = likelihood_trace(&log).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::FinalLogLikelihood));
    }

    #[test]
    fn test_exponent_notation() {
        let log = LogText::new("run.log", "Optimal log-likelihood: -1.2345e4\n");
        assert_eq!(final_log_likelihood(&log).unwrap(), -12345.0);
    }
}
