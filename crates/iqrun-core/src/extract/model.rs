//! Substitution-model parameters as free-form text.

use std::sync::LazyLock;

use regex::Captures;
use serde::{Deserialize, Serialize};

use super::patterns::{last_match, Variant};
use super::LogText;

/// Model parameters reported by the tool. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEstimate {
    pub rate_heterogeneity: Option<String>,
    pub base_frequencies: Option<String>,
    pub substitution_rates: Option<String>,
    pub model_of_evolution: Option<String>,
}

impl ModelEstimate {
    pub fn is_empty(&self) -> bool {
        self.rate_heterogeneity.is_none()
            && self.base_frequencies.is_none()
            && self.substitution_rates.is_none()
            && self.model_of_evolution.is_none()
    }
}

fn rest(caps: &Captures<'_>) -> Option<String> {
    Some(caps.get(1)?.as_str().trim().to_string()).filter(|s| !s.is_empty())
}

static RATE_HETEROGENEITY: LazyLock<Vec<Variant<String>>> = LazyLock::new(|| {
    vec![Variant::new(r"(?i)\brate heterogeneity[^:]*:\s*(\S.*)$", rest)]
});

static BASE_FREQUENCIES: LazyLock<Vec<Variant<String>>> = LazyLock::new(|| {
    vec![Variant::new(r"(?i)\bbase frequencies[^:]*:\s*(\S.*)$", rest)]
});

static SUBSTITUTION_RATES: LazyLock<Vec<Variant<String>>> = LazyLock::new(|| {
    vec![
        Variant::new(r"(?i)\bsubstitution rates[^:]*:\s*(\S.*)$", rest),
        Variant::new(r"(?i)\brate parameters[^:]*:\s*(\S.*)$", rest),
    ]
});

static MODEL_OF_EVOLUTION: LazyLock<Vec<Variant<String>>> = LazyLock::new(|| {
    vec![Variant::new(r"(?i)\bmodel of evolution:\s*(\S.*)$", rest)]
});

/// Model parameters, each from its last occurrence in the log.
pub fn model_estimate(log: &LogText) -> ModelEstimate {
    let text = log.text();
    ModelEstimate {
        rate_heterogeneity: last_match(&RATE_HETEROGENEITY, text),
        base_frequencies: last_match(&BASE_FREQUENCIES, text),
        substitution_rates: last_match(&SUBSTITUTION_RATES, text),
        model_of_evolution: last_match(&MODEL_OF_EVOLUTION, text),
    }
}
