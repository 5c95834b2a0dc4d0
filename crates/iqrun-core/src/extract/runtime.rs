//! Runtime samples in seconds.

use std::sync::LazyLock;

use regex::Captures;

use super::patterns::{all_matches, last_match, number, Variant};
use super::LogText;
use crate::error::{ExtractError, Field};

static RUNTIME: LazyLock<Vec<Variant<f64>>> = LazyLock::new(|| {
    vec![
        Variant::new(r"Total wall-clock time used:\s*({NUM})\s*sec", |c| number(c, 1)),
        Variant::new(r"Total CPU time used:\s*({NUM})\s*sec", |c| number(c, 1)),
        Variant::new(r"Wall-clock time used for tree search:\s*({NUM})\s*sec", |c| {
            number(c, 1)
        }),
        // ... / Time: 1h:2m:3s
        Variant::new(
            r"/\s*Time:\s*(?:(\d+)h)?:?\s*(?:(\d+)m)?:?\s*(?:({NUM})s)?",
            compact_seconds,
        ),
        // Total time: 12.3 seconds
        Variant::new(r"\bTime:\s*({NUM})\s*seconds", |c| number(c, 1)),
        Variant::new(r"\bTotal time:\s*({NUM})\s*seconds", |c| number(c, 1)),
    ]
});

/// `HhMmSs` with every component optional, but at least one present.
fn compact_seconds(caps: &Captures<'_>) -> Option<f64> {
    let hours = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
    let minutes = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
    let seconds = number(caps, 3);
    if hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }
    Some(hours.unwrap_or(0.0) * 3600.0 + minutes.unwrap_or(0.0) * 60.0 + seconds.unwrap_or(0.0))
}

/// The last reported runtime in the log.
pub fn runtime(log: &LogText) -> Result<f64, ExtractError> {
    last_match(&RUNTIME, log.text()).ok_or_else(|| log.missing(Field::Runtime))
}

/// Every runtime line in file order. Empty when none is present.
pub fn all_runtimes(log: &LogText) -> Vec<f64> {
    all_matches(&RUNTIME, log.text())
}
