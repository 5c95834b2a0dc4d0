//! Pairwise Robinson-Foulds distance summary from an `-rfdist` run.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::patterns::{integer, last_match, number, Variant};
use super::LogText;
use crate::error::{ExtractError, Field};

/// Mean pairwise topology distances over a set of trees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyDistanceSummary {
    /// Number of unique topologies, always positive.
    pub topology_count: u64,
    /// Mean relative RF distance, in `[0, 1]`.
    pub mean_relative_distance: f64,
    /// Mean absolute RF distance.
    pub mean_absolute_distance: f64,
}

/// (absolute, relative)
static AVERAGES: LazyLock<Vec<Variant<(Option<f64>, Option<f64>)>>> = LazyLock::new(|| {
    vec![
        // Average RF distance: 18.42 (relative 0.276)
        Variant::new(
            r"(?i)Average RF distance:\s*({NUM})\s*\(\s*relative\s+({NUM})\s*\)",
            |c| Some((number(c, 1), number(c, 2))),
        ),
        // Average relative RF distance: 0.276 (absolute 18.42)
        Variant::new(
            r"(?i)Average relative RF distance:\s*({NUM})\s*\(\s*absolute\s+({NUM})\s*\)",
            |c| Some((number(c, 2), number(c, 1))),
        ),
    ]
});

static TOPOLOGIES: LazyLock<Vec<Variant<u64>>> = LazyLock::new(|| {
    vec![Variant::new(r"Number of unique topologies:\s*(\d+)", |c| integer(c, 1))]
});

/// Summary of the distance log. No partial summaries: any unresolved or
/// out-of-range field fails the whole extraction.
pub fn topology_distances(log: &LogText) -> Result<TopologyDistanceSummary, ExtractError> {
    let text = log.text();
    let (absolute, relative) = last_match(&AVERAGES, text).unwrap_or((None, None));

    let mean_absolute_distance = absolute
        .filter(|a| *a >= 0.0)
        .ok_or_else(|| log.missing(Field::AverageRfDistance))?;
    let mean_relative_distance = relative
        .filter(|r| (0.0..=1.0).contains(r))
        .ok_or_else(|| log.missing(Field::RelativeRfDistance))?;
    let topology_count = last_match(&TOPOLOGIES, text)
        .filter(|n| *n > 0)
        .ok_or_else(|| log.missing(Field::UniqueTopologies))?;

    Ok(TopologyDistanceSummary {
        topology_count,
        mean_relative_distance,
        mean_absolute_distance,
    })
}
