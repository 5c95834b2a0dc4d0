//! Parsimony scores of the trees a parsimony run produced.

use std::sync::LazyLock;

use super::patterns::{all_matches, first_match, integer, Variant};
use super::LogText;
use crate::error::{ExtractError, Field};

static SCORE: LazyLock<Vec<Variant<u64>>> = LazyLock::new(|| {
    vec![Variant::new(r"Parsimony score:\s*(\d+)", |c| integer(c, 1))]
});

/// Every parsimony score in file order. An empty list is a valid result.
pub fn parsimony_scores(log: &LogText) -> Vec<u64> {
    all_matches(&SCORE, log.text())
}

/// The first parsimony score, which belongs to the first tree the run built.
pub fn first_parsimony_score(log: &LogText) -> Result<u64, ExtractError> {
    first_match(&SCORE, log.text()).ok_or_else(|| log.missing(Field::ParsimonyScore))
}
