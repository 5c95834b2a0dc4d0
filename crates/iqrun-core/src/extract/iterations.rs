//! Tree-search iteration count.

use std::sync::LazyLock;

use super::patterns::{integer, last_match, Variant};
use super::{Extracted, LogText, Notice};

static ITERATIONS: LazyLock<Vec<Variant<u64>>> = LazyLock::new(|| {
    vec![
        Variant::new(r"Total number of iterations:\s*(\d+)", |c| integer(c, 1)),
        Variant::new(r"TREE SEARCH COMPLETED AFTER (\d+) ITERATIONS", |c| integer(c, 1)),
        Variant::new(r"Number of iterations:\s*(\d+)", |c| integer(c, 1)),
    ]
});

/// Number of search iterations; zero plus a notice when the log has none.
pub fn iteration_count(log: &LogText) -> Extracted<u64> {
    match last_match(&ITERATIONS, log.text()) {
        Some(count) => Extracted::clean(count),
        None => Extracted::with_notice(
            0,
            Notice::IterationCountMissing {
                log: log.source().to_path_buf(),
            },
        ),
    }
}
