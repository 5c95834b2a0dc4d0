//! Per-tree topology test results from the `USER TREES` table of a
//! `.iqtree` report.
//!
//! ```text
//! Tree      logL    deltaL  bp-RELL    p-KH     p-SH       c-ELW       p-AU
//! -------------------------------------------------------------------------
//!   1 -21152.617       0   0.564 +  0.652 +      1 +     0.585 +    0.769 +
//!   2 -21189.245  36.628  0.0001 - 0.0003 -  0.012 -  5.06e-05 -  2.1e-05 -
//! ```
//!
//! `+` marks a tree inside the test's 95% confidence set, `-` a significant
//! exclusion. The test columns vary with the flags the run was given, so they
//! are read from the header rather than assumed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::patterns::{integer, number, Variant, NUM};
use super::LogText;
use crate::error::{ExtractError, Field};

/// One test column for one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyTest {
    /// Column name as printed, e.g. `p-AU`.
    pub name: String,
    pub score: f64,
    /// The tree lies in the test's confidence set (`+`).
    pub in_confidence_set: bool,
}

/// Test results for one user tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeTestResult {
    /// 1-based position in the tested tree file.
    pub tree: u64,
    pub log_likelihood: f64,
    /// Likelihood difference from the best tree in the set.
    pub delta_log_likelihood: f64,
    pub tests: Vec<TopologyTest>,
    /// No test rejected the tree.
    pub plausible: bool,
}

impl TreeTestResult {
    /// Result of the named test column, if the report has it.
    pub fn test(&self, name: &str) -> Option<&TopologyTest> {
        self.tests.iter().find(|t| t.name == name)
    }
}

struct Row {
    tree: u64,
    log_likelihood: f64,
    delta: f64,
    scores: Vec<(f64, bool)>,
}

static SCORE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"({NUM})\s*([+-])")).expect("score pattern must compile")
});

static HEADER: LazyLock<Vec<Variant<Vec<String>>>> = LazyLock::new(|| {
    vec![Variant::new(
        r"^\s*Tree\s+logL\s+deltaL((?:\s+[A-Za-z][\w-]*)*)\s*$",
        |c| {
            let names = c.get(1)?.as_str().split_whitespace();
            Some(names.map(str::to_string).collect())
        },
    )]
});

static ROW: LazyLock<Vec<Variant<Row>>> = LazyLock::new(|| {
    vec![Variant::new(
        r"^\s*(\d+)\s+({NUM})\s+({NUM})((?:\s+{NUM}\s*[+-])*)\s*$",
        |c| {
            let scores = SCORE_PAIR
                .captures_iter(c.get(4)?.as_str())
                .map(|pair| Some((number(&pair, 1)?, &pair[2] == "+")))
                .collect::<Option<Vec<_>>>()?;
            Some(Row {
                tree: integer(c, 1)?,
                log_likelihood: number(c, 2)?,
                delta: number(c, 3)?,
                scores,
            })
        },
    )]
});

/// Parse the `USER TREES` table. Rows are returned in table order.
///
/// Fails when the section or its header is missing, when no row follows
/// the header, or when a row's test count disagrees with the header.
pub fn significance_tests(report: &LogText) -> Result<Vec<TreeTestResult>, ExtractError> {
    let missing = || report.missing(Field::UserTrees);

    let mut lines = report
        .text()
        .lines()
        .skip_while(|line| line.trim() != "USER TREES");
    lines.next().ok_or_else(missing)?;

    let columns = lines
        .by_ref()
        .find_map(|line| HEADER.iter().find_map(|v| v.apply(line)))
        .ok_or_else(missing)?;

    let mut results = Vec::new();
    for line in lines.skip_while(|line| line.trim().is_empty() || line.starts_with('-')) {
        let Some(row) = ROW.iter().find_map(|v| v.apply(line)) else {
            break;
        };
        if row.scores.len() != columns.len() {
            return Err(missing());
        }
        let tests: Vec<TopologyTest> = columns
            .iter()
            .zip(row.scores)
            .map(|(name, (score, in_confidence_set))| TopologyTest {
                name: name.clone(),
                score,
                in_confidence_set,
            })
            .collect();
        results.push(TreeTestResult {
            tree: row.tree,
            log_likelihood: row.log_likelihood,
            delta_log_likelihood: row.delta,
            plausible: tests.iter().all(|t| t.in_confidence_set),
            tests,
        });
    }

    if results.is_empty() {
        return Err(missing());
    }
    Ok(results)
}

/// Trees no test rejected.
pub fn plausible_trees(results: &[TreeTestResult]) -> Vec<u64> {
    results
        .iter()
        .filter(|r| r.plausible)
        .map(|r| r.tree)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
ANALYSIS RESULTS

USER TREES
----------

See all.trees.trees for trees with branch lengths.

Tree      logL    deltaL  bp-RELL    p-KH     p-SH    p-WKH    p-WSH       c-ELW       p-AU
-------------------------------------------------------------------------------------------
  1 -21152.617       0   0.564 +  0.652 +      1 +  0.652 +  0.978 +     0.585 +    0.769 +
  2 -21156.912  4.2948   0.436 +  0.348 +  0.348 +  0.348 +  0.696 +     0.415 +    0.231 +
  3 -21189.245  36.628       0 - 0.0003 -  0.012 - 0.0003 -  0.008 -   5.06e-05 -  2.1e-05 -

deltaL  : logL difference from the maximal logl in the set.
Plus signs denote the 95% confidence sets.
";

    #[test]
    fn test_parses_every_row_and_column() {
        let results = significance_tests(&LogText::new("tests.iqtree", REPORT)).unwrap();
        assert_eq!(results.len(), 3);

        let first = &results[0];
        assert_eq!(first.tree, 1);
        assert_eq!(first.log_likelihood, -21152.617);
        assert_eq!(first.delta_log_likelihood, 0.0);
        assert_eq!(first.tests.len(), 7);
        assert_eq!(first.test("p-SH").unwrap().score, 1.0);
        assert!(first.plausible);

        let third = &results[2];
        assert_eq!(third.delta_log_likelihood, 36.628);
        let au = third.test("p-AU").unwrap();
        assert_eq!(au.score, 2.1e-05);
        assert!(!au.in_confidence_set);
        assert!(!third.plausible);

        assert_eq!(plausible_trees(&results), vec![1, 2]);
    }

    #[test]
    fn test_one_rejection_makes_tree_implausible() {
        let report = "\
USER TREES
Tree      logL    deltaL  bp-RELL    p-KH
-----------------------------------------
  1 -100.5       0   0.9 +  0.9 +
  2 -101.5       1   0.1 +  0.02 -
";
        let results = significance_tests(&LogText::new("r.iqtree", report)).unwrap();
        assert_eq!(results[0].tests.len(), 2);
        assert!(results[0].plausible);
        assert!(!results[1].plausible);
        assert!(results[1].test("bp-RELL").unwrap().in_confidence_set);
        assert!(results[1].test("p-AU").is_none());
    }

    #[test]
    fn test_result_serializes_with_named_tests() {
        let results = significance_tests(&LogText::new("tests.iqtree", REPORT)).unwrap();
        let json = serde_json::to_value(&results[2]).unwrap();
        assert_eq!(json["tree"], 3);
        assert_eq!(json["plausible"], false);
        assert_eq!(json["tests"][6]["name"], "p-AU");
        assert_eq!(json["tests"][6]["in_confidence_set"], false);
    }

    #[test]
    fn test_missing_section_fails() {
        let err = significance_tests(&LogText::new("r.iqtree", "ANALYSIS RESULTS\n")).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::UserTrees));
    }

    #[test]
    fn test_empty_table_fails() {
        let report = "USER TREES\nTree      logL    deltaL  p-KH\n------\n\nPlus signs\n";
        let err = significance_tests(&LogText::new("r.iqtree", report)).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::UserTrees));
    }

    #[test]
    fn test_column_count_mismatch_fails() {
        let report = "\
USER TREES
Tree      logL    deltaL  bp-RELL    p-KH
-----------------------------------------
  1 -100.5       0   0.9 +
";
        let err = significance_tests(&LogText::new("r.iqtree", report)).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::UserTrees));
    }
}
