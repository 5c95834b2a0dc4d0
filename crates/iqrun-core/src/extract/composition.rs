//! Alignment composition: distinct patterns, gap fraction, invariant fraction.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::patterns::{first_match, integer, percent_fraction, Variant};
use super::LogText;
use crate::error::{ExtractError, Field};

/// Composition summary of the input alignment as reported by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentComposition {
    /// Number of distinct alignment patterns.
    pub pattern_count: u64,
    /// Fraction of gap/ambiguous characters, in `[0, 1]`.
    pub gap_fraction: f64,
    /// Fraction of invariant (constant) sites, in `[0, 1]`.
    pub invariant_fraction: f64,
}

/// (pattern count, total columns if the same line reports them)
static PATTERNS: LazyLock<Vec<Variant<(u64, Option<u64>)>>> = LazyLock::new(|| {
    vec![
        // Alignment sites / patterns: 1940 / 933
        Variant::new(r"(?i)sites\s*/\s*patterns\s*:\s*(\d+)\s*/\s*(\d+)", |c| {
            Some((integer(c, 2)?, integer(c, 1)))
        }),
        // Alignment has 26 sequences with 430 columns, 355 distinct patterns
        Variant::new(r"(?i)(\d+)\s+columns?\s*,\s*(\d+)\s+distinct\s+patterns", |c| {
            Some((integer(c, 2)?, integer(c, 1)))
        }),
        Variant::new(r"(?i)(\d+)\s+distinct\s+patterns", |c| Some((integer(c, 1)?, None))),
    ]
});

static COLUMNS: LazyLock<Vec<Variant<u64>>> = LazyLock::new(|| {
    vec![Variant::new(r"(?i)\bwith\s+(\d+)\s+columns\b", |c| integer(c, 1))]
});

static GAPS: LazyLock<Vec<Variant<f64>>> = LazyLock::new(|| {
    vec![
        // Gaps: 12.5%
        Variant::new(r"^\s*Gaps\s*:\s*({NUM})\s*%?", |c| percent_fraction(c, 1)),
        // ****  TOTAL    41.55%  ...
        Variant::new(r"^\s*\*+\s*TOTAL\b.*?({NUM})\s*%", |c| percent_fraction(c, 1)),
        // Overall gap/ambiguity: 41.55%
        Variant::new(
            r"(?i)overall\s+gap(?:\s*/\s*ambiguity)?\s*:\s*({NUM})\s*%",
            |c| percent_fraction(c, 1),
        ),
    ]
});

static INVARIANT_PERCENT: LazyLock<Vec<Variant<f64>>> = LazyLock::new(|| {
    vec![
        // Invariant sites: 45.2%   /   Constant sites: 45.2%
        Variant::new(r"^\s*(?:Invariant|Constant)\s+sites\s*:\s*({NUM})\s*%", |c| {
            percent_fraction(c, 1)
        }),
        // Number of constant sites: 127 (= 29.5349% of all sites)
        Variant::new(
            r"(?i)number\s+of\s+(?:constant|invariant)\s+sites\s*:\s*\d+\s*\(\s*=\s*({NUM})\s*%",
            |c| percent_fraction(c, 1),
        ),
    ]
});

static INVARIANT_COUNT: LazyLock<Vec<Variant<u64>>> = LazyLock::new(|| {
    // 243 parsimony-informative, 60 singleton sites, 127 constant sites
    vec![Variant::new(r"(?i)(\d+)\s+(?:constant|invariant)\s+sites", |c| integer(c, 1))]
});

/// Extract pattern count, gap fraction and invariant fraction.
///
/// All three must resolve; the error names the first one that did not.
pub fn alignment_composition(log: &LogText) -> Result<AlignmentComposition, ExtractError> {
    let text = log.text();

    let (pattern_count, columns) =
        first_match(&PATTERNS, text).ok_or_else(|| log.missing(Field::Patterns))?;
    let columns = columns.or_else(|| first_match(&COLUMNS, text));

    let gap_fraction = first_match(&GAPS, text).ok_or_else(|| log.missing(Field::Gaps))?;

    let invariant_fraction = first_match(&INVARIANT_PERCENT, text)
        .or_else(|| {
            let constant = first_match(&INVARIANT_COUNT, text)?;
            let columns = columns.filter(|n| *n > 0 && constant <= *n)?;
            Some(constant as f64 / columns as f64)
        })
        .ok_or_else(|| log.missing(Field::InvariantSites))?;

    Ok(AlignmentComposition {
        pattern_count,
        gap_fraction,
        invariant_fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_legacy_summary_lines() {
        let log = LogText::new(
            "parse.log",
            "Alignment sites / patterns: 1940 / 933\nGaps: 12.5%\nInvariant sites: 45.2%\n",
        );
        let comp = alignment_composition(&log).unwrap();
        assert_eq!(comp.pattern_count, 933);
        assert!(close(comp.gap_fraction, 0.125));
        assert!(close(comp.invariant_fraction, 0.452));
    }

    #[test]
    fn test_v3_counts_and_total_row() {
        let text = "\
Alignment has 26 sequences with 430 columns, 355 distinct patterns
243 parsimony-informative, 60 singleton sites, 127 constant sites
                           Gap/Ambiguity  Composition  p-value
   1  taxon_a                      12.33%    passed     91.23%
****  TOTAL                        41.55%  2 sequences failed composition chi2 test (p-value<5%; df=3)
";
        let comp = alignment_composition(&LogText::new("parse.log", text)).unwrap();
        assert_eq!(comp.pattern_count, 355);
        assert!(close(comp.gap_fraction, 0.4155));
        assert!(close(comp.invariant_fraction, 127.0 / 430.0));
    }

    #[test]
    fn test_overall_gap_fallback() {
        let text = "\
Alignment has 4 sequences with 100 columns, 20 distinct patterns
Constant sites: 50%
Overall gap/ambiguity: 3,5%
";
        let comp = alignment_composition(&LogText::new("parse.log", text)).unwrap();
        assert!(close(comp.gap_fraction, 0.035));
        assert!(close(comp.invariant_fraction, 0.5));
    }

    #[test]
    fn test_percentage_preferred_over_count() {
        let text = "\
Alignment sites / patterns: 200 / 50
Gaps: 0%
100 constant sites
Invariant sites: 25%
";
        let comp = alignment_composition(&LogText::new("parse.log", text)).unwrap();
        assert!(close(comp.invariant_fraction, 0.25));
    }

    #[test]
    fn test_columns_from_separate_line() {
        let text = "\
Alignment has 10 sequences with 80 columns
40 distinct patterns
Gaps: 1%
20 constant sites
";
        let comp = alignment_composition(&LogText::new("parse.log", text)).unwrap();
        assert_eq!(comp.pattern_count, 40);
        assert!(close(comp.invariant_fraction, 0.25));
    }

    #[test]
    fn test_missing_gaps_names_gaps() {
        let log = LogText::new(
            "parse.log",
            "Alignment sites / patterns: 1940 / 933\nInvariant sites: 45.2%\n",
        );
        let err = alignment_composition(&log).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::Gaps));
        assert!(err.to_string().contains("gaps"));
    }

    #[test]
    fn test_missing_patterns() {
        let log = LogText::new("parse.log", "Gaps: 1%\nInvariant sites: 2%\n");
        let err = alignment_composition(&log).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::Patterns));
    }

    #[test]
    fn test_constant_count_without_columns_fails() {
        let text = "40 distinct patterns\nGaps: 1%\n20 constant sites\n";
        let err = alignment_composition(&LogText::new("parse.log", text)).unwrap_err();
        assert_eq!(err.missing_field(), Some(Field::InvariantSites));
    }
}
