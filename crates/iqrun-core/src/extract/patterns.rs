//! Ordered fallback matching over log lines.
//!
//! Each statistic owns a list of [`Variant`]s, newest tool format first.
//! The list order is the format contract: add variants for newly observed
//! formats, do not reorder existing ones.

use regex::{Captures, Regex};

/// Decimal number as printed by the tool, tolerating a comma decimal
/// separator and exponent notation.
pub(crate) const NUM: &str = r"[-+]?(?:\d+(?:[.,]\d+)?|[.,]\d+)(?:[eE][-+]?\d+)?";

/// One known phrasing of a statistic.
pub(crate) struct Variant<T> {
    regex: Regex,
    extract: fn(&Captures<'_>) -> Option<T>,
}

impl<T> Variant<T> {
    /// `pattern` may contain `{NUM}`, which is replaced by [`NUM`].
    pub(crate) fn new(pattern: &str, extract: fn(&Captures<'_>) -> Option<T>) -> Self {
        let pattern = pattern.replace("{NUM}", NUM);
        Self {
            regex: Regex::new(&pattern).expect("log pattern must compile"),
            extract,
        }
    }

    pub(crate) fn apply(&self, line: &str) -> Option<T> {
        self.regex.captures(line).and_then(|c| (self.extract)(&c))
    }
}

/// Highest-priority variant wins; within a variant the earliest line wins.
pub(crate) fn first_match<T>(variants: &[Variant<T>], text: &str) -> Option<T> {
    variants
        .iter()
        .find_map(|v| text.lines().find_map(|line| v.apply(line)))
}

/// Highest-priority variant wins; within a variant the latest line wins.
pub(crate) fn last_match<T>(variants: &[Variant<T>], text: &str) -> Option<T> {
    variants
        .iter()
        .find_map(|v| text.lines().rev().find_map(|line| v.apply(line)))
}

/// Latest line matching any variant wins; on that line the highest-priority
/// variant wins.
pub(crate) fn latest_match<T>(variants: &[Variant<T>], text: &str) -> Option<T> {
    text.lines()
        .rev()
        .find_map(|line| variants.iter().find_map(|v| v.apply(line)))
}

/// Every matching line in file order. A line contributes at most one value,
/// taken from the highest-priority variant that matches it.
pub(crate) fn all_matches<T>(variants: &[Variant<T>], text: &str) -> Vec<T> {
    text.lines()
        .filter_map(|line| variants.iter().find_map(|v| v.apply(line)))
        .collect()
}

/// Parse a [`NUM`] capture.
pub(crate) fn number(caps: &Captures<'_>, group: usize) -> Option<f64> {
    let raw = caps.get(group)?.as_str().replace(',', ".");
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an unsigned integer capture.
pub(crate) fn integer(caps: &Captures<'_>, group: usize) -> Option<u64> {
    caps.get(group)?.as_str().parse::<u64>().ok()
}

/// Parse a percentage capture into a fraction in `[0, 1]`.
pub(crate) fn percent_fraction(caps: &Captures<'_>, group: usize) -> Option<f64> {
    number(caps, group)
        .filter(|p| (0.0..=100.0).contains(p))
        .map(|p| p / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<Variant<f64>> {
        vec![
            Variant::new(r"New score:\s*({NUM})", |c| number(c, 1)),
            Variant::new(r"Score:\s*({NUM})", |c| number(c, 1)),
        ]
    }

    #[test]
    fn test_first_match_prefers_variant_order() {
        let text = "Score: 1.0\nNew score: 2.0\nScore: 3.0\n";
        assert_eq!(first_match(&variants(), text), Some(2.0));
    }

    #[test]
    fn test_last_match_scans_backward_within_variant() {
        let text = "Score: 1.0\nScore: 3.0\n";
        assert_eq!(last_match(&variants(), text), Some(3.0));
    }

    #[test]
    fn test_latest_match_prefers_later_line_over_variant_order() {
        let text = "New score: 2.0\nScore: 3.0\nnoise\n";
        assert_eq!(latest_match(&variants(), text), Some(3.0));
        assert_eq!(last_match(&variants(), text), Some(2.0));
    }

    #[test]
    fn test_all_matches_one_value_per_line() {
        let text = "Score: 1.0\nnoise\nNew score: 2.0\nScore: 3.0\n";
        assert_eq!(all_matches(&variants(), text), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_number_accepts_comma_and_exponent() {
        let re = Regex::new(&format!("v=({NUM})")).unwrap();
        let caps = re.captures("v=12,5").unwrap();
        assert_eq!(number(&caps, 1), Some(12.5));
        let caps = re.captures("v=-1.5e3").unwrap();
        assert_eq!(number(&caps, 1), Some(-1500.0));
    }

    #[test]
    fn test_percent_fraction_rejects_out_of_range() {
        let re = Regex::new(&format!("({NUM})%")).unwrap();
        let caps = re.captures("150%").unwrap();
        assert_eq!(percent_fraction(&caps, 1), None);
        let caps = re.captures("12.5%").unwrap();
        assert_eq!(percent_fraction(&caps, 1), Some(0.125));
    }
}
