//! Token-set fuzzy matching between queries and extracted titles.
//!
//! Filenames and catalog titles differ in punctuation, subtitle presence,
//! and word order, so plain edit distance over-penalizes good matches.
//! The token-set score tokenizes both sides, then compares the sorted
//! intersection against each side's full sorted token string, which makes
//! the score order-independent and tolerant of extra tokens.

use std::collections::BTreeSet;

/// Default acceptance threshold.
pub const DEFAULT_THRESHOLD: u8 = 80;

/// Decides whether an extracted title is an acceptable match for a query.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: u8,
}

impl FuzzyMatcher {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Accept when the token-set score reaches the threshold.
    pub fn accepts(&self, query: &str, candidate_title: &str) -> bool {
        let score = token_set_ratio(query, candidate_title);
        tracing::debug!(score, query, candidate_title, "fuzzy match score");
        score >= self.threshold
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Token-set score
// ---------------------------------------------------------------------------

/// Token-set similarity in the 0–100 range.
///
/// Both sides are lowercased and split on non-alphanumeric characters.
/// With `i` the sorted token intersection and `a`/`b` each side's sorted
/// full token string, the score is the best normalized-Levenshtein ratio
/// among (i, a), (i, b), and (a, b) — 100 whenever one token set contains
/// the other. Empty inputs score 0.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let intersection: Vec<&str> = tokens_a
        .intersection(&tokens_b)
        .map(String::as_str)
        .collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    let base = intersection.join(" ");
    let combined_a = join_parts(&base, &only_a);
    let combined_b = join_parts(&base, &only_b);

    let best = similarity(&base, &combined_a)
        .max(similarity(&base, &combined_b))
        .max(similarity(&combined_a, &combined_b));

    (best * 100.0).round() as u8
}

/// Lowercased tokens with punctuation stripped; BTreeSet keeps them sorted.
fn tokenize(s: &str) -> BTreeSet<String> {
    let mut cleaned = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().map(str::to_string).collect()
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{base} {}", rest.join(" "))
    }
}

fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(token_set_ratio("Harry Potter Stone", "Harry Potter Stone"), 100);
    }

    #[test]
    fn order_independent() {
        let reordered = token_set_ratio("Harry Potter Stone", "Stone, Harry Potter");
        let identical = token_set_ratio("Harry Potter Stone", "Harry Potter Stone");
        assert_eq!(reordered, identical);
    }

    #[test]
    fn subset_titles_score_100() {
        // Catalog titles often carry subtitles the filename lacks.
        assert_eq!(
            token_set_ratio("my book", "My Book: The Complete Edition"),
            100
        );
    }

    #[test]
    fn case_and_punctuation_ignored() {
        assert_eq!(token_set_ratio("the-great-gatsby", "The Great Gatsby!"), 100);
    }

    #[test]
    fn unrelated_titles_score_low() {
        assert!(token_set_ratio("Moby Dick", "Pride and Prejudice") < 50);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(token_set_ratio("", "anything"), 0);
        assert_eq!(token_set_ratio("something", "   "), 0);
    }

    #[test]
    fn matcher_threshold_boundary() {
        let matcher = FuzzyMatcher::new(80);
        assert!(matcher.accepts("Harry Potter Stone", "Stone Harry Potter"));
        assert!(!matcher.accepts("Moby Dick", "Pride and Prejudice"));

        // Threshold 0 accepts any non-empty pair, 101 would accept nothing;
        // config validation caps the threshold at 100.
        assert!(FuzzyMatcher::new(0).accepts("a", "b"));
    }

    #[test]
    fn works_on_non_ascii_titles() {
        assert_eq!(token_set_ratio("הנסיך הקטן", "הנסיך הקטן"), 100);
    }

    #[test]
    fn tolerates_repeated_spaces_from_normalization() {
        assert_eq!(token_set_ratio("My Book  2020", "My Book 2020"), 100);
    }
}
