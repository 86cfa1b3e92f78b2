//! Local TF-IDF scoring over index term statistics.
//!
//! `score = tf * (ln((N + 1) / (df + 1)) + 1)` where `N` is the number of
//! documents in the corpus with the field. Terms outside the configured
//! character-length window are dropped. Ties keep the index's term order.

use searchive_core::{defaults, TermStatistic, TermVector};

/// Term length window (in characters) for significance scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermLengthBounds {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for TermLengthBounds {
    fn default() -> Self {
        Self {
            min_chars: defaults::TERM_MIN_CHARS,
            max_chars: defaults::TERM_MAX_CHARS,
        }
    }
}

impl TermLengthBounds {
    pub fn contains(&self, term: &str) -> bool {
        let len = term.chars().count();
        len >= self.min_chars && len <= self.max_chars
    }
}

/// TF-IDF weight of one term.
pub fn tf_idf(term_freq: u64, doc_freq: u64, doc_count: u64) -> f64 {
    let idf = ((doc_count as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0;
    term_freq as f64 * idf
}

/// A term with its computed weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTerm {
    pub term: String,
    pub score: f64,
}

/// Score every in-bounds term, highest first.
pub fn score_terms(vector: &TermVector, bounds: TermLengthBounds) -> Vec<ScoredTerm> {
    let mut scored: Vec<ScoredTerm> = vector
        .terms
        .iter()
        .filter(|t| bounds.contains(&t.term))
        .map(|TermStatistic { term, term_freq, doc_freq }| ScoredTerm {
            term: term.clone(),
            score: tf_idf(*term_freq, *doc_freq, vector.doc_count),
        })
        .collect();

    // sort_by is stable: equal scores keep input order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// The `k` most significant terms.
pub fn top_terms(vector: &TermVector, k: usize, bounds: TermLengthBounds) -> Vec<String> {
    score_terms(vector, bounds)
        .into_iter()
        .take(k)
        .map(|s| s.term)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(term: &str, tf: u64, df: u64) -> TermStatistic {
        TermStatistic {
            term: term.to_string(),
            term_freq: tf,
            doc_freq: df,
        }
    }

    #[test]
    fn test_tf_idf_formula() {
        // N = 9, df = 4 => ln(10/5) + 1
        let expected = 3.0 * ((10.0f64 / 5.0).ln() + 1.0);
        assert!((tf_idf(3, 4, 9) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_term_in_every_document_still_scores_tf() {
        // df == N gives idf == 1.
        assert!((tf_idf(2, 10, 10) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rare_terms_outrank_common_terms() {
        let vector = TermVector {
            doc_count: 100,
            terms: vec![stat("common", 3, 90), stat("rare", 3, 1)],
        };
        assert_eq!(top_terms(&vector, 1, TermLengthBounds::default()), vec!["rare"]);
    }

    #[test]
    fn test_length_filter_uses_chars() {
        let vector = TermVector {
            doc_count: 10,
            terms: vec![
                stat("a", 5, 1),
                stat("문서", 2, 1),
                stat(&"x".repeat(31), 9, 1),
                stat(&"가".repeat(30), 1, 1),
            ],
        };
        let top = top_terms(&vector, 10, TermLengthBounds::default());
        assert_eq!(top, vec!["문서".to_string(), "가".repeat(30)]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let vector = TermVector {
            doc_count: 10,
            terms: vec![
                stat("beta", 1, 2),
                stat("alpha", 1, 2),
                stat("gamma", 2, 2),
                stat("delta", 1, 2),
            ],
        };
        let top = top_terms(&vector, 4, TermLengthBounds::default());
        assert_eq!(top, vec!["gamma", "beta", "alpha", "delta"]);
    }

    #[test]
    fn test_top_terms_truncates_to_k() {
        let vector = TermVector {
            doc_count: 5,
            terms: (0..10).map(|i| stat(&format!("term{i}"), i, 1)).collect(),
        };
        let top = top_terms(&vector, 3, TermLengthBounds::default());
        assert_eq!(top, vec!["term9", "term8", "term7"]);
    }

    #[test]
    fn test_empty_vector() {
        assert!(top_terms(&TermVector::default(), 5, TermLengthBounds::default()).is_empty());
    }
}
