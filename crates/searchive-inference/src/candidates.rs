//! Candidate phrase generation for embedding-based ranking.
//!
//! Text is split into word tokens of at least two characters, lower-cased,
//! and English stop words are removed. Candidates are the distinct n-grams
//! (default 1..=2 words) over the remaining token sequence, in first-seen
//! order.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use searchive_core::defaults;

/// Upper bound on candidates sent to the embedding model per document.
pub const MAX_CANDIDATES: usize = 400;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static regex"))
}

/// Common English function words excluded from candidates.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "however",
    "if", "in", "into", "is", "it", "its", "itself", "just", "least", "less", "may", "me",
    "might", "more", "most", "much", "must", "my", "myself", "neither", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "per", "rather", "same", "she", "should", "since", "so",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "though", "through", "thus", "to", "too",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "were", "what", "whatever",
    "when", "where", "whether", "which", "while", "who", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
}

/// N-gram window for candidate phrases, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

impl Default for NgramRange {
    fn default() -> Self {
        Self {
            min: defaults::RANKER_NGRAM_MIN,
            max: defaults::RANKER_NGRAM_MAX,
        }
    }
}

/// Lower-cased word tokens of `text` with stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let stop = stop_words();
    token_re()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !stop.contains(t.as_str()))
        .collect()
}

/// Distinct candidate phrases of `text`, first occurrence first, capped at `limit`.
pub fn candidate_phrases(text: &str, range: NgramRange, limit: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let min = range.min.max(1);
    let max = range.max.max(min);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for start in 0..tokens.len() {
        for n in min..=max {
            if start + n > tokens.len() {
                break;
            }
            let phrase = tokens[start..start + n].join(" ");
            if seen.insert(phrase.clone()) {
                out.push(phrase);
                if out.len() >= limit {
                    return out;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_single_chars() {
        let tokens = tokenize("The quick brown fox is a fast animal");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "fast", "animal"]);
    }

    #[test]
    fn test_tokenize_hangul() {
        let tokens = tokenize("안녕하세요. 이것은 테스트 문서입니다.");
        assert_eq!(tokens, vec!["안녕하세요", "이것은", "테스트", "문서입니다"]);
    }

    #[test]
    fn test_candidate_phrases_unigrams_and_bigrams() {
        let c = candidate_phrases("Rust async runtime", NgramRange::default(), 100);
        assert_eq!(
            c,
            vec!["rust", "rust async", "async", "async runtime", "runtime"]
        );
    }

    #[test]
    fn test_candidate_phrases_deduplicated() {
        let c = candidate_phrases("rust rust rust", NgramRange { min: 1, max: 1 }, 100);
        assert_eq!(c, vec!["rust"]);
    }

    #[test]
    fn test_candidate_phrases_limit() {
        let text = (0..50).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let c = candidate_phrases(&text, NgramRange::default(), 10);
        assert_eq!(c.len(), 10);
    }

    #[test]
    fn test_candidate_phrases_empty_text() {
        assert!(candidate_phrases("  . , ! ", NgramRange::default(), 10).is_empty());
    }
}
