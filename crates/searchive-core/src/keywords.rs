//! Keyword normalization shared by every extraction strategy and the tag catalog.

use std::collections::HashSet;

/// Normalize one keyword: trim, then lower-case. Returns `None` when empty.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Normalize and deduplicate keywords.
///
/// Empty entries are dropped. The first occurrence of each normalized form
/// wins, so the output keeps the input's ranking order.
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|k| normalize_keyword(k.as_ref()))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Rust "), Some("rust".to_string()));
        assert_eq!(normalize_keyword("   "), None);
        assert_eq!(normalize_keyword(""), None);
    }

    #[test]
    fn test_normalize_keywords_dedupes_after_normalizing() {
        let out = normalize_keywords(["Machine Learning", "machine learning ", "  ", "AI", "ai"]);
        assert_eq!(out, vec!["machine learning", "ai"]);
    }

    #[test]
    fn test_normalize_keywords_hangul_untouched() {
        let out = normalize_keywords([" 테스트 ", "문서", "테스트"]);
        assert_eq!(out, vec!["테스트", "문서"]);
    }

    #[test]
    fn test_normalized_output_invariants() {
        let out = normalize_keywords(["A", " b", "B ", "\tC\n", "", "a"]);
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
        for k in &out {
            assert_eq!(k, &k.trim().to_lowercase());
            assert!(!k.is_empty());
        }
    }
}
