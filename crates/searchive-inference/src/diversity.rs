//! Similarity and diversity selection over candidate embeddings.

/// Cosine similarity; 0.0 when either vector has zero norm or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// How to pick a diverse subset from the candidates closest to the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diversity {
    /// Among the `candidates` most document-similar phrases, choose the
    /// `top_n` combination with the lowest pairwise similarity.
    MaxSum { candidates: usize },
    /// Maximal marginal relevance; `diversity` in 0..=1 trades relevance for diversity.
    Mmr { diversity: f32 },
}

/// Indices of the selected candidates, most document-similar first.
///
/// `doc_sims[i]` is candidate `i`'s similarity to the document and
/// `embeddings[i]` its vector.
pub fn select(
    doc_sims: &[f32],
    embeddings: &[Vec<f32>],
    top_n: usize,
    strategy: Diversity,
) -> Vec<usize> {
    let n = doc_sims.len().min(embeddings.len());
    if n == 0 || top_n == 0 {
        return Vec::new();
    }

    let mut by_relevance: Vec<usize> = (0..n).collect();
    by_relevance.sort_by(|&a, &b| doc_sims[b].total_cmp(&doc_sims[a]));

    if n <= top_n {
        return by_relevance;
    }

    let mut chosen = match strategy {
        Diversity::MaxSum { candidates } => {
            let pool: Vec<usize> = by_relevance
                .iter()
                .copied()
                .take(candidates.max(top_n))
                .collect();
            max_sum(&pool, embeddings, top_n)
        }
        Diversity::Mmr { diversity } => mmr(&by_relevance, doc_sims, embeddings, top_n, diversity),
    };
    chosen.sort_by(|&a, &b| doc_sims[b].total_cmp(&doc_sims[a]));
    chosen
}

/// Exhaustive search over `top_n`-combinations of `pool` for the least
/// mutually similar set. Ties keep the first combination found.
fn max_sum(pool: &[usize], embeddings: &[Vec<f32>], top_n: usize) -> Vec<usize> {
    let k = pool.len();
    let mut pair = vec![vec![0.0f32; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let s = cosine_similarity(&embeddings[pool[i]], &embeddings[pool[j]]);
            pair[i][j] = s;
            pair[j][i] = s;
        }
    }

    let mut combo: Vec<usize> = (0..top_n).collect();
    let mut best = combo.clone();
    let mut best_sum = f32::INFINITY;
    loop {
        let mut sum = 0.0f32;
        for (a, &i) in combo.iter().enumerate() {
            for &j in &combo[a + 1..] {
                sum += pair[i][j];
            }
        }
        if sum < best_sum {
            best_sum = sum;
            best.clone_from(&combo);
        }
        if !next_combination(&mut combo, k) {
            break;
        }
    }
    best.into_iter().map(|i| pool[i]).collect()
}

/// Advance `combo` to the next lexicographic combination of `0..k`.
fn next_combination(combo: &mut [usize], k: usize) -> bool {
    let r = combo.len();
    let mut i = r;
    while i > 0 {
        i -= 1;
        if combo[i] < k - r + i {
            combo[i] += 1;
            for j in (i + 1)..r {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

fn mmr(
    by_relevance: &[usize],
    doc_sims: &[f32],
    embeddings: &[Vec<f32>],
    top_n: usize,
    diversity: f32,
) -> Vec<usize> {
    let lambda = diversity.clamp(0.0, 1.0);
    let mut chosen = vec![by_relevance[0]];
    let mut remaining: Vec<usize> = by_relevance[1..].to_vec();

    while chosen.len() < top_n && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &c) in remaining.iter().enumerate() {
            let redundancy = chosen
                .iter()
                .map(|&s| cosine_similarity(&embeddings[c], &embeddings[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let score = (1.0 - lambda) * doc_sims[c] - lambda * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        chosen.push(remaining.remove(best_pos));
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_next_combination_enumerates_all() {
        let mut combo = vec![0, 1];
        let mut count = 1;
        while next_combination(&mut combo, 4) {
            count += 1;
        }
        assert_eq!(count, 6);
        assert_eq!(combo, vec![2, 3]);
    }

    #[test]
    fn test_select_fewer_candidates_than_requested() {
        let sims = [0.2, 0.9];
        let embs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let picked = select(&sims, &embs, 5, Diversity::MaxSum { candidates: 20 });
        assert_eq!(picked, vec![1, 0]);
    }

    // Candidates 0 and 1 are near-duplicates; diversity should keep only one.
    fn near_duplicate_fixture() -> (Vec<f32>, Vec<Vec<f32>>) {
        let embs = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.99, 0.01, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let sims = vec![0.95, 0.94, 0.6, 0.5];
        (sims, embs)
    }

    #[test]
    fn test_max_sum_avoids_near_duplicates() {
        let (sims, embs) = near_duplicate_fixture();
        let picked = select(&sims, &embs, 3, Diversity::MaxSum { candidates: 4 });
        assert_eq!(picked.len(), 3);
        assert!(picked.contains(&2) && picked.contains(&3));
        assert!(!(picked.contains(&0) && picked.contains(&1)));
    }

    #[test]
    fn test_mmr_avoids_near_duplicates() {
        let (sims, embs) = near_duplicate_fixture();
        let picked = select(&sims, &embs, 2, Diversity::Mmr { diversity: 0.7 });
        assert_eq!(picked, vec![0, 2]);
    }

    #[test]
    fn test_select_orders_by_relevance() {
        let (sims, embs) = near_duplicate_fixture();
        let picked = select(&sims, &embs, 3, Diversity::MaxSum { candidates: 4 });
        for w in picked.windows(2) {
            assert!(sims[w[0]] >= sims[w[1]]);
        }
    }
}
