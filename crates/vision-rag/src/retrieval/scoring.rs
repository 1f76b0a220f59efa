//! Late-interaction (MaxSim) scoring over multi-vector embeddings

use crate::types::SearchResult;

use super::store::PageEmbedding;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sum over query vectors of the best dot product against any page vector
pub fn maxsim(query: &[Vec<f32>], page: &[Vec<f32>]) -> f32 {
    query
        .iter()
        .map(|q| {
            page.iter()
                .map(|p| dot(q, p))
                .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
                .unwrap_or(0.0)
        })
        .sum()
}

/// Score every page and keep the `k` best
///
/// Ties fall back to (doc_id, page_num) so a fixed index always yields the
/// same ordering.
pub fn rank_pages(query: &[Vec<f32>], pages: &[PageEmbedding], k: usize) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = pages
        .iter()
        .map(|page| SearchResult {
            doc_id: page.doc_id,
            page_num: page.page_num,
            score: maxsim(query, &page.vectors),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
            .then_with(|| a.page_num.cmp(&b.page_num))
    });
    results.truncate(k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(doc_id: u32, page_num: u32, vectors: Vec<Vec<f32>>) -> PageEmbedding {
        PageEmbedding {
            doc_id,
            page_num,
            vectors,
        }
    }

    #[test]
    fn test_maxsim_takes_best_match_per_query_token() {
        let query = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let page_vectors = vec![vec![0.5, 0.0], vec![0.9, 0.1], vec![0.0, 0.7]];
        let score = maxsim(&query, &page_vectors);
        assert!((score - (0.9 + 0.7)).abs() < 1e-6);
    }

    #[test]
    fn test_maxsim_empty_page_scores_zero() {
        assert_eq!(maxsim(&[vec![1.0]], &[]), 0.0);
    }

    #[test]
    fn test_rank_pages_orders_and_truncates() {
        let query = vec![vec![1.0, 0.0]];
        let pages = vec![
            page(0, 1, vec![vec![0.2, 0.0]]),
            page(0, 2, vec![vec![0.9, 0.0]]),
            page(1, 1, vec![vec![0.5, 0.0]]),
        ];

        let ranked = rank_pages(&query, &pages, 2);
        let order: Vec<(u32, u32)> = ranked.iter().map(|r| (r.doc_id, r.page_num)).collect();
        assert_eq!(order, vec![(0, 2), (1, 1)]);
    }

    #[test]
    fn test_rank_pages_ties_are_stable() {
        let query = vec![vec![1.0]];
        let pages = vec![
            page(1, 2, vec![vec![0.5]]),
            page(0, 3, vec![vec![0.5]]),
            page(1, 1, vec![vec![0.5]]),
        ];

        let ranked = rank_pages(&query, &pages, 3);
        let order: Vec<(u32, u32)> = ranked.iter().map(|r| (r.doc_id, r.page_num)).collect();
        assert_eq!(order, vec![(0, 3), (1, 1), (1, 2)]);
    }
}
