use crate::matrix::EmbeddingMatrix;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero-norm or mismatched inputs score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot(a, b) / denom
    }
}

/// Scores every row against `query` and returns `(row, similarity)` for the
/// best `top_k`, descending. `top_k` is clamped to `[1, row_count]`; equal
/// scores keep row order, so the lower index wins a tie.
pub fn rank(query: &[f32], matrix: &EmbeddingMatrix, top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = matrix
        .rows()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let k = top_k.clamp(1, scored.len().max(1));
    scored.truncate(k);

    tracing::debug!(rows = matrix.row_count(), k, best = ?scored.first(), "ranked");
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f32>>) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(rows).expect("matrix")
    }

    #[test]
    fn cosine_works_for_unit_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_symmetric_and_self_similar() {
        let a = vec![0.3, -1.2, 4.0, 0.5];
        let b = vec![2.0, 0.1, -0.7, 1.1];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn zero_norm_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn rank_orders_by_descending_similarity() {
        let m = matrix(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
            vec![-1.0, 0.0],
        ]);
        let ranked = rank(&[1.0, 0.1], &m, 3);

        let indices: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 0]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn rank_clamps_top_k() {
        let m = matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);

        assert_eq!(rank(&[1.0, 0.0], &m, 0).len(), 1);
        assert_eq!(rank(&[1.0, 0.0], &m, 2).len(), 2);

        let all = rank(&[1.0, 0.0], &m, 50);
        let mut indices: Vec<usize> = all.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices.len(), 3);
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 3);
    }

    #[test]
    fn ties_go_to_the_lower_row() {
        let m = matrix(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![1.0, 0.0],
        ]);
        let ranked = rank(&[1.0, 0.0], &m, 3);

        let indices: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
