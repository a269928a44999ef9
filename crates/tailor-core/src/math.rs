//! Shared math utilities.

/// L2-normalize a vector in place so its magnitude is 1.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// L2-normalize a slice, returning a new vector with unit magnitude.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    l2_normalize_in_place(&mut result);
    result
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
/// Reference and query embeddings are stored unit-norm, but the division is
/// kept so hand-built vectors compare correctly too.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Highest cosine similarity between `query` and any vector in `set`.
///
/// `None` for an empty set.
pub fn max_cosine_similarity(query: &[f32], set: &[Vec<f32>]) -> Option<f32> {
    set.iter()
        .map(|v| cosine_similarity(query, v))
        .fold(None, |best, s| match best {
            Some(b) if b >= s => Some(b),
            _ => Some(s),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let v = l2_normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let v = [0.2, -0.4, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_or_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_max_similarity_takes_best_exemplar() {
        let set = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![-1.0, 0.0]];
        let best = max_cosine_similarity(&[1.0, 0.0], &set).unwrap();
        assert!((best - 1.0).abs() < 1e-6);
        assert_eq!(max_cosine_similarity(&[1.0, 0.0], &[]), None);
    }
}
