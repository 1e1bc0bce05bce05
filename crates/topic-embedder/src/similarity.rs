fn l2(vec: &[f32]) -> f32 {
    vec.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let norm = l2(&vec);
    if norm > 0.0 && norm.is_finite() {
        for value in vec.iter_mut() {
            *value /= norm;
        }
    }
    vec
}

/// Cosine similarity in [-1, 1]. Mismatched lengths compare the shared prefix; a zero
/// vector on either side scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2(a);
    let norm_b = l2(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let len = a.len().min(b.len());
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let v = l2_normalize(vec![3.0, 4.0]);
        assert!((l2(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_stays_zero() {
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_of_known_angle() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.82, (1.0f32 - 0.82 * 0.82).sqrt()]);
        assert!((sim - 0.82).abs() < 1e-5);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }
}
