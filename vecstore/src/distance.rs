/// Compute the squared Euclidean (L2²) distance between two vectors.
///
/// Monotone in the true L2 distance, so rankings are identical while the
/// square root is skipped per comparison.
///
/// Uses f64 intermediate precision. Returns `f32::INFINITY` on dimension
/// mismatch so a malformed vector can never rank as a close match.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    let mut sum: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let d = x as f64 - y as f64;
        sum += d * d;
    }
    sum as f32
}

/// Compute the Euclidean (L2) distance between two vectors.
pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    squared_l2(a, b).sqrt()
}
