use ndarray::{Array1, ArrayView1};

/// Normalizes `logits` into a probability vector.
///
/// The maximum is subtracted before exponentiating so large logits don't overflow.
pub fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn sums_to_one() {
        let p = softmax(array![1.0, 2.0, 3.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn large_logits_stay_finite() {
        let p = softmax(array![1000.0, 1000.0].view());
        assert_eq!(p, array![0.5, 0.5]);
    }
}
