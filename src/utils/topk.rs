//! Helpers for turning classifier output into labels and confidences.

use crate::core::{DigitError, DigitResult};
use ndarray::{Array2, ArrayView1, Axis};

/// Tolerance used when checking that a probability row sums to one.
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// Index and value of the largest score. Ties resolve to the lowest index.
/// Returns `None` for an empty row.
pub fn argmax(scores: ArrayView1<'_, f32>) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((idx, value)),
        })
}

/// Applies a numerically stable softmax to every row in place.
pub fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
}

/// Checks that `probs` has `rows` rows of `classes` finite, non-negative
/// values each summing to one. Violations are reported as inference errors
/// against `model_name`.
pub fn validate_probabilities(
    model_name: &str,
    probs: &Array2<f32>,
    rows: usize,
    classes: usize,
) -> DigitResult<()> {
    let (actual_rows, actual_classes) = probs.dim();
    if actual_rows != rows || actual_classes != classes {
        return Err(DigitError::inference(
            model_name,
            format!(
                "expected output of shape [{rows}, {classes}], got [{actual_rows}, {actual_classes}]"
            ),
        ));
    }

    for (idx, row) in probs.axis_iter(Axis(0)).enumerate() {
        if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(DigitError::inference(
                model_name,
                format!("row {idx} is not a probability vector: {row}"),
            ));
        }
        let sum = row.sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(DigitError::inference(
                model_name,
                format!("row {idx} sums to {sum}, expected 1"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn test_argmax() {
        let scores = array![0.1f32, 0.7, 0.2];
        assert_eq!(argmax(scores.view()), Some((1, 0.7)));

        let tie = array![0.5f32, 0.5];
        assert_eq!(argmax(tie.view()), Some((0, 0.5)));

        let empty = Array1::<f32>::zeros(0);
        assert_eq!(argmax(empty.view()), None);
    }

    #[test]
    fn test_softmax_rows() {
        let mut logits = array![[1.0f32, 2.0, 3.0], [1000.0, 1000.0, 1000.0]];
        softmax_rows(&mut logits);

        for row in logits.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        assert!(logits[[0, 2]] > logits[[0, 1]] && logits[[0, 1]] > logits[[0, 0]]);
        assert!((logits[[1, 0]] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_probabilities() {
        let good = array![[0.25f32, 0.75], [1.0, 0.0]];
        assert!(validate_probabilities("stub", &good, 2, 2).is_ok());

        assert!(validate_probabilities("stub", &good, 3, 2).is_err());
        assert!(validate_probabilities("stub", &good, 2, 10).is_err());

        let negative = array![[1.5f32, -0.5]];
        assert!(validate_probabilities("stub", &negative, 1, 2).is_err());

        let not_normalized = array![[0.2f32, 0.2]];
        assert!(validate_probabilities("stub", &not_normalized, 1, 2).is_err());

        let nan = array![[f32::NAN, 1.0]];
        assert!(validate_probabilities("stub", &nan, 1, 2).is_err());
    }
}
