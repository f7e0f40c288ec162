//! Raw model output to probability distribution

use crate::error::{RecognizerError, Result};
use serde::{Deserialize, Serialize};

/// Number of digit classes
pub const NUM_CLASSES: usize = 10;

/// What a model's single output tensor holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Already a distribution, passed through unchanged
    Probabilities,
    /// Unnormalised scores that need a softmax
    Logits,
}

impl OutputKind {
    pub fn from_prob_flag(prob: bool) -> Self {
        if prob {
            OutputKind::Probabilities
        } else {
            OutputKind::Logits
        }
    }

    pub fn normalize(&self, raw: Vec<f32>) -> Result<ProbabilityVector> {
        let values = match self {
            OutputKind::Probabilities => raw,
            OutputKind::Logits => softmax(&raw),
        };
        ProbabilityVector::new(values)
    }
}

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating so large logits cannot overflow.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max_val = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max_val as f64).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.iter().map(|&e| (e / sum) as f32).collect()
}

/// One probability per digit class
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector {
    values: [f32; NUM_CLASSES],
}

impl ProbabilityVector {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        let values: [f32; NUM_CLASSES] = values
            .try_into()
            .map_err(|v: Vec<f32>| RecognizerError::shape_mismatch(NUM_CLASSES, v.len()))?;
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f32; NUM_CLASSES] {
        &self.values
    }

    pub fn get(&self, class: usize) -> f32 {
        self.values[class]
    }

    /// Largest probability in the vector
    pub fn top(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Lowest class index holding the top probability
    pub fn argmax(&self) -> usize {
        let top = self.top();
        self.values.iter().position(|&v| v == top).unwrap_or(0)
    }

    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let probs = softmax(&[1000.0, 1000.0, 990.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - probs[1]).abs() < 1e-7);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_softmax_shift_is_taken_in_double_precision() {
        let logits = [16_777_216.0f32, 1.0e-7, -3.5, 0.25];
        let max = logits[0] as f64;
        let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        let expected: Vec<f32> = exps.iter().map(|&e| (e / sum) as f32).collect();

        assert_eq!(softmax(&logits), expected);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_dominant_logit() {
        let mut logits = vec![0.0f32; 10];
        logits[9] = 10.0;
        let probs = OutputKind::Logits.normalize(logits).unwrap();
        assert_eq!(probs.argmax(), 9);
        assert!((probs.get(9) - 0.99959).abs() < 1e-4);
    }

    #[test]
    fn test_probabilities_pass_through() {
        let raw = vec![0.05, 0.05, 0.1, 0.1, 0.2, 0.2, 0.1, 0.1, 0.05, 0.05];
        let probs = OutputKind::Probabilities.normalize(raw.clone()).unwrap();
        assert_eq!(probs.values().to_vec(), raw);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = OutputKind::Probabilities.normalize(vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, RecognizerError::ShapeMismatch { expected: 10, actual: 3 }));
    }

    #[test]
    fn test_argmax_takes_lowest_tied_index() {
        let probs = ProbabilityVector::new(vec![0.1; 10]).unwrap();
        assert_eq!(probs.argmax(), 0);
        assert_eq!(probs.top(), 0.1);
    }

    #[test]
    fn test_output_kind_from_flag() {
        assert_eq!(OutputKind::from_prob_flag(true), OutputKind::Probabilities);
        assert_eq!(OutputKind::from_prob_flag(false), OutputKind::Logits);
    }
}
