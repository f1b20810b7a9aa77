//! Per-state weights and the entropy baseline derived from them.

use crate::error::ModelError;

/// Immutable weight table for T states.
///
/// Precomputes `w * ln(w)` per state and the "all states possible" baseline
/// that every cell starts from after a reset.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: Vec<f64>,
    weight_log_weights: Vec<f64>,
    sum_of_weights: f64,
    sum_of_weight_log_weights: f64,
    starting_entropy: f64,
}

impl WeightTable {
    pub fn new(weights: Vec<f64>) -> Result<Self, ModelError> {
        if weights.is_empty() {
            return Err(ModelError::EmptyWeights);
        }
        if let Some((state, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(ModelError::InvalidWeight { state, weight });
        }

        let weight_log_weights: Vec<f64> = weights.iter().map(|&w| w * w.ln()).collect();
        let sum_of_weights: f64 = weights.iter().sum();
        let sum_of_weight_log_weights: f64 = weight_log_weights.iter().sum();
        let starting_entropy = sum_of_weights.ln() - sum_of_weight_log_weights / sum_of_weights;

        Ok(Self {
            weights,
            weight_log_weights,
            sum_of_weights,
            sum_of_weight_log_weights,
            starting_entropy,
        })
    }

    /// Number of states T.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; construction rejects empty tables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn weight(&self, state: usize) -> f64 {
        self.weights[state]
    }

    #[inline]
    pub fn weight_log_weight(&self, state: usize) -> f64 {
        self.weight_log_weights[state]
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn sum_of_weights(&self) -> f64 {
        self.sum_of_weights
    }

    pub fn sum_of_weight_log_weights(&self) -> f64 {
        self.sum_of_weight_log_weights
    }

    pub fn starting_entropy(&self) -> f64 {
        self.starting_entropy
    }
}

/// Index drawn from `weights` given one uniform sample `r` in [0, 1).
///
/// Zero-weight entries are never returned while any weight is positive.
pub fn weighted_index(weights: &[f64], r: f64) -> usize {
    let sum: f64 = weights.iter().sum();
    let threshold = r * sum;

    let mut partial_sum = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        partial_sum += w;
        if partial_sum > threshold {
            return i;
        }
    }

    // Rounding left r * sum at the very top; take the last positive entry.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}
