//! Wave state tracking for Wave Function Collapse.
//!
//! The Wave tracks which states are still possible at each cell, along with
//! compatibility counts for constraint propagation and the running Shannon
//! statistics used by the entropy heuristic.
//!
//! The per-cell aggregates (`remaining`, `sum_of_weights`,
//! `sum_of_weight_log_weights`, `entropy`) are only ever updated
//! incrementally through [`Wave::remove`]; they are recomputed from scratch
//! on [`Wave::reset`] and nowhere else.

use crate::propagator::Propagator;
use crate::topology::{DIRECTIONS, OPPOSITE};
use crate::weights::WeightTable;

/// Possibility and statistics storage for every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    /// `data[cell * T + state]` = true if state is still possible at cell.
    data: Vec<bool>,

    /// `compatible[cell * T * 4 + state * 4 + direction]` = number of states
    /// still possible at the neighbor opposite `direction` that support
    /// `state`. When this reaches 0, the state becomes impossible.
    compatible: Vec<i32>,

    /// Number of remaining possible states per cell.
    sums_of_ones: Vec<usize>,

    sums_of_weights: Vec<f64>,
    sums_of_weight_log_weights: Vec<f64>,
    entropies: Vec<f64>,

    /// Number of cells
    length: usize,

    /// Number of states
    t: usize,
}

impl Wave {
    /// Allocate a wave for `length` cells and `t` states.
    ///
    /// Contents are meaningless until [`Wave::reset`] is called.
    pub fn new(length: usize, t: usize) -> Self {
        Self {
            data: vec![false; length * t],
            compatible: vec![0; length * t * DIRECTIONS],
            sums_of_ones: vec![0; length],
            sums_of_weights: vec![0.0; length],
            sums_of_weight_log_weights: vec![0.0; length],
            entropies: vec![0.0; length],
            length,
            t,
        }
    }

    /// Restore every cell to the fully unconstrained state.
    ///
    /// Counters are seeded from the opposite direction's static degree.
    pub fn reset(&mut self, propagator: &Propagator, weights: &WeightTable) {
        debug_assert_eq!(propagator.states(), self.t);
        debug_assert_eq!(weights.len(), self.t);

        let mut seed_counts = Vec::with_capacity(self.t * DIRECTIONS);
        for state in 0..self.t {
            for opp in OPPOSITE {
                seed_counts.push(propagator.degree(opp, state) as i32);
            }
        }

        self.data.fill(true);
        for chunk in self.compatible.chunks_exact_mut(self.t * DIRECTIONS) {
            chunk.copy_from_slice(&seed_counts);
        }
        self.sums_of_ones.fill(self.t);
        self.sums_of_weights.fill(weights.sum_of_weights());
        self.sums_of_weight_log_weights
            .fill(weights.sum_of_weight_log_weights());
        self.entropies.fill(weights.starting_entropy());
    }

    /// Clear `state` at `cell` and update the cell's aggregates.
    ///
    /// Zeroes the state's counters so it can no longer reach zero again.
    /// Returns the remaining count after removal.
    pub fn remove(&mut self, cell: usize, state: usize, weights: &WeightTable) -> usize {
        assert!(
            self.is_possible(cell, state),
            "state {} already banned at cell {}",
            state,
            cell
        );

        self.data[cell * self.t + state] = false;
        let base = (cell * self.t + state) * DIRECTIONS;
        self.compatible[base..base + DIRECTIONS].fill(0);

        self.sums_of_ones[cell] -= 1;
        self.sums_of_weights[cell] -= weights.weight(state);
        self.sums_of_weight_log_weights[cell] -= weights.weight_log_weight(state);

        let remaining = self.sums_of_ones[cell];
        let sum = self.sums_of_weights[cell];
        self.entropies[cell] = if remaining == 0 {
            0.0
        } else {
            sum.ln() - self.sums_of_weight_log_weights[cell] / sum
        };
        remaining
    }

    #[inline]
    pub fn is_possible(&self, cell: usize, state: usize) -> bool {
        self.data[cell * self.t + state]
    }

    #[inline]
    pub fn compatible(&self, cell: usize, state: usize, direction: usize) -> i32 {
        self.compatible[(cell * self.t + state) * DIRECTIONS + direction]
    }

    /// Decrement the compatible count and return the new value.
    #[inline]
    pub fn decrement_compatible(&mut self, cell: usize, state: usize, direction: usize) -> i32 {
        let idx = (cell * self.t + state) * DIRECTIONS + direction;
        self.compatible[idx] -= 1;
        self.compatible[idx]
    }

    /// Number of remaining possibilities at a cell.
    #[inline]
    pub fn remaining(&self, cell: usize) -> usize {
        self.sums_of_ones[cell]
    }

    #[inline]
    pub fn sum_of_weights(&self, cell: usize) -> f64 {
        self.sums_of_weights[cell]
    }

    #[inline]
    pub fn sum_of_weight_log_weights(&self, cell: usize) -> f64 {
        self.sums_of_weight_log_weights[cell]
    }

    #[inline]
    pub fn entropy(&self, cell: usize) -> f64 {
        self.entropies[cell]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of states T.
    pub fn states(&self) -> usize {
        self.t
    }

    /// Possibility bits of one cell.
    pub fn cell(&self, cell: usize) -> &[bool] {
        &self.data[cell * self.t..(cell + 1) * self.t]
    }

    /// All possible states at a cell.
    pub fn possible_states(&self, cell: usize) -> Vec<usize> {
        (0..self.t).filter(|&t| self.is_possible(cell, t)).collect()
    }

    /// Lowest-index possible state at a cell.
    pub fn first_possible(&self, cell: usize) -> Option<usize> {
        self.cell(cell).iter().position(|&b| b)
    }

    /// Any cell with 0 possibilities.
    pub fn has_contradiction(&self) -> bool {
        self.sums_of_ones.iter().any(|&s| s == 0)
    }

    /// All cells have exactly 1 possibility.
    pub fn is_collapsed(&self) -> bool {
        self.sums_of_ones.iter().all(|&s| s == 1)
    }
}
