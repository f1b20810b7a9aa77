//! Configuration errors for the solver.
//!
//! A contradiction during a run is not an error; it is reported through
//! [`RunOutcome`](crate::model::RunOutcome). The variants here describe
//! inputs the solver refuses to start with.

use std::fmt;

/// Error type for model construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Width, height or window size is zero
    InvalidDimensions {
        width: usize,
        height: usize,
        n: usize,
    },
    /// The weight table has no states
    EmptyWeights,
    /// A weight is zero, negative, or not finite
    InvalidWeight { state: usize, weight: f64 },
    /// Propagator does not have T entries in some direction
    PropagatorShape {
        direction: usize,
        expected: usize,
        found: usize,
    },
    /// Propagator references a state index >= T
    StateOutOfRange { direction: usize, state: usize },
    /// `t2` is allowed next to `t1` in `direction` but not the other way around
    AsymmetricPropagator {
        direction: usize,
        from: usize,
        to: usize,
    },
    /// Weight table and propagator disagree on the number of states
    StateCountMismatch { weights: usize, propagator: usize },
    /// Unknown heuristic name
    UnknownHeuristic(String),
    /// Unknown random source name
    UnknownRng(String),
    /// The selection worker pool could not be created
    WorkerPool(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidDimensions { width, height, n } => write!(
                f,
                "invalid dimensions {}x{} with window size {}",
                width, height, n
            ),
            ModelError::EmptyWeights => write!(f, "weight table is empty"),
            ModelError::InvalidWeight { state, weight } => {
                write!(f, "weight {} of state {} is not positive", weight, state)
            }
            ModelError::PropagatorShape {
                direction,
                expected,
                found,
            } => write!(
                f,
                "propagator direction {} has {} entries, expected {}",
                direction, found, expected
            ),
            ModelError::StateOutOfRange { direction, state } => write!(
                f,
                "propagator direction {} references unknown state {}",
                direction, state
            ),
            ModelError::AsymmetricPropagator {
                direction,
                from,
                to,
            } => write!(
                f,
                "propagator allows {} -> {} in direction {} but not the reverse",
                from, to, direction
            ),
            ModelError::StateCountMismatch {
                weights,
                propagator,
            } => write!(
                f,
                "{} weights given for a propagator over {} states",
                weights, propagator
            ),
            ModelError::UnknownHeuristic(name) => write!(f, "unknown heuristic: {}", name),
            ModelError::UnknownRng(name) => write!(f, "unknown random source: {}", name),
            ModelError::WorkerPool(msg) => write!(f, "worker pool error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}
