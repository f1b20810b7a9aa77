//! Wave Function Collapse constraint solver.
//!
//! This crate provides:
//! - `Wave`: per-cell possibilities, support counters and entropy statistics
//! - `Propagator`: validated adjacency tables over 4 grid directions
//! - `Selector`: Entropy / MRV / Scanline cell selection, optionally parallel
//! - `WfcModel`: reset, observe, ban, propagate and the run loop
//!
//! The solver knows nothing about what a state means. Tile sets and image
//! output live in `wfc_samples`.

pub mod error;
pub mod heuristic;
pub mod model;
pub mod propagator;
pub mod rng;
pub mod topology;
pub mod wave;
pub mod weights;


pub use error::ModelError;
pub use heuristic::{Heuristic, Selector};
pub use model::{ModelConfig, RunOutcome, RunStats, SolverState, WfcModel};
pub use propagator::Propagator;
pub use rng::{worker_seed, DotNetRandom, RngKind, StdRandom, WfcRng};
pub use topology::{Topology, DIRECTIONS, DX, DY, OPPOSITE};
pub use wave::Wave;
pub use weights::{weighted_index, WeightTable};
