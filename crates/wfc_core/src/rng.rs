//! Random sources for observation draws and selection jitter.
//!
//! - `StdRandom`: `rand::rngs::StdRng`
//! - `DotNetRandom`: `clr_random::CLRRandom`, the exact .NET `System.Random`
//!   sequence, so a seed yields the same draws as `new System.Random(seed)`
//!
//! Every run builds its own source from an `i32` seed; the parallel scan
//! builds one per worker with [`worker_seed`].

use std::fmt;
use std::str::FromStr;

use clr_random::CLRRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_core::SeedableRng as RandCoreSeedableRng;

use crate::error::ModelError;

/// Random source used by the solver.
///
/// The subset of the .NET `System.Random` surface the solver draws from.
pub trait WfcRng: Send {
    /// Returns a non-negative random integer in [0, i32::MAX).
    fn next_int(&mut self) -> i32;

    /// Returns a random integer in [0, max).
    fn next_int_max(&mut self, max: i32) -> i32;

    /// Returns a random double in [0.0, 1.0).
    fn next_double(&mut self) -> f64;
}

/// Seed for the selection worker `worker` of a run seeded with `seed`.
pub fn worker_seed(seed: i32, worker: usize) -> i32 {
    seed.wrapping_mul(397) ^ worker as i32
}

/// Standard Rust RNG wrapper using `rand::rngs::StdRng`.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create from an i32 seed (absolute value, like .NET).
    pub fn from_seed(seed: i32) -> Self {
        Self::from_u64_seed(seed.unsigned_abs() as u64)
    }

    pub fn from_u64_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl WfcRng for StdRandom {
    fn next_int(&mut self) -> i32 {
        self.rng.gen_range(0..i32::MAX)
    }

    fn next_int_max(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }

    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// .NET-compatible RNG wrapper using `clr_random::CLRRandom`.
///
/// Produces the same sequence as `new System.Random(seed)`.
pub struct DotNetRandom {
    rng: CLRRandom,
}

impl DotNetRandom {
    pub fn from_seed(seed: i32) -> Self {
        Self {
            rng: CLRRandom::from_seed(clr_random::Seed::from(seed)),
        }
    }
}

impl WfcRng for DotNetRandom {
    fn next_int(&mut self) -> i32 {
        self.rng.next_i32()
    }

    fn next_int_max(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        // .NET: (int)(Sample() * maxValue)
        (self.rng.next_f64() * max as f64) as i32
    }

    fn next_double(&mut self) -> f64 {
        self.rng.next_f64()
    }
}

/// Which random source a model builds for its runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RngKind {
    Std,
    #[default]
    DotNet,
}

impl RngKind {
    pub fn create(self, seed: i32) -> Box<dyn WfcRng> {
        match self {
            RngKind::Std => Box::new(StdRandom::from_seed(seed)),
            RngKind::DotNet => Box::new(DotNetRandom::from_seed(seed)),
        }
    }
}

impl FromStr for RngKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "std" => Ok(RngKind::Std),
            "dotnet" | ".net" => Ok(RngKind::DotNet),
            _ => Err(ModelError::UnknownRng(s.to_string())),
        }
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngKind::Std => write!(f, "std"),
            RngKind::DotNet => write!(f, "dotnet"),
        }
    }
}
