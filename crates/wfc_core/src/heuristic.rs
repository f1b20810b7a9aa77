//! Next-cell selection.
//!
//! Three policies pick the next undetermined cell:
//! - `Scanline`: row-major order from a monotonic cursor
//! - `Mrv`: fewest remaining states
//! - `Entropy`: lowest Shannon entropy of the remaining weights
//!
//! MRV and Entropy add `1e-6 * U(0,1)` jitter to break ties. With more than
//! one worker the scan is split into contiguous chunks, each scanned with its
//! own seeded random source, and the local minima are merged under a lock.
//! Results are reproducible for a fixed worker count; changing the worker
//! count changes the jitter streams and therefore possibly the pick.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::ModelError;
use crate::rng::{worker_seed, RngKind, WfcRng};
use crate::topology::Topology;
use crate::wave::Wave;

/// Starting minimum; any finite cost beats it, whatever the state count.
const INITIAL_MIN: f64 = f64::INFINITY;

/// Jitter scale, small enough to never invert a genuine cost difference.
const NOISE: f64 = 1e-6;

/// Cell selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Heuristic {
    #[default]
    Entropy,
    Mrv,
    Scanline,
}

impl FromStr for Heuristic {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Entropy" | "entropy" => Ok(Heuristic::Entropy),
            "MRV" | "Mrv" | "mrv" => Ok(Heuristic::Mrv),
            "Scanline" | "scanline" => Ok(Heuristic::Scanline),
            _ => Err(ModelError::UnknownHeuristic(s.to_string())),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heuristic::Entropy => write!(f, "Entropy"),
            Heuristic::Mrv => write!(f, "MRV"),
            Heuristic::Scanline => write!(f, "Scanline"),
        }
    }
}

/// Stateful selector: owns the scanline cursor and the scan worker pool.
#[derive(Debug)]
pub struct Selector {
    heuristic: Heuristic,
    workers: usize,
    rng_kind: RngKind,
    pool: Option<rayon::ThreadPool>,
    observed_so_far: usize,
}

impl Selector {
    /// `workers > 1` enables the parallel scan for MRV/Entropy.
    pub fn new(heuristic: Heuristic, workers: usize, rng_kind: RngKind) -> Result<Self, ModelError> {
        let workers = workers.max(1);
        let pool = if workers > 1 && heuristic != Heuristic::Scanline {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("wfc-select-{}", i))
                .build()
                .map_err(|e| ModelError::WorkerPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            heuristic,
            workers,
            rng_kind,
            pool,
            observed_so_far: 0,
        })
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// Rewind the scanline cursor for a new run.
    pub fn reset(&mut self) {
        self.observed_so_far = 0;
    }

    /// Pick the next cell with more than one remaining state.
    ///
    /// `rng` drives the sequential jitter; `seed` seeds the per-worker
    /// streams of the parallel scan. Returns `None` when every selectable
    /// cell is resolved.
    pub fn next_cell(
        &mut self,
        wave: &Wave,
        topology: &Topology,
        rng: &mut dyn WfcRng,
        seed: i32,
    ) -> Option<usize> {
        match self.heuristic {
            Heuristic::Scanline => self.next_scanline(wave, topology),
            heuristic => match &self.pool {
                Some(pool) => {
                    parallel_min(pool, self.workers, self.rng_kind, heuristic, wave, topology, seed)
                }
                None => {
                    let (min, argmin) =
                        scan_range(heuristic, wave, topology, 0..wave.len(), rng);
                    tracing::trace!(?argmin, min, "sequential scan");
                    argmin
                }
            },
        }
    }

    fn next_scanline(&mut self, wave: &Wave, topology: &Topology) -> Option<usize> {
        for i in self.observed_so_far..wave.len() {
            if !topology.is_selectable(i) {
                continue;
            }
            if wave.remaining(i) > 1 {
                self.observed_so_far = i + 1;
                return Some(i);
            }
        }
        None
    }
}

#[inline]
fn cost(heuristic: Heuristic, wave: &Wave, cell: usize) -> f64 {
    match heuristic {
        Heuristic::Entropy => wave.entropy(cell),
        _ => wave.remaining(cell) as f64,
    }
}

/// Jittered argmin over `cells`.
fn scan_range(
    heuristic: Heuristic,
    wave: &Wave,
    topology: &Topology,
    cells: std::ops::Range<usize>,
    rng: &mut dyn WfcRng,
) -> (f64, Option<usize>) {
    let mut min = INITIAL_MIN;
    let mut argmin = None;

    for i in cells {
        if !topology.is_selectable(i) {
            continue;
        }
        let remaining = wave.remaining(i);
        let c = cost(heuristic, wave, i);
        if remaining > 1 && c <= min {
            let noise = NOISE * rng.next_double();
            if c + noise < min {
                min = c + noise;
                argmin = Some(i);
            }
        }
    }

    (min, argmin)
}

fn parallel_min(
    pool: &rayon::ThreadPool,
    workers: usize,
    rng_kind: RngKind,
    heuristic: Heuristic,
    wave: &Wave,
    topology: &Topology,
    seed: i32,
) -> Option<usize> {
    let len = wave.len();
    let chunk = len.div_ceil(workers).max(1);
    let best: Mutex<(f64, Option<usize>)> = Mutex::new((INITIAL_MIN, None));

    pool.install(|| {
        (0..workers).into_par_iter().for_each(|worker| {
            let start = (worker * chunk).min(len);
            let end = (start + chunk).min(len);
            let mut rng = rng_kind.create(worker_seed(seed, worker));
            let (local_min, local_arg) =
                scan_range(heuristic, wave, topology, start..end, rng.as_mut());

            if let Some(cell) = local_arg {
                let mut guard = best.lock().unwrap_or_else(|e| e.into_inner());
                if local_min < guard.0 {
                    *guard = (local_min, Some(cell));
                }
            }
        });
    });

    let (min, argmin) = best.into_inner().unwrap_or_else(|e| e.into_inner());
    tracing::trace!(?argmin, min, workers, "parallel scan");
    argmin
}
