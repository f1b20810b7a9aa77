//! Per-sample run timing statistics.

use std::fmt;

use serde::Serialize;
use wfc_core::RunOutcome;

/// Run outcomes and elapsed times for one sample.
///
/// Only successful runs contribute to the timing figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTimings {
    pub successes: usize,
    pub contradictions: usize,
    pub limit_hits: usize,
    pub total_ms: f64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub average_ms: Option<f64>,
}

impl RunTimings {
    pub fn record(&mut self, outcome: RunOutcome, elapsed_ms: f64) {
        match outcome {
            RunOutcome::Solved => {
                self.successes += 1;
                self.total_ms += elapsed_ms;
                self.min_ms = Some(self.min_ms.map_or(elapsed_ms, |m| m.min(elapsed_ms)));
                self.max_ms = Some(self.max_ms.map_or(elapsed_ms, |m| m.max(elapsed_ms)));
                self.average_ms = Some(self.total_ms / self.successes as f64);
            }
            RunOutcome::Contradiction => self.contradictions += 1,
            RunOutcome::LimitReached => self.limit_hits += 1,
        }
    }

    pub fn runs(&self) -> usize {
        self.successes + self.contradictions + self.limit_hits
    }
}

impl fmt::Display for RunTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.average_ms, self.min_ms, self.max_ms) {
            (Some(avg), Some(min), Some(max)) => write!(
                f,
                "{}/{} solved | avg {:.2}ms | min {:.2}ms | max {:.2}ms",
                self.successes,
                self.runs(),
                avg,
                min,
                max
            ),
            _ => write!(f, "0/{} solved", self.runs()),
        }
    }
}

/// Timings of one sample, as written to `stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub name: String,
    pub heuristic: String,
    pub workers: usize,
    pub timings: RunTimings,
}
