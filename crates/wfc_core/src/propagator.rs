//! Adjacency compatibility tables.
//!
//! `propagator[d][t1]` lists the states allowed in the neighbor at direction
//! `d` when `t1` occupies the current cell. Compatibility counters rely on
//! the table being symmetric, so that is checked once at construction.

use crate::error::ModelError;
use crate::topology::{DIRECTIONS, OPPOSITE};

/// Validated, immutable propagator over 4 directions and T states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagator {
    table: Vec<Vec<Vec<usize>>>,
    states: usize,
}

impl Propagator {
    /// Build from `table[d][t1]` = compatible states.
    ///
    /// The number of states is taken from direction 0. Each list is sorted
    /// and duplicate entries are dropped.
    pub fn new(mut table: Vec<Vec<Vec<usize>>>) -> Result<Self, ModelError> {
        if table.len() != DIRECTIONS {
            return Err(ModelError::PropagatorShape {
                direction: table.len().min(DIRECTIONS),
                expected: DIRECTIONS,
                found: table.len(),
            });
        }
        let states = table[0].len();

        for (d, per_state) in table.iter().enumerate() {
            if per_state.len() != states {
                return Err(ModelError::PropagatorShape {
                    direction: d,
                    expected: states,
                    found: per_state.len(),
                });
            }
            for list in per_state {
                if let Some(&bad) = list.iter().find(|&&t| t >= states) {
                    return Err(ModelError::StateOutOfRange {
                        direction: d,
                        state: bad,
                    });
                }
            }
        }

        for list in table.iter_mut().flatten() {
            list.sort_unstable();
            list.dedup();
        }

        for (d, per_state) in table.iter().enumerate() {
            let reverse = &table[OPPOSITE[d]];
            for (t1, list) in per_state.iter().enumerate() {
                for &t2 in list {
                    if reverse[t2].binary_search(&t1).is_err() {
                        return Err(ModelError::AsymmetricPropagator {
                            direction: d,
                            from: t1,
                            to: t2,
                        });
                    }
                }
            }
        }

        Ok(Self { table, states })
    }

    /// Build from a dense `allowed[d][t1][t2]` matrix.
    pub fn from_dense(allowed: &[Vec<Vec<bool>>]) -> Result<Self, ModelError> {
        let table = allowed
            .iter()
            .map(|per_state| {
                per_state
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter_map(|(t2, &ok)| ok.then_some(t2))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self::new(table)
    }

    /// Build from adjacency pairs over `states` states.
    ///
    /// `(left, right)` allows `right` at +X of `left`; `(top, bottom)` allows
    /// `bottom` at +Y of `top`. Each pair also allows the reverse direction,
    /// so the result is symmetric by construction.
    pub fn from_neighbor_pairs(
        states: usize,
        horizontal: &[(usize, usize)],
        vertical: &[(usize, usize)],
    ) -> Result<Self, ModelError> {
        let mut dense = vec![vec![vec![false; states]; states]; DIRECTIONS];
        for (pairs, forward) in [(horizontal, 0), (vertical, 1)] {
            for &(a, b) in pairs {
                if let Some(&bad) = [a, b].iter().find(|&&s| s >= states) {
                    return Err(ModelError::StateOutOfRange {
                        direction: forward,
                        state: bad,
                    });
                }
                dense[forward][a][b] = true;
                dense[OPPOSITE[forward]][b][a] = true;
            }
        }
        Self::from_dense(&dense)
    }

    /// Number of states T.
    #[inline]
    pub fn states(&self) -> usize {
        self.states
    }

    /// States supported in direction `d` by `state`.
    #[inline]
    pub fn compatible(&self, d: usize, state: usize) -> &[usize] {
        &self.table[d][state]
    }

    /// Static out-degree `|propagator[d][state]|`.
    #[inline]
    pub fn degree(&self, d: usize, state: usize) -> usize {
        self.table[d][state].len()
    }

    /// Whether `to` may sit in direction `d` of `from`.
    pub fn allows(&self, d: usize, from: usize, to: usize) -> bool {
        self.table[d][from].binary_search(&to).is_ok()
    }
}
