//! Run controller: reset, select, collapse, propagate.
//!
//! `WfcModel` owns the immutable inputs (topology, weights, propagator) and
//! lazily allocated per-run storage that is reused across seeds. Each run
//! starts from [`WfcModel::reset`]; a contradiction ends the run and leaves
//! the wave invalid until the next reset. There is no backtracking.

use std::fmt;

use crate::error::ModelError;
use crate::heuristic::{Heuristic, Selector};
use crate::propagator::Propagator;
use crate::rng::{RngKind, WfcRng};
use crate::topology::{Topology, DIRECTIONS, OPPOSITE};
use crate::wave::Wave;
use crate::weights::{weighted_index, WeightTable};

/// Construction parameters of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub width: usize,
    pub height: usize,
    /// Placement window size supplied by the state-set collaborator
    pub n: usize,
    pub periodic: bool,
    /// Pin the last state to the bottom row and exclude it elsewhere
    pub ground: bool,
    pub heuristic: Heuristic,
    /// Selection scan workers; 1 keeps the scan sequential
    pub workers: usize,
    pub rng: RngKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            n: 1,
            periodic: false,
            ground: false,
            heuristic: Heuristic::Entropy,
            workers: 1,
            rng: RngKind::default(),
        }
    }
}

/// Where a model is in its run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Storage not allocated yet
    Uninitialized,
    /// Freshly reset
    Ready,
    /// Observing and propagating
    Running,
    /// Every selectable cell resolved
    Solved,
    /// Some cell ran out of states
    Contradiction,
}

/// Terminal result of [`WfcModel::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Solved,
    Contradiction,
    /// The collapse limit was hit before the grid resolved
    LimitReached,
}

impl RunOutcome {
    pub fn is_solved(self) -> bool {
        self == RunOutcome::Solved
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Solved => write!(f, "DONE"),
            RunOutcome::Contradiction => write!(f, "CONTRADICTION"),
            RunOutcome::LimitReached => write!(f, "LIMIT"),
        }
    }
}

/// Work counters for the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Cells collapsed by weighted draw
    pub observations: usize,
    /// States removed, including those removed by observation
    pub bans: usize,
    /// Ban events popped from the worklist
    pub propagations: usize,
}

/// Per-run mutable storage, allocated on first use.
#[derive(Debug)]
struct Storage {
    wave: Wave,
    /// LIFO worklist of (cell, state) bans not yet propagated
    stack: Vec<(usize, usize)>,
    /// Observation buffer (reused to avoid allocation)
    distribution: Vec<f64>,
    observed: Vec<usize>,
    /// Set by the ban that empties a cell
    contradiction: bool,
    stats: RunStats,
}

impl Storage {
    fn new(cells: usize, states: usize) -> Self {
        Self {
            wave: Wave::new(cells, states),
            stack: Vec::with_capacity(cells * states),
            distribution: vec![0.0; states],
            observed: vec![0; cells],
            contradiction: false,
            stats: RunStats::default(),
        }
    }

    fn ban(&mut self, cell: usize, state: usize, weights: &WeightTable) {
        let remaining = self.wave.remove(cell, state, weights);
        self.stack.push((cell, state));
        self.stats.bans += 1;
        if remaining == 0 && !self.contradiction {
            tracing::trace!(cell, state, "cell emptied");
            self.contradiction = true;
        }
    }
}

/// Constraint-propagation solver over a 4-connected grid.
#[derive(Debug)]
pub struct WfcModel {
    topology: Topology,
    weights: WeightTable,
    propagator: Propagator,
    ground: bool,
    rng_kind: RngKind,
    selector: Selector,
    storage: Option<Storage>,
    state: SolverState,
}

impl WfcModel {
    pub fn new(
        config: ModelConfig,
        weights: Vec<f64>,
        propagator: Propagator,
    ) -> Result<Self, ModelError> {
        let topology = Topology::new(config.width, config.height, config.n, config.periodic)?;
        let weights = WeightTable::new(weights)?;
        if weights.len() != propagator.states() {
            return Err(ModelError::StateCountMismatch {
                weights: weights.len(),
                propagator: propagator.states(),
            });
        }
        let selector = Selector::new(config.heuristic, config.workers, config.rng)?;

        Ok(Self {
            topology,
            weights,
            propagator,
            ground: config.ground,
            rng_kind: config.rng,
            selector,
            storage: None,
            state: SolverState::Uninitialized,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    pub fn heuristic(&self) -> Heuristic {
        self.selector.heuristic()
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Number of states T.
    pub fn states(&self) -> usize {
        self.weights.len()
    }

    /// Current wave, `None` before the first reset.
    pub fn wave(&self) -> Option<&Wave> {
        self.storage.as_ref().map(|s| &s.wave)
    }

    pub fn stats(&self) -> RunStats {
        self.storage.as_ref().map(|s| s.stats).unwrap_or_default()
    }

    /// Whether a ban has emptied a cell since the last reset.
    pub fn has_contradiction(&self) -> bool {
        self.storage.as_ref().is_some_and(|s| s.contradiction)
    }

    /// Number of bans waiting to be propagated.
    pub fn pending_bans(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.stack.len())
    }

    /// Resolved state per cell, only after a successful run.
    pub fn observed(&self) -> Option<&[usize]> {
        match (&self.storage, self.state) {
            (Some(storage), SolverState::Solved) => Some(&storage.observed),
            _ => None,
        }
    }

    /// Restore the fully unconstrained wave, then apply the static bans.
    ///
    /// A state with no support from some neighbor is banned there up front;
    /// its counter starts at 0 and propagation would never reach it. With
    /// ground enabled the ground row is applied as well. Returns `false` if
    /// these bans alone contradict.
    pub fn reset(&mut self) -> bool {
        let cells = self.topology.cell_count();
        let states = self.weights.len();
        let storage = self
            .storage
            .get_or_insert_with(|| Storage::new(cells, states));

        storage.wave.reset(&self.propagator, &self.weights);
        storage.stack.clear();
        storage.contradiction = false;
        storage.stats = RunStats::default();
        self.selector.reset();
        self.state = SolverState::Ready;

        for t in 0..states {
            for d in 0..DIRECTIONS {
                if self.propagator.degree(OPPOSITE[d], t) != 0 {
                    continue;
                }
                for cell in 0..cells {
                    if storage.wave.is_possible(cell, t) && self.topology.source(cell, d).is_some()
                    {
                        storage.ban(cell, t, &self.weights);
                    }
                }
            }
        }
        let unsupported = storage.stats.bans;

        if self.ground {
            let Topology { width, height, .. } = self.topology;
            for x in 0..width {
                let bottom = x + (height - 1) * width;
                for t in 0..states - 1 {
                    if storage.wave.is_possible(bottom, t) {
                        storage.ban(bottom, t, &self.weights);
                    }
                }
                for y in 0..height - 1 {
                    let cell = x + y * width;
                    if storage.wave.is_possible(cell, states - 1) {
                        storage.ban(cell, states - 1, &self.weights);
                    }
                }
            }
        }

        if !self.propagate() {
            tracing::debug!(unsupported, ground = self.ground, "static bans contradict");
            return false;
        }

        tracing::trace!(cells, states, unsupported, ground = self.ground, "wave reset");
        true
    }

    /// Remove `state` from `cell` and queue it for propagation.
    ///
    /// # Panics
    /// Before the first reset, or if `state` is already banned at `cell`.
    pub fn ban(&mut self, cell: usize, state: usize) {
        let storage = self.storage.as_mut().expect("ban called before reset");
        storage.ban(cell, state, &self.weights);
    }

    /// Drain the ban worklist, most recent first.
    ///
    /// Returns `false` as soon as any cell has no states left; the remaining
    /// worklist is discarded and the model enters `Contradiction`.
    pub fn propagate(&mut self) -> bool {
        let storage = self
            .storage
            .as_mut()
            .expect("propagate called before reset");
        let topology = &self.topology;
        let propagator = &self.propagator;
        let weights = &self.weights;

        'drain: while !storage.contradiction {
            let Some((i1, t1)) = storage.stack.pop() else {
                break;
            };
            storage.stats.propagations += 1;

            for d in 0..DIRECTIONS {
                let Some(i2) = topology.neighbor(i1, d) else {
                    continue;
                };
                for &t2 in propagator.compatible(d, t1) {
                    if storage.wave.decrement_compatible(i2, t2, d) == 0 {
                        storage.ban(i2, t2, weights);
                        if storage.contradiction {
                            break 'drain;
                        }
                    }
                }
            }
        }

        if storage.contradiction {
            storage.stack.clear();
            self.state = SolverState::Contradiction;
            false
        } else {
            true
        }
    }

    /// Collapse `cell` to one state drawn by weight, banning the rest.
    pub fn observe(&mut self, cell: usize, rng: &mut dyn WfcRng) {
        let storage = self.storage.as_mut().expect("observe called before reset");
        debug_assert!(storage.wave.remaining(cell) > 0);

        for t in 0..self.weights.len() {
            storage.distribution[t] = if storage.wave.is_possible(cell, t) {
                self.weights.weight(t)
            } else {
                0.0
            };
        }
        let r = weighted_index(&storage.distribution, rng.next_double());

        for t in 0..self.weights.len() {
            if t != r && storage.wave.is_possible(cell, t) {
                storage.ban(cell, t, &self.weights);
            }
        }
        storage.stats.observations += 1;
    }

    /// Next cell to collapse, `None` when everything selectable is resolved.
    pub fn next_cell(&mut self, rng: &mut dyn WfcRng, seed: i32) -> Option<usize> {
        let storage = self.storage.as_ref()?;
        self.selector
            .next_cell(&storage.wave, &self.topology, rng, seed)
    }

    /// One select, collapse, propagate iteration.
    ///
    /// `seed` is the run seed; it seeds the parallel scan workers.
    ///
    /// # Panics
    /// Before the first reset.
    pub fn step(&mut self, rng: &mut dyn WfcRng, seed: i32) -> SolverState {
        match self.state {
            SolverState::Ready | SolverState::Running => {}
            SolverState::Uninitialized => panic!("step called before reset"),
            terminal => return terminal,
        }

        match self.next_cell(rng, seed) {
            Some(cell) => {
                self.observe(cell, rng);
                if self.propagate() {
                    self.state = SolverState::Running;
                }
            }
            None => self.finalize(),
        }
        self.state
    }

    /// Reset and solve with `seed`.
    ///
    /// `limit` caps the number of collapses; `None` runs until the grid
    /// resolves or contradicts.
    pub fn run(&mut self, seed: i32, limit: Option<usize>) -> RunOutcome {
        let outcome = self.run_inner(seed, limit);
        let stats = self.stats();
        tracing::debug!(
            seed,
            %outcome,
            observations = stats.observations,
            bans = stats.bans,
            propagations = stats.propagations,
            "run finished"
        );
        outcome
    }

    fn run_inner(&mut self, seed: i32, limit: Option<usize>) -> RunOutcome {
        if !self.reset() {
            return RunOutcome::Contradiction;
        }
        let mut rng = self.rng_kind.create(seed);
        let mut collapses = 0;

        loop {
            let Some(cell) = self.next_cell(rng.as_mut(), seed) else {
                self.finalize();
                return RunOutcome::Solved;
            };
            if limit.is_some_and(|max| collapses >= max) {
                return RunOutcome::LimitReached;
            }

            self.observe(cell, rng.as_mut());
            if !self.propagate() {
                return RunOutcome::Contradiction;
            }
            self.state = SolverState::Running;
            collapses += 1;
        }
    }

    /// Record each cell's lowest remaining state as its output.
    fn finalize(&mut self) {
        if let Some(storage) = self.storage.as_mut() {
            for (i, out) in storage.observed.iter_mut().enumerate() {
                *out = storage.wave.first_possible(i).unwrap_or_default();
            }
            self.state = SolverState::Solved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdRandom;
    use crate::topology::DX;

    fn all_compatible(t: usize) -> Propagator {
        Propagator::new(vec![vec![(0..t).collect(); t]; DIRECTIONS]).unwrap()
    }

    fn config(width: usize, height: usize, periodic: bool) -> ModelConfig {
        ModelConfig {
            width,
            height,
            periodic,
            ..ModelConfig::default()
        }
    }

    fn create_simple_model() -> WfcModel {
        WfcModel::new(config(2, 2, true), vec![1.0, 1.0], all_compatible(2)).unwrap()
    }

    /// Every adjacent pair of the solved grid is allowed by the propagator.
    fn assert_adjacency(model: &WfcModel) {
        let observed = model.observed().expect("model should be solved");
        let topo = *model.topology();
        for cell in 0..topo.cell_count() {
            for d in 0..DIRECTIONS {
                if let Some(other) = topo.neighbor(cell, d) {
                    assert!(
                        model.propagator().allows(d, observed[cell], observed[other]),
                        "state {} at {:?} not compatible with state {} at {:?} in direction {} (dx {})",
                        observed[cell],
                        topo.coords(cell),
                        observed[other],
                        topo.coords(other),
                        d,
                        DX[d]
                    );
                }
            }
        }
    }

    #[test]
    fn test_model_creation() {
        let model = create_simple_model();
        assert_eq!(model.states(), 2);
        assert_eq!(model.state(), SolverState::Uninitialized);
        assert!(model.wave().is_none());
        assert!(model.observed().is_none());
        assert_eq!(model.stats(), RunStats::default());
    }

    #[test]
    fn test_model_rejects_mismatched_states() {
        let err = WfcModel::new(config(2, 2, true), vec![1.0; 3], all_compatible(2)).unwrap_err();
        assert_eq!(
            err,
            ModelError::StateCountMismatch {
                weights: 3,
                propagator: 2
            }
        );
    }

    #[test]
    fn test_model_rejects_bad_config() {
        assert!(WfcModel::new(config(0, 2, true), vec![1.0], all_compatible(1)).is_err());
        assert!(WfcModel::new(config(2, 2, true), vec![0.0], all_compatible(1)).is_err());
    }

    #[test]
    fn test_model_reset_allocates_storage() {
        let mut model = create_simple_model();
        assert!(model.reset());
        assert_eq!(model.state(), SolverState::Ready);
        let wave = model.wave().unwrap();
        assert_eq!(wave.len(), 4);
        assert!((0..4).all(|i| wave.remaining(i) == 2));
    }

    #[test]
    fn test_model_ban() {
        let mut model = create_simple_model();
        model.reset();

        model.ban(0, 0);

        let wave = model.wave().unwrap();
        assert_eq!(wave.remaining(0), 1);
        assert!(!wave.is_possible(0, 0));
        assert!(wave.is_possible(0, 1));
        assert_eq!(model.pending_bans(), 1);
        assert_eq!(model.stats().bans, 1);
    }

    #[test]
    #[should_panic(expected = "already banned")]
    fn test_model_double_ban_panics() {
        let mut model = create_simple_model();
        model.reset();
        model.ban(1, 1);
        model.ban(1, 1);
    }

    #[test]
    #[should_panic(expected = "before reset")]
    fn test_model_ban_before_reset_panics() {
        let mut model = create_simple_model();
        model.ban(0, 0);
    }

    #[test]
    fn test_model_propagate_reduces_possibilities() {
        // Pattern 0 only next to 0, pattern 1 only next to 1
        let identity = Propagator::new(vec![vec![vec![0], vec![1]]; DIRECTIONS]).unwrap();
        let mut model = WfcModel::new(config(2, 2, true), vec![1.0, 1.0], identity).unwrap();
        model.reset();

        model.ban(0, 0);
        assert!(model.propagate());
        assert_eq!(model.pending_bans(), 0);

        // Pattern 0 is gone everywhere
        let wave = model.wave().unwrap();
        for i in 0..4 {
            assert_eq!(wave.remaining(i), 1);
            assert!(wave.is_possible(i, 1));
        }
        assert!(!model.has_contradiction());
    }

    #[test]
    fn test_model_observe_leaves_one_state() {
        let mut model =
            WfcModel::new(config(3, 3, false), vec![1.0, 2.0, 3.0, 4.0], all_compatible(4)).unwrap();
        model.reset();
        let mut rng = StdRandom::from_seed(5);

        model.observe(4, &mut rng);

        assert_eq!(model.wave().unwrap().remaining(4), 1);
        assert_eq!(model.pending_bans(), 3);
        assert_eq!(model.stats().observations, 1);
        assert!(model.propagate());
    }

    #[test]
    fn test_model_observe_never_picks_banned_state() {
        let mut model =
            WfcModel::new(config(1, 1, false), vec![5.0, 1.0, 5.0], all_compatible(3)).unwrap();
        for seed in 0..50 {
            model.reset();
            model.ban(0, 0);
            model.ban(0, 2);
            model.observe(0, &mut StdRandom::from_seed(seed));
            assert!(model.wave().unwrap().is_possible(0, 1));
        }
    }

    #[test]
    fn test_model_complete_simple() {
        let mut model = create_simple_model();
        let outcome = model.run(42, None);

        assert_eq!(outcome, RunOutcome::Solved);
        assert_eq!(model.state(), SolverState::Solved);
        assert!(model.wave().unwrap().is_collapsed());
        assert_eq!(model.observed().unwrap().len(), 4);
    }

    #[test]
    fn test_model_step_until_done() {
        let mut model = create_simple_model();
        model.reset();
        let mut rng = StdRandom::from_seed(9);

        let mut steps = 0;
        while model.step(&mut rng, 9) == SolverState::Running {
            steps += 1;
            assert!(steps < 100, "model did not finish in reasonable steps");
        }
        assert_eq!(model.state(), SolverState::Solved);
        // Stepping a finished model is a no-op
        assert_eq!(model.step(&mut rng, 9), SolverState::Solved);
    }

    #[test]
    fn test_model_reset_after_run() {
        let mut model = create_simple_model();
        model.run(42, None);
        assert!(model.observed().is_some());

        model.reset();
        assert_eq!(model.state(), SolverState::Ready);
        assert!(model.observed().is_none());
        assert_eq!(model.stats(), RunStats::default());
        let wave = model.wave().unwrap();
        assert!((0..4).all(|i| wave.remaining(i) == 2));
    }

    #[test]
    fn test_model_adjacency_constraints_satisfied() {
        // 0 next to {0,1}, 1 next to {0}: no two 1s touch
        let prop = Propagator::new(vec![vec![vec![0, 1], vec![0]]; DIRECTIONS]).unwrap();

        for heuristic in [Heuristic::Entropy, Heuristic::Mrv, Heuristic::Scanline] {
            let cfg = ModelConfig {
                heuristic,
                ..config(4, 4, true)
            };
            let mut model = WfcModel::new(cfg, vec![1.0, 1.0], prop.clone()).unwrap();
            for seed in 0..10 {
                assert_eq!(model.run(seed, None), RunOutcome::Solved);
                assert!(model.wave().unwrap().is_collapsed());
                assert_adjacency(&model);
            }
        }
    }

    #[test]
    fn test_model_larger_grid_adjacency() {
        // 0,2 next to 1,3 and vice versa
        let prop = Propagator::new(vec![
            vec![vec![1, 3], vec![0, 2], vec![1, 3], vec![0, 2]];
            DIRECTIONS
        ])
        .unwrap();
        let mut model = WfcModel::new(config(8, 8, true), vec![1.0; 4], prop).unwrap();

        assert_eq!(model.run(123, None), RunOutcome::Solved);
        assert_adjacency(&model);
    }
}
