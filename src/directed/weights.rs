//! Direction-aware weights and the directed problem contract.

use serde::{Deserialize, Serialize};

use crate::directed::{Direction, DirectedVisit, Turn};
use crate::problem::TourProblem;
use crate::weight::WeightMatrix;

/// Directional travel weights plus per-visit turn penalties.
///
/// Edge weights live in a `2n×2n` matrix indexed by `(visit, direction)`
/// pairs: the row is the origin's departure direction, the column the
/// destination's arrival direction. Turn penalties are charged once per stop
/// according to the turn taken there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectedWeights {
    matrix: WeightMatrix,
    penalties: Vec<[f64; 4]>,
    size: usize,
}

impl DirectedWeights {
    /// Creates zeroed directional weights for `size` visits.
    pub fn new(size: usize) -> Self {
        Self {
            matrix: WeightMatrix::new(size * 2),
            penalties: vec![[0.0; 4]; size],
            size,
        }
    }

    /// Lifts an undirected matrix: every direction combination of an edge
    /// gets the same weight, all turn penalties zero.
    pub fn from_matrix(wm: &WeightMatrix) -> Self {
        let n = wm.size();
        let mut dw = Self::new(n);
        for f in 0..n {
            for t in 0..n {
                let w = wm.get(f, t);
                for fd in [Direction::Forward, Direction::Backward] {
                    for td in [Direction::Forward, Direction::Backward] {
                        dw.set_edge(f, fd, t, td, w);
                    }
                }
            }
        }
        dw
    }

    fn row(&self, visit: usize, direction: Direction) -> usize {
        visit * 2 + direction.bit()
    }

    /// Sets the weight of travelling `from` (departing `from_dir`) to `to`
    /// (arriving `to_dir`).
    pub fn set_edge(
        &mut self,
        from: usize,
        from_dir: Direction,
        to: usize,
        to_dir: Direction,
        weight: f64,
    ) {
        let (f, t) = (self.row(from, from_dir), self.row(to, to_dir));
        self.matrix.set(f, t, weight);
    }

    /// The weight of travelling between two directed visits: the origin's
    /// departure direction against the destination's arrival direction.
    pub fn edge(&self, from: DirectedVisit, to: DirectedVisit) -> f64 {
        let f = self.row(from.visit, from.turn.departure());
        let t = self.row(to.visit, to.turn.arrival());
        self.matrix.get(f, t)
    }

    /// Sets the penalty for taking `turn` at `visit`.
    pub fn set_turn_penalty(&mut self, visit: usize, turn: Turn, penalty: f64) {
        self.penalties[visit][turn.index()] = penalty;
    }

    /// The penalty for taking `turn` at `visit`.
    pub fn turn_penalty(&self, visit: usize, turn: Turn) -> f64 {
        self.penalties[visit][turn.index()]
    }

    /// Number of visits covered.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// A problem whose weight function distinguishes directions and turns.
///
/// The inherited [`TourProblem::weight`] view is the forward-forward entry,
/// which lets direction-agnostic operators run on directed problems.
pub trait DirectedTourProblem: TourProblem {
    /// Directional edge weight between two directed visits.
    fn directed_weight(&self, from: DirectedVisit, to: DirectedVisit) -> f64;

    /// Penalty charged for taking `turn` at `visit`.
    fn turn_penalty(&self, visit: usize, turn: Turn) -> f64;
}

/// A [`DirectedWeights`]-backed problem instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectedProblem {
    weights: DirectedWeights,
    first: usize,
    last: Option<usize>,
    budget: Option<f64>,
    require_complete: bool,
}

impl DirectedProblem {
    /// Creates an open-path directed problem starting at visit 0.
    pub fn new(weights: DirectedWeights) -> Self {
        Self {
            weights,
            first: 0,
            last: None,
            budget: None,
            require_complete: true,
        }
    }

    /// Sets the fixed start visit.
    pub fn with_first(mut self, first: usize) -> Self {
        self.first = first;
        self
    }

    /// Makes the tour a cycle (last == first).
    pub fn closed(mut self) -> Self {
        self.last = Some(self.first);
        self
    }

    /// Bounds the total tour weight.
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Allows solutions that leave visits unplaced.
    pub fn with_optional_visits(mut self) -> Self {
        self.require_complete = false;
        self
    }

    /// The underlying directional weights.
    pub fn weights(&self) -> &DirectedWeights {
        &self.weights
    }
}

impl TourProblem for DirectedProblem {
    fn dimension(&self) -> usize {
        self.weights.size()
    }

    fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights.edge(
            DirectedVisit::new(from, Turn::ForwardForward),
            DirectedVisit::new(to, Turn::ForwardForward),
        )
    }

    fn first(&self) -> usize {
        self.first
    }

    fn last(&self) -> Option<usize> {
        self.last
    }

    fn budget(&self) -> Option<f64> {
        self.budget
    }

    fn require_complete(&self) -> bool {
        self.require_complete
    }
}

impl DirectedTourProblem for DirectedProblem {
    fn directed_weight(&self, from: DirectedVisit, to: DirectedVisit) -> f64 {
        self.weights.edge(from, to)
    }

    fn turn_penalty(&self, visit: usize, turn: Turn) -> f64 {
        self.weights.turn_penalty(visit, turn)
    }
}
