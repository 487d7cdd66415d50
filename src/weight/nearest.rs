//! Precomputed nearest-neighbour shortlists.
//!
//! Operators like 3-opt and shift-after only ever improve by reconnecting a
//! visit near one of its closest neighbours; a fixed-size per-visit
//! shortlist prunes their search space from O(n) to O(k) candidate targets.
//! Shortlists are immutable once built and cached per `(direction, n)` key.

use std::collections::HashMap;
use std::sync::Arc;

use crate::problem::TourProblem;

/// Which weight direction a shortlist is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighbourDirection {
    /// Order by `weight(visit, other)`.
    Forward,
    /// Order by `weight(other, visit)`.
    Backward,
    /// Order by the sum of both directions.
    Bidirectional,
}

/// Per-visit ordered lists of the `n` closest other visits.
///
/// # Examples
///
/// ```
/// use tour_opt::problem::MatrixProblem;
/// use tour_opt::weight::{NearestNeighbourArray, NeighbourDirection, WeightMatrix};
///
/// let mut wm = WeightMatrix::uniform(4, 10.0);
/// wm.set(0, 2, 1.0);
/// let problem = MatrixProblem::new(wm);
///
/// let nn = NearestNeighbourArray::build(&problem, NeighbourDirection::Forward, 2);
/// assert_eq!(nn.neighbours(0)[0], 2);
/// ```
#[derive(Debug, Clone)]
pub struct NearestNeighbourArray {
    n: usize,
    direction: NeighbourDirection,
    lists: Vec<Vec<usize>>,
}

impl NearestNeighbourArray {
    /// Builds shortlists of (at most) `n` neighbours per visit.
    pub fn build<P: TourProblem + ?Sized>(
        problem: &P,
        direction: NeighbourDirection,
        n: usize,
    ) -> Self {
        let dim = problem.dimension();
        let mut lists = Vec::with_capacity(dim);
        for v in 0..dim {
            let mut others: Vec<usize> = (0..dim).filter(|&u| u != v).collect();
            others.sort_by(|&a, &b| {
                let wa = Self::keyed_weight(problem, direction, v, a);
                let wb = Self::keyed_weight(problem, direction, v, b);
                wa.partial_cmp(&wb).expect("weights should not be NaN")
            });
            others.truncate(n);
            lists.push(others);
        }
        Self {
            n,
            direction,
            lists,
        }
    }

    fn keyed_weight<P: TourProblem + ?Sized>(
        problem: &P,
        direction: NeighbourDirection,
        visit: usize,
        other: usize,
    ) -> f64 {
        match direction {
            NeighbourDirection::Forward => problem.weight(visit, other),
            NeighbourDirection::Backward => problem.weight(other, visit),
            NeighbourDirection::Bidirectional => {
                problem.weight(visit, other) + problem.weight(other, visit)
            }
        }
    }

    /// The shortlist for `visit`, nearest first.
    pub fn neighbours(&self, visit: usize) -> &[usize] {
        &self.lists[visit]
    }

    /// The requested shortlist length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The direction the shortlists are ordered by.
    pub fn direction(&self) -> NeighbourDirection {
        self.direction
    }
}

/// Lazily builds and caches [`NearestNeighbourArray`]s per `(direction, n)`.
#[derive(Debug, Default)]
pub struct NearestNeighbourCache {
    entries: HashMap<(NeighbourDirection, usize), Arc<NearestNeighbourArray>>,
}

impl NearestNeighbourCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached shortlists for `(direction, n)`, building them on
    /// first request.
    pub fn get<P: TourProblem + ?Sized>(
        &mut self,
        problem: &P,
        direction: NeighbourDirection,
        n: usize,
    ) -> Arc<NearestNeighbourArray> {
        self.entries
            .entry((direction, n))
            .or_insert_with(|| Arc::new(NearestNeighbourArray::build(problem, direction, n)))
            .clone()
    }
}
