//! Directed tour variants: direction-tagged visits, turn penalties, and the
//! operators that exploit them.
//!
//! - [`Direction`] / [`Turn`] / [`DirectedVisit`] — The 2-bit turn encoding
//! - [`DirectedWeights`] / [`DirectedProblem`] — Direction-aware weight data
//! - [`DirectedTour`] / [`DirectedWeightObjective`] — Solution type and objective
//! - [`DirectionFlip`] / [`DirectedCheapestInsertion`] — Directed operators

mod flip;
mod tour;
mod visit;
mod weights;

pub use flip::{DirectedCheapestInsertion, DirectionFlip};
pub use tour::{directed_tour_weight, DirectedTour, DirectedWeightObjective};
pub use visit::{DirectedVisit, Direction, Turn};
pub use weights::{DirectedProblem, DirectedTourProblem, DirectedWeights};
