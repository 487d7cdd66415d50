//! # tour-opt
//!
//! Combinatorial tour optimization core: a mutable successor-array tour
//! abstraction, local search operators, and metaheuristic strategies for
//! TSP-style problems (closed/open tours, fixed ends, directed visits with
//! turn penalties, weight-budgeted variants).
//!
//! ## Modules
//!
//! - [`tour`] — Successor-array [`Tour`](tour::Tour) with O(1) edge rewiring, plus [`Seq`](tour::Seq) windows
//! - [`weight`] — Dense weight matrix and nearest-neighbour shortlists
//! - [`problem`] — The [`TourProblem`](problem::TourProblem) contract and a matrix-backed instance
//! - [`candidate`] — [`Candidate`](candidate::Candidate) triples and the [`Objective`](candidate::Objective) fitness algebra
//! - [`directed`] — Directed visits, turn penalties, and directed operators
//! - [`search`] — [`Operator`](search::Operator)/[`Perturber`](search::Perturber) contracts and local search (2-opt, 3-opt, cheapest insertion, shift, exchange)
//! - [`strategy`] — [`Strategy`](strategy::Strategy) contract, generators, VNS, and GA

pub mod candidate;
pub mod directed;
pub mod error;
pub mod problem;
pub mod search;
pub mod strategy;
pub mod tour;
pub mod weight;

pub use error::{SearchError, TourError};
