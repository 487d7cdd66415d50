//! Weights between visits.
//!
//! - [`WeightMatrix`] — Dense n×n travel cost matrix
//! - [`NearestNeighbourArray`] — Per-visit shortlist of closest visits
//! - [`NearestNeighbourCache`] — Lazy per-`(direction, n)` shortlist cache

mod matrix;
mod nearest;

pub use matrix::WeightMatrix;
pub use nearest::{NearestNeighbourArray, NearestNeighbourCache, NeighbourDirection};
