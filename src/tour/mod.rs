//! Tour representation.
//!
//! - [`Tour`] — Mutable successor-array visit sequence with O(1) edge rewiring
//! - [`Shift`] — The neighbours touched by a relocation, for exact deltas
//! - [`Seq`] — A contiguous tour window with precomputed orientation costs

mod seq;
mod sequence;

pub use seq::Seq;
pub use sequence::{Between, Pairs, Shift, Tour, Visits};
