//! Error types.
//!
//! Two distinct failure families (deliberately not unified): [`TourError`]
//! marks a violated mutation contract — an operator bug, not recoverable
//! problem data — while [`SearchError`] is the recoverable "this problem has
//! no feasible candidate" outcome a generator surfaces to its caller.

use thiserror::Error;

/// A violated contract on a [`Tour`](crate::tour::Tour) mutation.
///
/// Operators must never trigger these on valid input; a `TourError` escaping
/// a search indicates a bug in the operator, not in the problem data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    /// The visit is already part of the tour.
    #[error("visit {0} is already in the tour")]
    AlreadyPlaced(usize),

    /// The visit is not part of the tour.
    #[error("visit {0} is not in the tour")]
    NotPlaced(usize),

    /// The first visit anchors the tour and cannot be removed or moved.
    #[error("the first visit {0} cannot be removed or relocated")]
    RemoveFirst(usize),

    /// A visit cannot be shifted to a position relative to itself.
    #[error("cannot shift visit {0} after itself")]
    ShiftOntoSelf(usize),

    /// The visit id exceeds the tour's capacity.
    #[error("visit {visit} is out of range for tour capacity {capacity}")]
    OutOfRange {
        /// Offending visit id.
        visit: usize,
        /// Tour capacity (exclusive upper bound on visit ids).
        capacity: usize,
    },

    /// An invalid anchor combination was supplied at construction.
    #[error("invalid tour anchors: {0}")]
    InvalidAnchors(String),
}

/// A failed search.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The generator could not place all required visits under the problem's
    /// hard constraints.
    #[error("no feasible candidate: {0}")]
    Unsolvable(String),
}
