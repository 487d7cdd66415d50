//! Directed visit encoding.
//!
//! A directed visit is a visit id plus a 2-bit turn tag describing how the
//! stop is traversed: arrival direction × departure direction. The packed
//! form `visit << 2 | turn` is the single place this encoding lives; call
//! sites work with [`DirectedVisit`] and [`Turn`] values, never with raw
//! shifted integers.

/// Traversal direction of a single arrival or departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// 0 for forward, 1 for backward.
    pub fn bit(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Backward => 1,
        }
    }
}

/// The four arrival × departure combinations at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    ForwardForward,
    ForwardBackward,
    BackwardForward,
    BackwardBackward,
}

impl Turn {
    /// All turns, in index order.
    pub const ALL: [Turn; 4] = [
        Turn::ForwardForward,
        Turn::ForwardBackward,
        Turn::BackwardForward,
        Turn::BackwardBackward,
    ];

    /// Combines an arrival and a departure direction.
    pub fn new(arrival: Direction, departure: Direction) -> Self {
        match (arrival, departure) {
            (Direction::Forward, Direction::Forward) => Turn::ForwardForward,
            (Direction::Forward, Direction::Backward) => Turn::ForwardBackward,
            (Direction::Backward, Direction::Forward) => Turn::BackwardForward,
            (Direction::Backward, Direction::Backward) => Turn::BackwardBackward,
        }
    }

    /// The arrival direction (high bit).
    pub fn arrival(self) -> Direction {
        match self {
            Turn::ForwardForward | Turn::ForwardBackward => Direction::Forward,
            Turn::BackwardForward | Turn::BackwardBackward => Direction::Backward,
        }
    }

    /// The departure direction (low bit).
    pub fn departure(self) -> Direction {
        match self {
            Turn::ForwardForward | Turn::BackwardForward => Direction::Forward,
            Turn::ForwardBackward | Turn::BackwardBackward => Direction::Backward,
        }
    }

    /// The 2-bit tag, 0..4.
    pub fn index(self) -> usize {
        (self.arrival().bit() << 1) | self.departure().bit()
    }

    /// Inverse of [`Turn::index`].
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }
}

/// A visit id tagged with its traversal turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedVisit {
    pub visit: usize,
    pub turn: Turn,
}

impl DirectedVisit {
    /// Tags `visit` with `turn`.
    pub fn new(visit: usize, turn: Turn) -> Self {
        Self { visit, turn }
    }

    /// Packs into `visit << 2 | turn`.
    pub fn encode(self) -> usize {
        (self.visit << 2) | self.turn.index()
    }

    /// Unpacks an encoded directed visit.
    pub fn decode(code: usize) -> Self {
        Self {
            visit: code >> 2,
            turn: Turn::from_index(code & 0b11),
        }
    }
}
