//! Contiguous tour windows.
//!
//! A [`Seq`] is a lightweight view over a short run of consecutive visits,
//! carrying the cost of its internal chain in both orientations. Window
//! operators (seq-exchange, multi-visit insertion) evaluate many candidate
//! placements of the same window; precomputing both orientation costs once
//! avoids re-walking the window per placement.

/// A window of 2..k consecutive visits with precomputed internal costs.
///
/// # Examples
///
/// ```
/// use tour_opt::tour::Seq;
///
/// let w = |f: usize, t: usize| (f * 10 + t) as f64;
/// let seq = Seq::new(vec![1, 2, 3], w);
/// assert_eq!(seq.cost(false), w(1, 2) + w(2, 3));
/// assert_eq!(seq.cost(true), w(3, 2) + w(2, 1));
/// assert_eq!(seq.entry(true), 3);
/// assert_eq!(seq.exit(true), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Seq {
    visits: Vec<usize>,
    forward: f64,
    backward: f64,
}

impl Seq {
    /// Builds a window over `visits`, computing both orientation costs.
    pub fn new<W>(visits: Vec<usize>, weight: W) -> Self
    where
        W: Fn(usize, usize) -> f64,
    {
        let mut forward = 0.0;
        let mut backward = 0.0;
        for w in visits.windows(2) {
            forward += weight(w[0], w[1]);
            backward += weight(w[1], w[0]);
        }
        Self {
            visits,
            forward,
            backward,
        }
    }

    /// The visits of this window, in forward order.
    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    /// Number of visits in the window.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Internal chain cost for the given orientation.
    pub fn cost(&self, reversed: bool) -> f64 {
        if reversed {
            self.backward
        } else {
            self.forward
        }
    }

    /// The visit entered first when traversing in the given orientation.
    pub fn entry(&self, reversed: bool) -> usize {
        if reversed {
            *self.visits.last().expect("seq windows are non-empty")
        } else {
            self.visits[0]
        }
    }

    /// The visit exited last when traversing in the given orientation.
    pub fn exit(&self, reversed: bool) -> usize {
        if reversed {
            self.visits[0]
        } else {
            *self.visits.last().expect("seq windows are non-empty")
        }
    }
}
