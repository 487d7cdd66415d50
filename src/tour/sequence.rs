//! Successor-array tour.
//!
//! # Representation
//!
//! A tour is stored as an index-addressable arena keyed by visit id: a
//! `next` successor array, a `prev` predecessor array (the reverse index
//! that makes removal O(1)), and a `placed` membership mask. Three shapes
//! are possible:
//!
//! - *closed* — `last == Some(first)`: the successor chain cycles back to
//!   `first`
//! - *fixed-end open* — `last == Some(l)`, `l != first`: the chain ends at a
//!   designated visit
//! - *open* — `last == None`: the chain ends at whichever visit currently
//!   has no successor
//!
//! Every mutation is O(1). Cloning deep-copies the arena, so a "best" and a
//! "working" tour can be mutated independently during search.

use crate::error::TourError;

/// The neighbours affected by [`Tour::shift_after`].
///
/// Callers combine these with the shift target to compute an exact cost
/// delta from the four touched edges, without rescanning the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    /// Predecessor of the shifted visit before the move.
    pub old_prev: usize,
    /// Successor of the shifted visit before the move, if any.
    pub old_next: Option<usize>,
    /// Successor of the shifted visit after the move, if any.
    pub new_next: Option<usize>,
}

/// An ordered, possibly-cyclic sequence of integer visit ids.
///
/// # Examples
///
/// ```
/// use tour_opt::tour::Tour;
///
/// // Closed tour over visits 0..5, seeded with its anchor.
/// let mut tour = Tour::new(5, 0, Some(0)).unwrap();
/// tour.insert_after(0, 1).unwrap();
/// tour.insert_after(1, 2).unwrap();
/// assert_eq!(tour.to_vec(), vec![0, 1, 2]);
/// assert!(tour.is_closed());
/// // The closing edge is part of the edge sequence.
/// assert_eq!(tour.pairs().last(), Some((2, 0)));
/// ```
#[derive(Debug, Clone)]
pub struct Tour {
    next: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
    placed: Vec<bool>,
    first: usize,
    last: Option<usize>,
    count: usize,
}

impl Tour {
    /// Creates a tour seeded with its anchor visits.
    ///
    /// `last` selects the shape: `None` for an open path, `Some(first)` for
    /// a closed tour, any other visit for a fixed-end open path (that visit
    /// is placed immediately as the tail).
    pub fn new(capacity: usize, first: usize, last: Option<usize>) -> Result<Self, TourError> {
        let mut tour = Self {
            next: vec![None; capacity],
            prev: vec![None; capacity],
            placed: vec![false; capacity],
            first,
            last,
            count: 0,
        };
        tour.check_range(first)?;
        tour.placed[first] = true;
        tour.count = 1;

        match last {
            None => {}
            Some(l) if l == first => {
                tour.next[first] = Some(first);
                tour.prev[first] = Some(first);
            }
            Some(l) => {
                tour.check_range(l)?;
                tour.placed[l] = true;
                tour.next[first] = Some(l);
                tour.prev[l] = Some(first);
                tour.count = 2;
            }
        }
        Ok(tour)
    }

    /// Builds a tour from an explicit visit order.
    ///
    /// `sequence[0]` becomes `first`. `last` must be `None` (open),
    /// `Some(sequence[0])` (closed) or the final element (fixed end).
    pub fn from_sequence(
        capacity: usize,
        sequence: &[usize],
        last: Option<usize>,
    ) -> Result<Self, TourError> {
        let Some(&first) = sequence.first() else {
            return Err(TourError::InvalidAnchors("empty sequence".into()));
        };
        let tail = *sequence.last().expect("sequence is non-empty");

        let mut tour = Self {
            next: vec![None; capacity],
            prev: vec![None; capacity],
            placed: vec![false; capacity],
            first,
            last,
            count: sequence.len(),
        };
        for &v in sequence {
            tour.check_range(v)?;
            if tour.placed[v] {
                return Err(TourError::AlreadyPlaced(v));
            }
            tour.placed[v] = true;
        }
        for w in sequence.windows(2) {
            tour.next[w[0]] = Some(w[1]);
            tour.prev[w[1]] = Some(w[0]);
        }
        match last {
            None => {}
            Some(l) if l == first => {
                tour.next[tail] = Some(first);
                tour.prev[first] = Some(tail);
            }
            Some(l) if l == tail => {}
            Some(l) => {
                return Err(TourError::InvalidAnchors(format!(
                    "last visit {l} is neither the first nor the final sequence element"
                )));
            }
        }
        Ok(tour)
    }

    fn check_range(&self, visit: usize) -> Result<(), TourError> {
        if visit >= self.next.len() {
            return Err(TourError::OutOfRange {
                visit,
                capacity: self.next.len(),
            });
        }
        Ok(())
    }

    /// Splices `visit` into the chain immediately after `existing`. O(1).
    pub fn insert_after(&mut self, existing: usize, visit: usize) -> Result<(), TourError> {
        self.check_range(existing)?;
        self.check_range(visit)?;
        if !self.placed[existing] {
            return Err(TourError::NotPlaced(existing));
        }
        if self.placed[visit] {
            return Err(TourError::AlreadyPlaced(visit));
        }

        let old = self.next[existing];
        self.next[existing] = Some(visit);
        self.prev[visit] = Some(existing);
        self.next[visit] = old;
        if let Some(o) = old {
            self.prev[o] = Some(visit);
        }
        self.placed[visit] = true;
        self.count += 1;
        Ok(())
    }

    /// Splices `visit` out of the chain. O(1).
    ///
    /// The first visit anchors the tour and cannot be removed. Removing a
    /// designated fixed-end `last` demotes the tour to an open path.
    pub fn remove(&mut self, visit: usize) -> Result<(), TourError> {
        self.check_range(visit)?;
        if visit == self.first {
            return Err(TourError::RemoveFirst(visit));
        }
        if !self.placed[visit] {
            return Err(TourError::NotPlaced(visit));
        }

        let p = self.prev[visit].expect("placed non-first visit has a predecessor");
        let n = self.next[visit];
        self.next[p] = n;
        if let Some(nv) = n {
            self.prev[nv] = Some(p);
        }
        self.next[visit] = None;
        self.prev[visit] = None;
        self.placed[visit] = false;
        self.count -= 1;
        if self.last == Some(visit) {
            self.last = None;
        }
        Ok(())
    }

    /// Unconditionally rewrites the successor of `from`.
    ///
    /// This is the atomic primitive under 2-opt/3-opt segment reversal. It
    /// updates the reverse index for the new target but leaves any orphaned
    /// links untouched; the caller must restore global chain validity by
    /// rewriting every edge of the new configuration.
    pub fn replace_edge_from(&mut self, from: usize, new_to: Option<usize>) {
        debug_assert!(from < self.next.len());
        self.next[from] = new_to;
        if let Some(t) = new_to {
            debug_assert!(t < self.next.len());
            self.prev[t] = Some(from);
        }
    }

    /// Relocates `visit` to the position immediately after `after`.
    ///
    /// Composed of two O(1) splices. Returns the three neighbours whose
    /// edges changed, so the caller can compute an exact cost delta.
    pub fn shift_after(&mut self, visit: usize, after: usize) -> Result<Shift, TourError> {
        self.check_range(visit)?;
        self.check_range(after)?;
        if visit == after {
            return Err(TourError::ShiftOntoSelf(visit));
        }
        if visit == self.first {
            return Err(TourError::RemoveFirst(visit));
        }
        if !self.placed[visit] {
            return Err(TourError::NotPlaced(visit));
        }
        if !self.placed[after] {
            return Err(TourError::NotPlaced(after));
        }

        let old_prev = self.prev[visit].expect("placed non-first visit has a predecessor");
        let old_next = self.next[visit];
        self.next[old_prev] = old_next;
        if let Some(n) = old_next {
            self.prev[n] = Some(old_prev);
        }

        // Read the target's successor after the splice so that shifting a
        // visit directly behind its own predecessor stays consistent.
        let new_next = self.next[after];
        self.next[after] = Some(visit);
        self.prev[visit] = Some(after);
        self.next[visit] = new_next;
        if let Some(nn) = new_next {
            self.prev[nn] = Some(visit);
        }

        Ok(Shift {
            old_prev,
            old_next,
            new_next,
        })
    }

    /// Visits strictly between `a` and `b`, walking forward from `a`.
    ///
    /// Terminates at `b`, at the open end, or after one full cycle.
    pub fn between(&self, a: usize, b: usize) -> Between<'_> {
        Between {
            tour: self,
            cur: self.next.get(a).copied().flatten(),
            from: a,
            to: b,
        }
    }

    /// Consecutive `(from, to)` edges, including the closing edge of a
    /// closed tour.
    pub fn pairs(&self) -> Pairs<'_> {
        Pairs {
            tour: self,
            cur: Some(self.first),
        }
    }

    /// Visits in tour order, starting at `first`.
    pub fn iter(&self) -> Visits<'_> {
        Visits {
            tour: self,
            cur: Some(self.first),
        }
    }

    /// Visit order as a vector, starting at `first`.
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Number of visits currently placed.
    pub fn len(&self) -> usize {
        self.count
    }

    /// A tour always contains at least its first visit.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Exclusive upper bound on visit ids.
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    /// Whether `visit` is currently placed.
    pub fn contains(&self, visit: usize) -> bool {
        self.placed.get(visit).copied().unwrap_or(false)
    }

    /// The anchor visit.
    pub fn first(&self) -> usize {
        self.first
    }

    /// The designated last visit, if any.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Whether the tour is a cycle.
    pub fn is_closed(&self) -> bool {
        self.last == Some(self.first)
    }

    /// Successor of `visit` (`Some(first)` for the tail of a closed tour).
    pub fn next_of(&self, visit: usize) -> Option<usize> {
        self.next.get(visit).copied().flatten()
    }

    /// Predecessor of `visit`.
    pub fn prev_of(&self, visit: usize) -> Option<usize> {
        self.prev.get(visit).copied().flatten()
    }

    /// Checks internal chain consistency: the walk from `first` covers every
    /// placed visit exactly once and every forward link has a matching
    /// reverse link.
    pub fn verify(&self) -> bool {
        let mut seen = 0usize;
        for v in self.iter() {
            if !self.placed[v] {
                return false;
            }
            if let Some(n) = self.next[v] {
                if self.prev[n] != Some(v) {
                    return false;
                }
            }
            seen += 1;
            if seen > self.count {
                return false;
            }
        }
        seen == self.count
    }
}

/// Forward iterator over the visits strictly between two visits.
pub struct Between<'a> {
    tour: &'a Tour,
    cur: Option<usize>,
    from: usize,
    to: usize,
}

impl Iterator for Between<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let c = self.cur?;
        if c == self.to || c == self.from {
            self.cur = None;
            return None;
        }
        self.cur = self.tour.next[c];
        Some(c)
    }
}

/// Iterator over consecutive edges.
pub struct Pairs<'a> {
    tour: &'a Tour,
    cur: Option<usize>,
}

impl Iterator for Pairs<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        let f = self.cur?;
        let t = self.tour.next[f]?;
        if t == f {
            // Singleton closed tour has no real edge.
            self.cur = None;
            return None;
        }
        self.cur = if t == self.tour.first { None } else { Some(t) };
        Some((f, t))
    }
}

/// Iterator over visits in tour order.
pub struct Visits<'a> {
    tour: &'a Tour,
    cur: Option<usize>,
}

impl Iterator for Visits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let v = self.cur?;
        self.cur = match self.tour.next[v] {
            Some(n) if n != self.tour.first => Some(n),
            _ => None,
        };
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_open() {
        let tour = Tour::new(5, 0, None).unwrap();
        assert_eq!(tour.to_vec(), vec![0]);
        assert_eq!(tour.len(), 1);
        assert!(!tour.is_closed());
        assert_eq!(tour.next_of(0), None);
    }

    #[test]
    fn test_new_closed() {
        let tour = Tour::new(5, 0, Some(0)).unwrap();
        assert!(tour.is_closed());
        assert_eq!(tour.to_vec(), vec![0]);
        // No real edge yet.
        assert_eq!(tour.pairs().count(), 0);
    }

    #[test]
    fn test_new_fixed_end() {
        let tour = Tour::new(5, 0, Some(4)).unwrap();
        assert_eq!(tour.to_vec(), vec![0, 4]);
        assert_eq!(tour.last(), Some(4));
        assert!(!tour.is_closed());
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(matches!(
            Tour::new(3, 7, None),
            Err(TourError::OutOfRange {
                visit: 7,
                capacity: 3
            })
        ));
    }

    #[test]
    fn test_insert_after_chain() {
        let mut tour = Tour::new(5, 0, None).unwrap();
        tour.insert_after(0, 1).unwrap();
        tour.insert_after(1, 2).unwrap();
        tour.insert_after(0, 3).unwrap();
        assert_eq!(tour.to_vec(), vec![0, 3, 1, 2]);
        assert!(tour.verify());
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let mut tour = Tour::new(5, 0, None).unwrap();
        tour.insert_after(0, 1).unwrap();
        assert_eq!(tour.insert_after(0, 1), Err(TourError::AlreadyPlaced(1)));
    }

    #[test]
    fn test_insert_after_missing_fails() {
        let mut tour = Tour::new(5, 0, None).unwrap();
        assert_eq!(tour.insert_after(3, 1), Err(TourError::NotPlaced(3)));
    }

    #[test]
    fn test_remove_relinks() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2, 3], None).unwrap();
        tour.remove(2).unwrap();
        assert_eq!(tour.to_vec(), vec![0, 1, 3]);
        assert!(!tour.contains(2));
        assert!(tour.verify());
    }

    #[test]
    fn test_remove_first_fails() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2], None).unwrap();
        assert_eq!(tour.remove(0), Err(TourError::RemoveFirst(0)));
    }

    #[test]
    fn test_remove_absent_fails() {
        let mut tour = Tour::from_sequence(5, &[0, 1], None).unwrap();
        assert_eq!(tour.remove(3), Err(TourError::NotPlaced(3)));
    }

    #[test]
    fn test_remove_fixed_last_demotes() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2], Some(2)).unwrap();
        tour.remove(2).unwrap();
        assert_eq!(tour.last(), None);
        assert_eq!(tour.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_closed_tour_pairs_include_closing_edge() {
        let tour = Tour::from_sequence(5, &[0, 1, 2, 3], Some(0)).unwrap();
        let edges: Vec<_> = tour.pairs().collect();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
    }

    #[test]
    fn test_open_tour_pairs() {
        let tour = Tour::from_sequence(5, &[0, 1, 2], None).unwrap();
        let edges: Vec<_> = tour.pairs().collect();
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_between() {
        let tour = Tour::from_sequence(6, &[0, 1, 2, 3, 4], Some(0)).unwrap();
        let mid: Vec<_> = tour.between(0, 4).collect();
        assert_eq!(mid, vec![1, 2, 3]);
        // Wraps across the closing edge.
        let wrap: Vec<_> = tour.between(3, 1).collect();
        assert_eq!(wrap, vec![4, 0]);
        // Adjacent visits have nothing between them.
        assert_eq!(tour.between(1, 2).count(), 0);
    }

    #[test]
    fn test_shift_after_scenario() {
        // [1,2,3,4,5], first = 1; moving 2 after 4 yields [1,3,4,2,5].
        let mut tour = Tour::from_sequence(6, &[1, 2, 3, 4, 5], None).unwrap();
        let shift = tour.shift_after(2, 4).unwrap();
        assert_eq!(tour.to_vec(), vec![1, 3, 4, 2, 5]);
        assert_eq!(shift.old_prev, 1);
        assert_eq!(shift.old_next, Some(3));
        assert_eq!(shift.new_next, Some(5));
        assert!(tour.verify());
    }

    #[test]
    fn test_shift_onto_self_fails() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2], None).unwrap();
        assert_eq!(tour.shift_after(1, 1), Err(TourError::ShiftOntoSelf(1)));
    }

    #[test]
    fn test_shift_first_fails() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2], None).unwrap();
        assert_eq!(tour.shift_after(0, 2), Err(TourError::RemoveFirst(0)));
    }

    #[test]
    fn test_shift_behind_own_predecessor() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2, 3], None).unwrap();
        // Shifting 2 after 1 (its current predecessor) is a no-move.
        tour.shift_after(2, 1).unwrap();
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3]);
        assert!(tour.verify());
    }

    #[test]
    fn test_replace_edge_from_reversal() {
        // Reverse the segment 1..3 of the closed tour 0-1-2-3: every edge of
        // the new configuration is rewritten explicitly.
        let mut tour = Tour::from_sequence(4, &[0, 1, 2, 3], Some(0)).unwrap();
        tour.replace_edge_from(0, Some(3));
        tour.replace_edge_from(3, Some(2));
        tour.replace_edge_from(2, Some(1));
        tour.replace_edge_from(1, Some(0));
        assert_eq!(tour.to_vec(), vec![0, 3, 2, 1]);
        assert!(tour.verify());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut tour = Tour::from_sequence(5, &[0, 1, 2], Some(0)).unwrap();
        let snapshot = tour.clone();
        tour.insert_after(1, 4).unwrap();
        assert_eq!(snapshot.to_vec(), vec![0, 1, 2]);
        assert_eq!(tour.to_vec(), vec![0, 1, 4, 2]);
    }

    #[test]
    fn test_from_sequence_invalid_last() {
        assert!(matches!(
            Tour::from_sequence(5, &[0, 1, 2], Some(1)),
            Err(TourError::InvalidAnchors(_))
        ));
    }

    proptest! {
        /// Random insert/remove/shift programs keep the visit multiset exact
        /// and never move `first`.
        #[test]
        fn prop_tour_integrity(ops in proptest::collection::vec((0u8..3, 0usize..8, 0usize..8), 1..40)) {
            let capacity = 8;
            let mut tour = Tour::new(capacity, 0, Some(0)).unwrap();
            let mut expected: Vec<usize> = vec![0];

            for (op, a, b) in ops {
                match op {
                    0 => {
                        // insert b after a
                        if expected.contains(&a) && !expected.contains(&b) {
                            tour.insert_after(a, b).unwrap();
                            expected.push(b);
                        }
                    }
                    1 => {
                        // remove a
                        if a != 0 && expected.contains(&a) {
                            tour.remove(a).unwrap();
                            expected.retain(|&v| v != a);
                        }
                    }
                    _ => {
                        // shift a after b
                        if a != 0 && a != b && expected.contains(&a) && expected.contains(&b) {
                            tour.shift_after(a, b).unwrap();
                        }
                    }
                }
                prop_assert!(tour.verify());
                prop_assert_eq!(tour.first(), 0);
                prop_assert_eq!(tour.len(), expected.len());
                let mut placed = tour.to_vec();
                placed.sort_unstable();
                let mut want = expected.clone();
                want.sort_unstable();
                prop_assert_eq!(placed, want);
            }
        }
    }
}
