//! Bounded top-k selection over `(index, score)` pairs.
//!
//! The board keeps at most `k` entries in a min-heap keyed on score, so the
//! weakest entry is always at the top and is replaced when a better score
//! arrives. Selecting from `n` tallies costs `O(n log k)` instead of a full
//! sort.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
pub struct Scored {
    pub index: usize,
    pub score: f32,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lower score ranks higher, so a `BinaryHeap<Scored>` pops the worst entry.
/// Equal scores prefer the lower index.
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.index.cmp(&other.index))
    }
}

pub struct Leaderboard {
    capacity: usize,
    heap: BinaryHeap<Scored>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1).min(1024)),
        }
    }

    /// Records a score. NaN scores are ignored.
    pub fn tally(&mut self, index: usize, score: f32) {
        if self.capacity == 0 || score.is_nan() {
            return;
        }
        let entry = Scored { index, score };
        if self.heap.len() < self.capacity {
            self.heap.push(entry);
        } else if let Some(worst) = self.heap.peek() {
            if entry < *worst {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in descending score order.
    pub fn into_sorted(self) -> Vec<Scored> {
        // ascending under the reversed ordering is descending by score
        self.heap.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_best_k_in_descending_order() {
        let mut board = Leaderboard::new(2);
        for (i, s) in [0.9, 0.95, 0.1, 0.3].into_iter().enumerate() {
            board.tally(i, s);
        }

        let top: Vec<_> = board.into_sorted().iter().map(|e| (e.index, e.score)).collect();
        assert_eq!(top, vec![(1, 0.95), (0, 0.9)]);
    }

    #[test]
    fn zero_capacity_and_nan_are_ignored() {
        let mut board = Leaderboard::new(0);
        board.tally(0, 1.0);
        assert!(board.is_empty());

        let mut board = Leaderboard::new(3);
        board.tally(0, f32::NAN);
        board.tally(1, -0.5);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn ties_prefer_lower_index() {
        let mut board = Leaderboard::new(2);
        board.tally(5, 0.5);
        board.tally(2, 0.5);
        board.tally(9, 0.5);

        let idx: Vec<_> = board.into_sorted().iter().map(|e| e.index).collect();
        assert_eq!(idx, vec![2, 5]);
    }
}
