//! # Cosimilarity Matrix
//!
//! A growable, thread-safe, dense similarity matrix keyed by sparse ids.
//!
//! ## Layout
//!
//! ```text
//! sparse_to_dense: HashMap<SparseId, usize>     id ─> slot
//! dense_to_sparse: Vec<SparseId>                slot ─> id
//! completed:       Vec<bool>                    slot ─> update() finished
//! cells:           Arc<Cells>                   capacity × capacity f32
//! ```
//!
//! Slots are handed out in insertion order. The cell array is allocated
//! with spare capacity; when a new id arrives and every slot is taken it is
//! replaced by a larger array of `max(base, len) × fraction` slots per side
//! and the old values are copied over.
//!
//! ## Concurrency
//!
//! Structural state sits behind one `parking_lot::RwLock`. `update` holds the
//! write lock for its whole duration, so updates and growth never interleave.
//! Readers hold the read lock only long enough to resolve ids to slots and
//! clone the `Arc<Cells>`; the cell reads happen after the lock is released.
//!
//! Cells are `AtomicU32` holding `f32` bits, so a read never observes a torn
//! value. A reader racing with `update` may see a pair before or after it is
//! written, and a reader racing with growth keeps reading the old array.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use super::leaderboard::Leaderboard;
use crate::config::{COSIM_EXPANSION_FRACTION, COSIM_MIN_EXPANSION_BASE};
use crate::SparseId;

/// Growth policy of a [`CosimilarityMatrix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosimilarityConfig {
    /// Lower bound on the size that the growth fraction is applied to.
    pub min_expansion_base: usize,
    pub expansion_fraction: f64,
}

impl Default for CosimilarityConfig {
    fn default() -> Self {
        Self {
            min_expansion_base: COSIM_MIN_EXPANSION_BASE,
            expansion_fraction: COSIM_EXPANSION_FRACTION,
        }
    }
}

impl CosimilarityConfig {
    /// Capacity after growing from `len` occupied slots. Always larger than
    /// `len`.
    pub fn next_capacity(&self, len: usize) -> usize {
        let grown = (self.min_expansion_base.max(len) as f64 * self.expansion_fraction) as usize;
        grown.max(len + 1)
    }
}

struct Cells {
    capacity: usize,
    data: Box<[AtomicU32]>,
}

impl Cells {
    fn new(capacity: usize) -> Self {
        let data = (0..capacity * capacity)
            .map(|_| AtomicU32::new(0f32.to_bits()))
            .collect();
        Self { capacity, data }
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f32 {
        f32::from_bits(self.data[row * self.capacity + col].load(Ordering::Relaxed))
    }

    #[inline]
    fn set(&self, row: usize, col: usize, value: f32) {
        self.data[row * self.capacity + col].store(value.to_bits(), Ordering::Relaxed);
    }

    /// A copy with a larger capacity holding the first `len` × `len` values.
    fn grown(&self, capacity: usize, len: usize) -> Self {
        let next = Self::new(capacity);
        for row in 0..len {
            for col in 0..len {
                next.set(row, col, self.get(row, col));
            }
        }
        next
    }
}

#[derive(Default)]
struct State {
    sparse_to_dense: HashMap<SparseId, usize>,
    dense_to_sparse: Vec<SparseId>,
    completed: Vec<bool>,
    cells: Arc<Cells>,
}

impl Default for Cells {
    fn default() -> Self {
        Self::new(0)
    }
}

pub struct CosimilarityMatrix {
    config: CosimilarityConfig,
    state: RwLock<State>,
}

impl Default for CosimilarityMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl CosimilarityMatrix {
    pub fn new() -> Self {
        Self::with_config(CosimilarityConfig::default())
    }

    pub fn with_config(config: CosimilarityConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::default()),
        }
    }

    /// Stores the similarities of `id` to its `neighbors` and marks `id`
    /// completed.
    ///
    /// Each score is written to both `[id][neighbor]` and `[neighbor][id]`.
    /// Neighbors that are not yet in the matrix are skipped; the pair is
    /// filled in when the neighbor's own row is stored.
    pub fn update<I>(&self, id: SparseId, neighbors: I)
    where
        I: IntoIterator<Item = (SparseId, f32)>,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let slot = match state.sparse_to_dense.get(&id).copied() {
            Some(slot) => slot,
            None => self.insert(state, id),
        };

        let cells = Arc::clone(&state.cells);
        for (neighbor, score) in neighbors {
            if let Some(&other) = state.sparse_to_dense.get(&neighbor) {
                cells.set(slot, other, score);
                cells.set(other, slot, score);
            }
        }
        state.completed[slot] = true;
    }

    fn insert(&self, state: &mut State, id: SparseId) -> usize {
        let slot = state.dense_to_sparse.len();
        if slot >= state.cells.capacity {
            let capacity = self.config.next_capacity(slot);
            log::info!("expanding cosimilarity matrix to length {}", capacity);
            state.cells = Arc::new(state.cells.grown(capacity, slot));
            log::info!("finished expanding cosimilarity matrix");
        }
        state.sparse_to_dense.insert(id, slot);
        state.dense_to_sparse.push(id);
        state.completed.push(false);
        slot
    }

    /// Cached similarity of two ids, or `0.0` if either is absent.
    pub fn similarity(&self, id1: SparseId, id2: SparseId) -> f32 {
        let (slots, cells) = {
            let state = self.state.read();
            let slots = state
                .sparse_to_dense
                .get(&id1)
                .zip(state.sparse_to_dense.get(&id2))
                .map(|(&a, &b)| (a, b));
            (slots, Arc::clone(&state.cells))
        };
        slots.map_or(0.0, |(a, b)| cells.get(a, b))
    }

    /// The `k` highest-scoring neighbors of `id`, best first.
    ///
    /// With `candidates`, only those ids are ranked; candidates absent from
    /// the matrix are ignored. An absent `id` yields an empty list.
    pub fn most_similar(
        &self,
        id: SparseId,
        k: usize,
        candidates: Option<&HashSet<SparseId>>,
    ) -> Vec<(SparseId, f32)> {
        let (slot, pool, ids, cells) = {
            let state = self.state.read();
            let Some(&slot) = state.sparse_to_dense.get(&id) else {
                return Vec::new();
            };
            let pool: Option<Vec<usize>> = candidates.map(|c| {
                c.iter()
                    .filter_map(|cand| state.sparse_to_dense.get(cand).copied())
                    .collect()
            });
            (slot, pool, state.dense_to_sparse.clone(), Arc::clone(&state.cells))
        };

        let mut board = Leaderboard::new(k);
        match pool {
            Some(pool) => pool.into_iter().for_each(|i| board.tally(i, cells.get(slot, i))),
            None => (0..ids.len()).for_each(|i| board.tally(i, cells.get(slot, i))),
        }

        board
            .into_sorted()
            .into_iter()
            .map(|e| (ids[e.index], e.score))
            .collect()
    }

    /// Similarities of every `(row, col)` pair; `0.0` where either id is
    /// absent.
    pub fn cosimilarity(&self, rows: &[SparseId], cols: &[SparseId]) -> Vec<Vec<f32>> {
        let (row_slots, col_slots, cells) = {
            let state = self.state.read();
            let resolve = |ids: &[SparseId]| -> Vec<Option<usize>> {
                ids.iter()
                    .map(|id| state.sparse_to_dense.get(id).copied())
                    .collect()
            };
            (resolve(rows), resolve(cols), Arc::clone(&state.cells))
        };

        row_slots
            .iter()
            .map(|r| {
                col_slots
                    .iter()
                    .map(|c| match (r, c) {
                        (Some(r), Some(c)) => cells.get(*r, *c),
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect()
    }

    /// Ids whose own `update` has completed, as opposed to ids that only
    /// appear as neighbors of others.
    pub fn completed(&self) -> HashSet<SparseId> {
        let state = self.state.read();
        state
            .completed
            .iter()
            .zip(&state.dense_to_sparse)
            .filter(|&(&done, _)| done)
            .map(|(_, &id)| id)
            .collect()
    }

    pub fn is_completed(&self, id: SparseId) -> bool {
        let state = self.state.read();
        state
            .sparse_to_dense
            .get(&id)
            .is_some_and(|&slot| state.completed[slot])
    }

    /// Similarities of `id` to every id in slot order, or `None` if absent.
    pub fn vector(&self, id: SparseId) -> Option<Vec<f32>> {
        let (slot, len, cells) = {
            let state = self.state.read();
            let slot = *state.sparse_to_dense.get(&id)?;
            (slot, state.dense_to_sparse.len(), Arc::clone(&state.cells))
        };
        Some((0..len).map(|i| cells.get(slot, i)).collect())
    }

    /// Ids in slot order, matching the positions of [`vector`](Self::vector).
    pub fn ids(&self) -> Vec<SparseId> {
        self.state.read().dense_to_sparse.clone()
    }

    pub fn contains(&self, id: SparseId) -> bool {
        self.state.read().sparse_to_dense.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state.read().dense_to_sparse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots per side of the backing array.
    pub fn capacity(&self) -> usize {
        self.state.read().cells.capacity
    }
}
