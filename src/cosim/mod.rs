//! # Cosimilarity Cache
//!
//! In-memory memoization of pairwise similarity scores. Similarity metrics
//! store every row of scores they compute with [`CosimilarityMatrix::update`]
//! and consult the cache before recomputing.
//!
//! A score of `0.0` means either "dissimilar" or "never computed". Callers
//! tell the two apart with [`CosimilarityMatrix::completed`].
//!
//! ## Module Structure
//!
//! - `matrix`: the growable dense matrix and its id remapping
//! - `leaderboard`: bounded top-k selection used by `most_similar`

mod leaderboard;
mod matrix;

pub use leaderboard::{Leaderboard, Scored};
pub use matrix::{CosimilarityConfig, CosimilarityMatrix};
