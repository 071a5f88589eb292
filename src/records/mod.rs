//! # Matrix Row Encodings with O(1) Positional Access
//!
//! This module provides zero-copy views over single matrix rows. A row is a
//! list of `(column id, value)` pairs; values are stored as 16-bit codes and
//! unpacked on access through the matrix's [`ValueConf`](crate::ValueConf).
//!
//! ## Sparse Row Layout
//!
//! ```text
//! +-----------+-----------+-----------+---------------------+-----------------------+
//! | magic u32 | row i32   | ncols u32 | col ids [i32; n]    | packed vals [i16; n]  |
//! +-----------+-----------+-----------+---------------------+-----------------------+
//! ```
//!
//! Column ids are kept in insertion order and are not sorted. Looking up a
//! column by id is a linear scan over the ids ([`MatrixRow::find_col`]).
//!
//! ## Dense Row Layout
//!
//! ```text
//! +-----------------------+
//! | packed vals [i16; n]  |   column ids come from the matrix header
//! +-----------------------+
//! ```
//!
//! ## Ownership
//!
//! Row types are generic over their byte storage. Rows read from a matrix
//! wrap [`RowBytes`](crate::storage::RowBytes), which keeps the backing page
//! mapping alive for as long as the row exists. Rows built in memory for a
//! writer own a `Vec<u8>`.
//!
//! ## Module Structure
//!
//! - `sparse`: [`SparseRow`] construction and decoding
//! - `dense`: [`DenseRow`] construction and decoding

pub mod dense;
pub mod sparse;

pub use dense::DenseRow;
pub use sparse::SparseRow;

use crate::{ColId, RowId};

/// Read access shared by every row representation.
pub trait MatrixRow {
    fn row_index(&self) -> RowId;

    fn num_cols(&self) -> usize;

    /// Column id at position `i`. Panics if `i >= num_cols()`.
    fn col_id_at(&self, i: usize) -> ColId;

    /// Unpacked value at position `i`. Panics if `i >= num_cols()`.
    fn value_at(&self, i: usize) -> f32;

    fn is_empty(&self) -> bool {
        self.num_cols() == 0
    }

    /// Position of `col_id`, scanning ids in storage order.
    fn find_col(&self, col_id: ColId) -> Option<usize> {
        (0..self.num_cols()).find(|&i| self.col_id_at(i) == col_id)
    }

    fn value_for(&self, col_id: ColId) -> Option<f32> {
        self.find_col(col_id).map(|i| self.value_at(i))
    }

    fn entries(&self) -> Vec<(ColId, f32)> {
        (0..self.num_cols())
            .map(|i| (self.col_id_at(i), self.value_at(i)))
            .collect()
    }
}
