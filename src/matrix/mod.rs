//! # Matrix Module
//!
//! Read-only, file-backed matrices. A matrix file is opened once, its header
//! and row table are parsed, and rows are then served on demand from the
//! paged memory map.
//!
//! ## Variants
//!
//! - [`DenseMatrix`]: every row has a value for every column of one shared,
//!   matrix-wide column id list; row bodies hold only packed values.
//! - [`SparseMatrix`]: every row carries its own column ids.
//! - [`InMemorySparseMatrix`]: a sparse matrix loaded fully into RAM, with
//!   optional remapping of ids to a contiguous range.
//!
//! Both implement [`Matrix`], which gives row lookup by id, the list of row
//! ids in file-storage order and lazy iteration.
//!
//! ## Errors
//!
//! | Situation                                   | Result                     |
//! |---------------------------------------------|----------------------------|
//! | unknown row id                              | `Ok(None)`                 |
//! | bad magic, truncated header or row table    | `MatrixError::InvalidFormat` on open |
//! | offset past EOF, bad row header, short body | `MatrixError::CorruptRow` from `get_row` |
//! | file system failure                         | `std::io::Error` in the report |
//!
//! During iteration a failing row is handed to the decode-error handler of
//! [`MatrixOptions`], which either skips it or stops the scan.

mod dense;
mod in_memory;
mod iter;
mod layout;
mod options;
mod sparse;
mod transpose;

pub use dense::{DenseMatrix, DenseMatrixRow};
pub use in_memory::{InMemorySparseMatrix, InMemorySparseRow};
pub use iter::MatrixIter;
pub use options::{warn_and_skip, DecodeAction, DecodeErrorHandler, MatrixOptions};
pub use sparse::{SparseMatrix, SparseMatrixRow};
pub use transpose::SparseMatrixTransposer;

use std::path::Path;

use eyre::Result;

use crate::encoding::ValueConf;
use crate::records::MatrixRow;
use crate::RowId;

/// Read access shared by dense and sparse matrices.
pub trait Matrix {
    type Row: MatrixRow;

    /// Returns the row stored under `row_id`, or `None` if the id is not in
    /// the row table.
    fn get_row(&self, row_id: RowId) -> Result<Option<Self::Row>>;

    /// All row ids in file-storage order.
    fn row_ids(&self) -> &[RowId];

    fn value_conf(&self) -> &ValueConf;

    fn path(&self) -> &Path;

    fn decode_error_handler(&self) -> &DecodeErrorHandler;

    fn num_rows(&self) -> usize {
        self.row_ids().len()
    }

    /// Iterates rows in [`row_ids`](Self::row_ids) order. Each call starts
    /// again from the first row.
    fn iter(&self) -> MatrixIter<'_, Self>
    where
        Self: Sized,
    {
        MatrixIter::new(self)
    }
}
