//! # wikimatrix - Memory-Mapped Similarity Matrices
//!
//! wikimatrix stores large row-major score matrices (article links, semantic
//! relatedness vectors) in a compact binary format and serves individual
//! rows from memory-mapped pages. This implementation prioritizes:
//!
//! - **Zero-copy row access**: rows are views into a page mapping
//! - **Bounded address space**: a fixed number of pages is mapped at once
//! - **Compact values**: scores are packed into 16-bit codes
//!
//! ## Quick Start
//!
//! ```ignore
//! use wikimatrix::{DenseMatrix, DenseMatrixWriter, Matrix, MatrixRow, ValueConf};
//!
//! let mut writer = DenseMatrixWriter::create("sr.matrix", ValueConf::default(), &[10, 20])?;
//! writer.write(7, &[0.42, -0.13])?;
//! writer.finish()?;
//!
//! let matrix = DenseMatrix::open("sr.matrix")?;
//! if let Some(row) = matrix.get_row(7)? {
//!     println!("{}", row.value_at(0));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐   ┌──────────────────────┐
//! │   Matrix (DenseMatrix/SparseMatrix)  │   │ CosimilarityMatrix   │
//! ├─────────────────────────────────────┤   │  growable, id-mapped │
//! │   Row views (DenseRow/SparseRow)     │   │  top-k leaderboard   │
//! ├─────────────────────────────────────┤   └──────────────────────┘
//! │   ValueConf (16-bit packing)         │
//! ├─────────────────────────────────────┤
//! │   PagedMmap (row-aligned pages, LRU) │
//! ├─────────────────────────────────────┤
//! │   File format (headers, writers)     │
//! └─────────────────────────────────────┘
//! ```
//!
//! Matrix files are built once by a writer and then only read. The
//! cosimilarity cache is independent of the file layer and lives in memory
//! for one similarity-computation session.
//!
//! ## Module Overview
//!
//! - [`config`]: format constants and defaults
//! - [`encoding`]: value packing and little-endian readers
//! - [`records`]: dense and sparse row views
//! - [`storage`]: file headers, paging, writers
//! - [`matrix`]: read API over matrix files
//! - [`cosim`]: the cosimilarity cache
//! - [`error`]: `MatrixError`

#[macro_use]
mod macros;

pub mod config;
pub mod cosim;
pub mod encoding;
pub mod error;
pub mod matrix;
pub mod records;
pub mod storage;

/// Row id as stored in the row table.
pub type RowId = i32;
/// Column id as stored in sparse rows and the dense column list.
pub type ColId = i32;
/// Externally meaningful id used as a key of the cosimilarity cache.
pub type SparseId = i32;

pub use cosim::{CosimilarityConfig, CosimilarityMatrix};
pub use encoding::ValueConf;
pub use error::MatrixError;
pub use matrix::{
    DecodeAction, DecodeErrorHandler, DenseMatrix, DenseMatrixRow, InMemorySparseMatrix,
    InMemorySparseRow, Matrix, MatrixIter, MatrixOptions, SparseMatrix, SparseMatrixRow,
    SparseMatrixTransposer,
};
pub use records::{DenseRow, MatrixRow, SparseRow};
pub use storage::{DenseMatrixWriter, PagedMmap, RowBytes, SparseMatrixWriter};
