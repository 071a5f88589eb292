//! # Storage Module
//!
//! This module provides the on-disk layer of the matrix engine: the binary
//! file format, the row-aligned paging index and the memory-mapped reader
//! that serves row bytes with a bounded number of live mappings.
//!
//! ## Architecture Overview
//!
//! Matrix files are built once by a writer and then opened read-only for the
//! rest of the process. Instead of reading rows through buffered I/O, the
//! reader maps regions of the file directly into the address space:
//!
//! - **Zero-copy reads**: rows are views into a shared page mapping
//! - **Bounded address space**: at most `max_open_pages` pages are mapped
//! - **Row-aligned pages**: a page boundary never splits a row
//!
//! ## File Layout
//!
//! ```text
//! ┌────────────────────────────────────┐  offset 0
//! │ magic │ min f32 │ max f32 │ nrows  │  16 bytes
//! ├────────────────────────────────────┤
//! │ row table: (rowId i32, offset u64) │  12 × nrows
//! ├────────────────────────────────────┤
//! │ dense only: ncols u32, colIds      │  4 + 4 × ncols
//! ├────────────────────────────────────┤  first row offset
//! │ row bodies, 8-byte aligned         │
//! │   page 0 ┊ page 1 ┊ ... ┊ page n   │  split at row offsets
//! └────────────────────────────────────┘  end of file
//! ```
//!
//! ## Safety Model
//!
//! Memory-mapped regions must outlive every slice handed out from them.
//! Rather than tying row lifetimes to a borrow of the reader, each row holds
//! an `Arc` of its page's mapping ([`RowBytes`]). Evicting a page drops the
//! reader's reference only; the OS mapping goes away with the last row that
//! still points into it.
//!
//! ## Module Organization
//!
//! - `headers`: zerocopy structs for the file header and row table
//! - `page`: page ranges and the row-aligned page construction
//! - `mmap`: `PagedMmap`, lazy mapping and LRU eviction
//! - `writer`: `SparseMatrixWriter` and `DenseMatrixWriter`
//!
//! ## Platform Support
//!
//! Uses `memmap2` crate which supports:
//! - Linux (mmap/munmap)
//! - macOS (mmap/munmap)
//! - Windows (CreateFileMapping/MapViewOfFile)

pub mod headers;
mod mmap;
mod page;
mod writer;

pub use headers::{MatrixFileHeader, RowTableEntry};
pub use mmap::{map_region, PagedMmap, RowBytes};
pub use page::{build_pages, Page};
pub use writer::{DenseMatrixWriter, SparseMatrixWriter};
