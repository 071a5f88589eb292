//! # Matrix Engine Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships. Constants that depend
//! on each other are co-located to prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! MATRIX_HEADER_SIZE (16 bytes: magic, min, max, numRows)
//!       │
//!       ├─> ROW_TABLE_ENTRY_SIZE (12 bytes: rowId i32 + offset u64)
//!       │     The row table follows the fixed header directly.
//!       │
//!       └─> dense files append [numCols u32][colIds i32 × numCols]
//!
//! SPARSE_ROW_HEADER_SIZE (12 bytes: magic, rowIndex, numCols)
//!       │
//!       └─> SPARSE_ROW_ENTRY_SIZE (6 bytes: colId i32 + packed i16)
//!
//! ROW_ALIGNMENT (8)
//!       └─> writers pad every row body up to this boundary
//!
//! COSIM_MIN_EXPANSION_BASE (500)
//!       └─> COSIM_EXPANSION_FRACTION (1.3)
//!             new capacity = max(base, size) * fraction
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `PACKED_RANGE == i16::MAX - i16::MIN` (the full signed 16-bit span)
//! 2. `DEFAULT_MIN_VALUE < DEFAULT_MAX_VALUE`
//! 3. `ROW_ALIGNMENT` is a power of two

// ============================================================================
// FILE FORMAT CONSTANTS
// Magic numbers and fixed-size sections of the on-disk matrix formats
// ============================================================================

/// Magic number opening every dense matrix file.
pub const DENSE_FILE_MAGIC: u32 = 0x00AB_CCBA;

/// Magic number opening every sparse matrix file.
pub const SPARSE_FILE_MAGIC: u32 = 0x00AB_CDEF;

/// Magic number opening every sparse row body.
/// A row whose first word differs is corrupt.
pub const SPARSE_ROW_MAGIC: u32 = 0xFEFE_FEFE;

/// Fixed file header: magic, minValue, maxValue, numRows.
pub const MATRIX_HEADER_SIZE: usize = 16;

/// One row table entry: row id (i32) followed by absolute offset (u64).
pub const ROW_TABLE_ENTRY_SIZE: usize = 12;

/// Sparse row prefix: magic, row index, column count.
pub const SPARSE_ROW_HEADER_SIZE: usize = 12;

/// Bytes per sparse row column: 4-byte id plus 2-byte packed value.
pub const SPARSE_ROW_ENTRY_SIZE: usize = 6;

/// Bytes per dense row column: a single packed value.
pub const DENSE_ROW_ENTRY_SIZE: usize = 2;

/// Writers pad row bodies so every row starts on this boundary.
pub const ROW_ALIGNMENT: u64 = 8;

/// Filler byte written between row bodies.
pub const ROW_PADDING: u8 = 0x80;

const _: () = assert!(
    ROW_ALIGNMENT.is_power_of_two(),
    "ROW_ALIGNMENT must be a power of two"
);

const _: () = assert!(
    SPARSE_ROW_ENTRY_SIZE == 4 + DENSE_ROW_ENTRY_SIZE,
    "SPARSE_ROW_ENTRY_SIZE derivation mismatch"
);

// ============================================================================
// VALUE PACKING
// Quantization of scores into signed 16-bit codes
// ============================================================================

/// Number of quantization steps across the configured value range.
pub const PACKED_RANGE: f64 = (i16::MAX as i32 - i16::MIN as i32) as f64;

/// Default lower bound of the packed value range.
pub const DEFAULT_MIN_VALUE: f32 = -1.1;

/// Default upper bound of the packed value range.
pub const DEFAULT_MAX_VALUE: f32 = 1.1;

const _: () = assert!(
    (i16::MAX as i32 - i16::MIN as i32) == 65535,
    "PACKED_RANGE must span the full i16 domain"
);

const _: () = assert!(
    DEFAULT_MIN_VALUE < DEFAULT_MAX_VALUE,
    "default value range is empty"
);

// ============================================================================
// PAGING CONFIGURATION
// Bounds on memory-mapped page size and the number of resident pages
// ============================================================================

/// Default maximum span of one mapped page (1 GiB).
/// A single row larger than this still gets a page of its own.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 1024 * 1024 * 1024;

/// Default number of pages that may be mapped at once (unbounded).
pub const DEFAULT_MAX_OPEN_PAGES: usize = usize::MAX;

// ============================================================================
// COSIMILARITY CACHE
// Geometric growth of the in-memory dense similarity matrix
// ============================================================================

/// Lower bound used when computing the next capacity.
pub const COSIM_MIN_EXPANSION_BASE: usize = 500;

/// Growth factor applied on every expansion.
pub const COSIM_EXPANSION_FRACTION: f64 = 1.3;

// ============================================================================
// TRANSPOSE CONFIGURATION
// ============================================================================

/// Default byte budget for one batch of transposed columns (256MB).
pub const DEFAULT_TRANSPOSE_BUFFER: usize = 256 * 1024 * 1024;

/// Estimated fixed bookkeeping cost of one accumulated column.
pub const TRANSPOSE_COLUMN_OVERHEAD: usize = 64;
