//! # Matrix Error Types
//!
//! Every fallible operation in this crate returns `eyre::Result`. Failures
//! that callers are expected to react to are raised as a [`MatrixError`]
//! and can be recovered from a report with `downcast_ref`:
//!
//! ```ignore
//! match DenseMatrix::open(&path) {
//!     Err(report) => match report.downcast_ref::<MatrixError>() {
//!         Some(MatrixError::InvalidFormat { .. }) => { /* not a matrix file */ }
//!         _ => { /* io error, propagate */ }
//!     },
//!     Ok(matrix) => { /* ... */ }
//! }
//! ```
//!
//! Operating system errors (missing file, permissions, mmap failures) are not
//! wrapped in `MatrixError`; they surface as `std::io::Error` with path
//! context attached.
//!
//! Absence is never an error: unknown row ids and unknown cache ids are
//! reported as `None`, `0.0` or an empty list.

use std::fmt;
use std::path::PathBuf;

use crate::RowId;

#[derive(Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// The file is not a matrix of the expected kind, or its header is
    /// internally inconsistent.
    InvalidFormat { path: PathBuf, reason: String },
    /// A row is listed in the row table but its body cannot be decoded.
    CorruptRow { row_id: RowId, reason: String },
    /// Invalid construction input or configuration.
    Encoding(String),
}

impl MatrixError {
    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt_row(row_id: RowId, reason: impl Into<String>) -> Self {
        Self::CorruptRow {
            row_id,
            reason: reason.into(),
        }
    }

    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding(reason.into())
    }

    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }

    pub fn is_corrupt_row(&self) -> bool {
        matches!(self, Self::CorruptRow { .. })
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat { path, reason } => {
                write!(f, "invalid matrix file '{}': {}", path.display(), reason)
            }
            Self::CorruptRow { row_id, reason } => {
                write!(f, "corrupt row {}: {}", row_id, reason)
            }
            Self::Encoding(reason) => write!(f, "encoding error: {}", reason),
        }
    }
}

impl std::error::Error for MatrixError {}
