//! # Matrix Options
//!
//! `MatrixOptions` configures how a matrix file is opened: the page size
//! budget of the paging index, the bound on simultaneously mapped pages,
//! and the policy applied when a row fails to decode during iteration.
//!
//! ```ignore
//! let matrix = SparseMatrix::open_with(
//!     "links.matrix",
//!     MatrixOptions::new()
//!         .max_page_size(64 << 20)
//!         .max_open_pages(16)
//!         .on_decode_error(|_, _| DecodeAction::Abort),
//! )?;
//! ```

use std::fmt;
use std::sync::Arc;

use eyre::{bail, Report, Result};

use crate::config::{DEFAULT_MAX_OPEN_PAGES, DEFAULT_MAX_PAGE_SIZE};
use crate::error::MatrixError;
use crate::RowId;

/// What iteration does after a row fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAction {
    Skip,
    Abort,
}

/// Called with the failing row id and its error during iteration.
pub type DecodeErrorHandler = Arc<dyn Fn(RowId, &Report) -> DecodeAction + Send + Sync>;

/// Logs the failure and skips the row.
pub fn warn_and_skip() -> DecodeErrorHandler {
    Arc::new(|row_id, err| {
        log::warn!("skipping row {} that failed to decode: {:#}", row_id, err);
        DecodeAction::Skip
    })
}

#[derive(Clone)]
pub struct MatrixOptions {
    max_page_size: u64,
    max_open_pages: usize,
    on_decode_error: DecodeErrorHandler,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixOptions {
    pub fn new() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_open_pages: DEFAULT_MAX_OPEN_PAGES,
            on_decode_error: warn_and_skip(),
        }
    }

    /// Upper bound on the byte span of one mapped page. A single row larger
    /// than this still gets a page of its own.
    pub fn max_page_size(mut self, bytes: u64) -> Self {
        self.max_page_size = bytes;
        self
    }

    /// Upper bound on the number of pages mapped at the same time.
    pub fn max_open_pages(mut self, pages: usize) -> Self {
        self.max_open_pages = pages;
        self
    }

    pub fn on_decode_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(RowId, &Report) -> DecodeAction + Send + Sync + 'static,
    {
        self.on_decode_error = Arc::new(handler);
        self
    }

    pub fn page_size_limit(&self) -> u64 {
        self.max_page_size
    }

    pub fn open_pages_limit(&self) -> usize {
        self.max_open_pages
    }

    pub fn decode_error_handler(&self) -> &DecodeErrorHandler {
        &self.on_decode_error
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            bail!(MatrixError::encoding("max_page_size must be greater than 0"));
        }
        if self.max_open_pages == 0 {
            bail!(MatrixError::encoding("max_open_pages must be greater than 0"));
        }
        Ok(())
    }
}

impl fmt::Debug for MatrixOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixOptions")
            .field("max_page_size", &self.max_page_size)
            .field("max_open_pages", &self.max_open_pages)
            .finish_non_exhaustive()
    }
}
