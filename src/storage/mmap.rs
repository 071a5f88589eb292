//! # Paged Memory Map
//!
//! `PagedMmap` serves read-only byte views of individual rows from a matrix
//! file while bounding how many regions of that file are mapped at once.
//!
//! ## Design
//!
//! The file is split into row-aligned [`Page`]s when the matrix is opened
//! (see [`build_pages`]). A page is mapped lazily the first time one of its
//! rows is requested. When the matrix has more pages than `max_open_pages`,
//! each access records the page in an LRU queue and the least recently used
//! page is unmapped once the bound is exceeded.
//!
//! ```text
//! get_row(id)
//!   │
//!   ├─> offsets[id]                 absent ⇒ Ok(None)
//!   ├─> page containing offset      linear scan, pages are few
//!   └─> lock page table
//!         ├─> map page if needed
//!         ├─> touch LRU, unmap evicted page
//!         └─> clone Arc<Mmap>       RowBytes keeps it alive
//! ```
//!
//! ## Safety Model
//!
//! Mapping, LRU bookkeeping and eviction happen under one `parking_lot::Mutex`,
//! so no reader observes a page half-evicted. Eviction only drops the page
//! table's `Arc`; a [`RowBytes`] returned earlier holds its own clone, and
//! the OS mapping is released when the last of them is dropped.
//!
//! The `max_open_pages` bound therefore counts the mappings owned by the
//! page table, which is what [`PagedMmap::open_page_count`] reports. A page
//! pinned only by rows the caller still holds is not counted; its mapping
//! lives until those rows are dropped.
//!
//! ## Row Spans
//!
//! A row's span runs from its offset to the next row's offset (or end of
//! file), padding included. Row decoders only read their encoded length, so
//! a truncated body is detected at the span boundary instead of reading
//! into the following row.

use std::fmt;
use std::fs::File;
use std::num::NonZeroUsize;
use std::ops::{Deref, Range};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{bail, Result, WrapErr};
use hashbrown::HashMap;
use lru::LruCache;
use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;

use super::page::{build_pages, Page};
use crate::error::MatrixError;
use crate::RowId;

#[derive(Debug, Clone, Copy)]
struct RowSpan {
    start: u64,
    end: u64,
}

struct PageTable {
    pages: Vec<Page>,
    /// Present only when there are more pages than may be open at once.
    lru: Option<LruCache<usize, ()>>,
}

pub struct PagedMmap {
    path: PathBuf,
    file: File,
    file_len: u64,
    spans: HashMap<RowId, RowSpan>,
    row_ids: Vec<RowId>,
    max_open_pages: usize,
    table: Mutex<PageTable>,
}

impl PagedMmap {
    /// Builds the paging index over `file`.
    ///
    /// `rows` lists `(row id, absolute offset)` pairs in any order. Every
    /// offset must lie at or after `data_start`. Offsets at or past the end
    /// of the file are accepted here and reported as corrupt rows on access.
    pub fn new(
        path: &Path,
        file: File,
        mut rows: Vec<(RowId, u64)>,
        data_start: u64,
        max_page_size: u64,
        max_open_pages: usize,
    ) -> Result<Self> {
        if max_page_size == 0 {
            bail!(MatrixError::encoding("max_page_size must be greater than 0"));
        }
        let Some(cap) = NonZeroUsize::new(max_open_pages) else {
            bail!(MatrixError::encoding("max_open_pages must be greater than 0"));
        };

        let file_len = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        rows.sort_unstable_by_key(|&(_, offset)| offset);

        let mut spans = HashMap::with_capacity(rows.len());
        let mut row_ids = Vec::with_capacity(rows.len());
        for (i, &(row_id, start)) in rows.iter().enumerate() {
            if start < data_start {
                bail!(MatrixError::invalid_format(
                    path,
                    format!(
                        "row {} offset {} points inside the header (data starts at {})",
                        row_id, start, data_start
                    )
                ));
            }
            let end = match rows.get(i + 1) {
                Some(&(next_id, next)) if next == start => {
                    bail!(MatrixError::invalid_format(
                        path,
                        format!("rows {} and {} share offset {}", row_id, next_id, start)
                    ));
                }
                Some(&(_, next)) => next.min(file_len),
                None => file_len,
            };
            if spans.insert(row_id, RowSpan { start, end }).is_some() {
                bail!(MatrixError::invalid_format(
                    path,
                    format!("duplicate row id {} in row table", row_id)
                ));
            }
            row_ids.push(row_id);
        }

        let in_file: Vec<u64> = rows
            .iter()
            .map(|&(_, offset)| offset)
            .take_while(|&offset| offset < file_len)
            .collect();
        let pages = build_pages(&in_file, file_len, max_page_size);

        log::debug!(
            "paged '{}': {} rows in {} pages (max page size {}, max open pages {})",
            path.display(),
            row_ids.len(),
            pages.len(),
            max_page_size,
            max_open_pages
        );

        let lru = (pages.len() > max_open_pages).then(|| LruCache::new(cap));

        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_len,
            spans,
            row_ids,
            max_open_pages,
            table: Mutex::new(PageTable { pages, lru }),
        })
    }

    /// Returns the bytes of `row_id`, or `None` if the id is not in the row
    /// table.
    pub fn get_row(&self, row_id: RowId) -> Result<Option<RowBytes>> {
        let Some(&span) = self.spans.get(&row_id) else {
            return Ok(None);
        };
        if span.start >= self.file_len {
            bail!(MatrixError::corrupt_row(
                row_id,
                format!(
                    "offset {} is past the end of '{}' ({} bytes)",
                    span.start,
                    self.path.display(),
                    self.file_len
                )
            ));
        }

        let (map, page_start) = self.map_page_containing(span.start)?;
        let from = (span.start - page_start) as usize;
        let to = (span.end - page_start) as usize;

        Ok(Some(RowBytes {
            map,
            range: from..to,
        }))
    }

    fn map_page_containing(&self, offset: u64) -> Result<(Arc<Mmap>, u64)> {
        let mut guard = self.table.lock();
        let table = &mut *guard;

        let Some(idx) = table.pages.iter().position(|p| p.contains(offset)) else {
            bail!(
                "no page of '{}' contains offset {}",
                self.path.display(),
                offset
            );
        };

        let map = match table.pages[idx].mapping().cloned() {
            Some(map) => map,
            None => {
                let page = &mut table.pages[idx];
                let map = Arc::new(map_region(&self.file, &self.path, page.start(), page.len())?);
                log::debug!(
                    "mapped page {} [{}, {}) of '{}'",
                    idx,
                    page.start(),
                    page.end(),
                    self.path.display()
                );
                page.set_mapping(Arc::clone(&map));
                map
            }
        };

        if let Some(lru) = table.lru.as_mut() {
            if lru.get(&idx).is_none() {
                if let Some((evicted, ())) = lru.push(idx, ()) {
                    if evicted != idx && table.pages[evicted].unmap() {
                        log::debug!("evicted page {} of '{}'", evicted, self.path.display());
                    }
                }
            }
        }

        Ok((map, table.pages[idx].start()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row ids in file-storage (offset) order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn num_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn contains(&self, row_id: RowId) -> bool {
        self.spans.contains_key(&row_id)
    }

    pub fn num_pages(&self) -> usize {
        self.table.lock().pages.len()
    }

    pub fn max_open_pages(&self) -> usize {
        self.max_open_pages
    }

    /// Number of pages currently holding a live mapping.
    pub fn open_page_count(&self) -> usize {
        self.table.lock().pages.iter().filter(|p| p.is_mapped()).count()
    }

    pub fn page_ranges(&self) -> Vec<Range<u64>> {
        self.table
            .lock()
            .pages
            .iter()
            .map(|p| p.start()..p.end())
            .collect()
    }
}

impl fmt::Debug for PagedMmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedMmap")
            .field("path", &self.path)
            .field("file_len", &self.file_len)
            .field("rows", &self.row_ids.len())
            .field("max_open_pages", &self.max_open_pages)
            .finish()
    }
}

/// Maps `len` bytes of `file` starting at `offset`, read-only.
pub fn map_region(file: &File, path: &Path, offset: u64, len: u64) -> Result<Mmap> {
    // SAFETY: matrix files are written once and never modified while open.
    // The mapping is read-only and every region requested lies within the
    // file length observed at open time.
    unsafe {
        MmapOptions::new()
            .offset(offset)
            .len(len as usize)
            .map(file)
            .wrap_err_with(|| {
                format!(
                    "failed to memory-map {} bytes at offset {} of '{}'",
                    len,
                    offset,
                    path.display()
                )
            })
    }
}

/// The bytes of one row, borrowed from a shared page mapping.
#[derive(Clone)]
pub struct RowBytes {
    map: Arc<Mmap>,
    range: Range<usize>,
}

impl RowBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.map[self.range.clone()]
    }
}

impl Deref for RowBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for RowBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for RowBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBytes")
            .field("len", &self.range.len())
            .finish()
    }
}
