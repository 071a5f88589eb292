//! # Row-Aligned Pages
//!
//! A page is a contiguous byte range `[start, end)` of a matrix file and the
//! unit of memory mapping and eviction. Pages are cut only at row offsets, so
//! every row body lies entirely inside one page.
//!
//! ## Page Construction
//!
//! Offsets are walked in ascending order while tracking where the current
//! page starts and where the previous row starts:
//!
//! ```text
//! for each offset pos (after the first):
//!     if pos - start > max_page_size:
//!         close the page before the previous row       [start, prev)
//!         if the previous row alone is still too big:
//!             give it a page of its own                 [prev, pos)
//!     prev = pos
//! final page extends to end of file                     [start, file_len)
//! ```
//!
//! A page only exceeds `max_page_size` when it holds a single row larger
//! than the budget. Bytes before the first row (the file header) belong to
//! no page.

use std::fmt;
use std::sync::Arc;

use memmap2::Mmap;

pub struct Page {
    start: u64,
    end: u64,
    mapping: Option<Arc<Mmap>>,
}

impl Page {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self {
            start,
            end,
            mapping: None,
        }
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn mapping(&self) -> Option<&Arc<Mmap>> {
        self.mapping.as_ref()
    }

    pub fn set_mapping(&mut self, mapping: Arc<Mmap>) {
        self.mapping = Some(mapping);
    }

    /// Drops the page's handle on its mapping. Rows already handed out keep
    /// their own reference until they are dropped.
    pub fn unmap(&mut self) -> bool {
        self.mapping.take().is_some()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Splits the file into row-aligned pages.
///
/// `sorted_offsets` must be strictly increasing and every offset must be
/// below `file_len`.
pub fn build_pages(sorted_offsets: &[u64], file_len: u64, max_page_size: u64) -> Vec<Page> {
    let Some((&first, rest)) = sorted_offsets.split_first() else {
        return Vec::new();
    };

    let mut pages = Vec::new();
    let mut start = first;
    let mut prev = first;

    for &pos in rest {
        if pos - start > max_page_size {
            if prev != start {
                pages.push(Page::new(start, prev));
                start = prev;
            }
            if pos - start > max_page_size {
                pages.push(Page::new(start, pos));
                start = pos;
            }
        }
        prev = pos;
    }
    pages.push(Page::new(start, file_len));

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(pages: &[Page]) -> Vec<(u64, u64)> {
        pages.iter().map(|p| (p.start(), p.end())).collect()
    }

    /// Every row [offset, next offset) must fall inside exactly one page.
    fn assert_rows_contained(offsets: &[u64], file_len: u64, pages: &[Page]) {
        for (i, &off) in offsets.iter().enumerate() {
            let row_end = offsets.get(i + 1).copied().unwrap_or(file_len);
            let holders: Vec<_> = pages
                .iter()
                .filter(|p| p.start() <= off && row_end <= p.end())
                .collect();
            assert_eq!(holders.len(), 1, "row at {} held by {:?}", off, holders);
        }
    }

    #[test]
    fn no_rows_means_no_pages() {
        assert!(build_pages(&[], 100, 10).is_empty());
    }

    #[test]
    fn small_matrix_fits_one_page() {
        let pages = build_pages(&[16, 40, 64], 96, 1024);
        assert_eq!(ranges(&pages), vec![(16, 96)]);
    }

    #[test]
    fn pages_close_on_row_boundaries() {
        let offsets = [0, 10, 20, 30, 40, 50];
        let pages = build_pages(&offsets, 60, 25);

        assert_eq!(ranges(&pages), vec![(0, 20), (20, 40), (40, 60)]);
        assert_rows_contained(&offsets, 60, &pages);
    }

    #[test]
    fn oversized_row_gets_its_own_page() {
        let offsets = [0, 8, 108, 116];
        let pages = build_pages(&offsets, 124, 16);

        assert_eq!(ranges(&pages), vec![(0, 8), (8, 108), (108, 124)]);
        assert_rows_contained(&offsets, 124, &pages);
    }

    #[test]
    fn tiny_budget_puts_each_row_in_a_page() {
        let offsets = [16, 32, 48, 64];
        let pages = build_pages(&offsets, 80, 1);

        assert_eq!(pages.len(), 4);
        assert_rows_contained(&offsets, 80, &pages);
    }

    #[test]
    fn uneven_rows_stay_contained() {
        let mut offsets = vec![24u64];
        let mut pos = 24;
        for len in [3u64, 90, 7, 7, 7, 40, 1, 1, 300, 5, 64, 64, 64] {
            pos += len;
            offsets.push(pos);
        }
        let file_len = pos + 11;

        for budget in [1, 8, 50, 100, 1000] {
            let pages = build_pages(&offsets, file_len, budget);
            assert_rows_contained(&offsets, file_len, &pages);
            assert_eq!(pages.first().unwrap().start(), 24);
            assert_eq!(pages.last().unwrap().end(), file_len);
        }
    }

    #[test]
    fn unmap_reports_previous_state() {
        let mut page = Page::new(0, 10);
        assert!(!page.unmap());
        assert!(page.contains(0));
        assert!(!page.contains(10));
    }
}
