//! # Sparse Matrix Transposition
//!
//! Writes the transpose of a sparse matrix to a new sparse matrix file.
//! Output row `c` lists, for every input row `r` that has column `c`, the
//! pair `(r, value)`; the value is copied as its packed code, so nothing is
//! re-quantized.
//!
//! ## Batching
//!
//! The transposed rows of all columns rarely fit in memory at once. The
//! transposer first counts the entries of every column, then walks the
//! column ids in ascending order in batches whose estimated footprint stays
//! under the byte budget. Every batch is one full scan of the input:
//!
//! ```text
//! pass 0:     count entries per column
//! pass 1..n:  scan input, collect entries of batch columns, write rows
//! ```
//!
//! A column too large for the budget on its own still forms a batch.

use std::path::Path;

use eyre::{ensure, Result};
use hashbrown::HashMap;

use super::{Matrix, SparseMatrix};
use crate::config::{DEFAULT_TRANSPOSE_BUFFER, SPARSE_ROW_ENTRY_SIZE, TRANSPOSE_COLUMN_OVERHEAD};
use crate::records::{MatrixRow, SparseRow};
use crate::storage::SparseMatrixWriter;
use crate::{ColId, RowId};

pub struct SparseMatrixTransposer<'a> {
    matrix: &'a SparseMatrix,
    buffer_bytes: usize,
}

#[derive(Default)]
struct Accumulator {
    row_ids: Vec<RowId>,
    packed: Vec<i16>,
}

impl<'a> SparseMatrixTransposer<'a> {
    pub fn new(matrix: &'a SparseMatrix) -> Self {
        Self {
            matrix,
            buffer_bytes: DEFAULT_TRANSPOSE_BUFFER,
        }
    }

    /// Byte budget for the columns accumulated in one batch.
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_bytes = bytes;
        self
    }

    /// Writes the transpose to `path` and returns the number of rows written.
    pub fn transpose_to<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let counts = self.count_columns()?;

        let mut col_ids: Vec<ColId> = counts.keys().copied().collect();
        col_ids.sort_unstable();
        log::info!(
            "transposing '{}': {} unique column ids",
            self.matrix.path().display(),
            col_ids.len()
        );

        let mut writer = SparseMatrixWriter::create(path, *self.matrix.value_conf())?;
        let mut done = 0;
        while done < col_ids.len() {
            let batch = self.next_batch(&col_ids[done..], &counts);
            done += batch.len();
            log::info!(
                "processing {} columns in batch (total={} of {})",
                batch.len(),
                done,
                col_ids.len()
            );
            self.write_batch(batch, &counts, &mut writer)?;
        }

        writer.finish()?;
        Ok(col_ids.len())
    }

    fn count_columns(&self) -> Result<HashMap<ColId, usize>> {
        let mut counts = HashMap::new();
        for &row_id in self.matrix.row_ids() {
            let Some(row) = self.matrix.get_row(row_id)? else {
                continue;
            };
            for i in 0..row.num_cols() {
                *counts.entry(row.col_id_at(i)).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Longest prefix of `remaining` whose estimated size fits the budget,
    /// never empty.
    fn next_batch<'c>(&self, remaining: &'c [ColId], counts: &HashMap<ColId, usize>) -> &'c [ColId] {
        let mut used = 0usize;
        let mut len = 0;
        for col in remaining {
            let entries = counts.get(col).copied().unwrap_or(0);
            let size = TRANSPOSE_COLUMN_OVERHEAD + entries * SPARSE_ROW_ENTRY_SIZE;
            if len > 0 && used + size > self.buffer_bytes {
                break;
            }
            used += size;
            len += 1;
        }
        &remaining[..len]
    }

    fn write_batch(
        &self,
        batch: &[ColId],
        counts: &HashMap<ColId, usize>,
        writer: &mut SparseMatrixWriter,
    ) -> Result<()> {
        let mut acc: HashMap<ColId, Accumulator> = batch
            .iter()
            .map(|&col| (col, Accumulator::default()))
            .collect();

        for &row_id in self.matrix.row_ids() {
            let Some(row) = self.matrix.get_row(row_id)? else {
                continue;
            };
            for i in 0..row.num_cols() {
                if let Some(a) = acc.get_mut(&row.col_id_at(i)) {
                    a.row_ids.push(row.row_index());
                    a.packed.push(row.packed_value_at(i));
                }
            }
        }

        let vconf = *self.matrix.value_conf();
        for &col in batch {
            let a = acc.remove(&col).unwrap_or_default();
            let expected = counts.get(&col).copied().unwrap_or(0);
            ensure!(
                a.row_ids.len() == expected,
                "column {} changed size during transposition: counted {}, collected {}",
                col,
                expected,
                a.row_ids.len()
            );
            writer.write_row(&SparseRow::from_packed(vconf, col, &a.row_ids, &a.packed)?)?;
        }
        Ok(())
    }
}
