//! # In-Memory Sparse Matrix
//!
//! `InMemorySparseMatrix` holds every row of a sparse matrix in RAM, with
//! values already unpacked to `f32`. It is built from vectors or loaded in
//! full from any [`Matrix`], and serves lookups through a row-id map.
//!
//! ## Id Compression
//!
//! [`compress_ids`](InMemorySparseMatrix::compress_ids) replaces raw ids
//! with a contiguous `0..N` range so the matrix can index plain arrays:
//!
//! ```text
//! row ids   [40, 7, 19]        ──> [0, 1, 2]
//! col ids   first seen order   ──> 3, 4, ... (ids that are also rows keep
//!                                  their row slot)
//! ```
//!
//! After compression each row's columns are sorted by compressed id. The
//! raw-to-compressed map is kept so
//! [`decompress_ids`](InMemorySparseMatrix::decompress_ids) can restore the
//! raw ids; column order stays sorted by compressed id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{bail, Result};
use hashbrown::HashMap;

use super::{warn_and_skip, DecodeErrorHandler, Matrix, MatrixIter};
use crate::encoding::ValueConf;
use crate::error::MatrixError;
use crate::records::MatrixRow;
use crate::{ColId, RowId};

/// A row of an [`InMemorySparseMatrix`]. Cloning shares the column and
/// value arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemorySparseRow {
    row_id: RowId,
    col_ids: Arc<[ColId]>,
    values: Arc<[f32]>,
}

impl InMemorySparseRow {
    pub fn col_ids(&self) -> &[ColId] {
        &self.col_ids
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl MatrixRow for InMemorySparseRow {
    fn row_index(&self) -> RowId {
        self.row_id
    }

    fn num_cols(&self) -> usize {
        self.col_ids.len()
    }

    fn col_id_at(&self, i: usize) -> ColId {
        self.col_ids[i]
    }

    fn value_at(&self, i: usize) -> f32 {
        self.values[i]
    }
}

/// A sparse matrix held entirely in memory.
pub struct InMemorySparseMatrix {
    vconf: ValueConf,
    source: PathBuf,
    row_ids: Vec<RowId>,
    rows: Vec<InMemorySparseRow>,
    row_map: HashMap<RowId, usize>,
    id_map: Option<HashMap<i32, i32>>,
    on_decode_error: DecodeErrorHandler,
}

impl InMemorySparseMatrix {
    /// Builds a matrix from parallel arrays: row `i` has id `row_ids[i]`,
    /// columns `col_ids[i]` and values `values[i]`.
    pub fn new(
        vconf: ValueConf,
        row_ids: Vec<RowId>,
        col_ids: Vec<Vec<ColId>>,
        values: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if row_ids.len() != col_ids.len() || row_ids.len() != values.len() {
            bail!(MatrixError::encoding(format!(
                "{} row ids, {} column lists and {} value lists",
                row_ids.len(),
                col_ids.len(),
                values.len()
            )));
        }

        let mut rows = Vec::with_capacity(row_ids.len());
        for ((&row_id, cols), vals) in row_ids.iter().zip(col_ids).zip(values) {
            if cols.len() != vals.len() {
                bail!(MatrixError::encoding(format!(
                    "row {} has {} column ids but {} values",
                    row_id,
                    cols.len(),
                    vals.len()
                )));
            }
            rows.push(InMemorySparseRow {
                row_id,
                col_ids: cols.into(),
                values: vals.into(),
            });
        }

        Self::from_rows(vconf, PathBuf::new(), rows)
    }

    /// Reads every row of `matrix` into memory, in its storage order.
    ///
    /// Unlike iteration, a row that fails to decode fails the whole load.
    pub fn from_matrix<M: Matrix>(matrix: &M) -> Result<Self> {
        let mut rows = Vec::with_capacity(matrix.num_rows());
        for &row_id in matrix.row_ids() {
            let Some(row) = matrix.get_row(row_id)? else {
                bail!(
                    "row {} of '{}' disappeared while loading",
                    row_id,
                    matrix.path().display()
                );
            };
            let (cols, vals): (Vec<ColId>, Vec<f32>) = row.entries().into_iter().unzip();
            rows.push(InMemorySparseRow {
                row_id,
                col_ids: cols.into(),
                values: vals.into(),
            });
        }

        log::info!(
            "loaded {} rows of '{}' into memory",
            rows.len(),
            matrix.path().display()
        );
        Self::from_rows(*matrix.value_conf(), matrix.path().to_path_buf(), rows)
    }

    fn from_rows(vconf: ValueConf, source: PathBuf, rows: Vec<InMemorySparseRow>) -> Result<Self> {
        let row_ids: Vec<RowId> = rows.iter().map(|r| r.row_id).collect();
        let row_map = index_rows(&row_ids)?;
        Ok(Self {
            vconf,
            source,
            row_ids,
            rows,
            row_map,
            id_map: None,
            on_decode_error: warn_and_skip(),
        })
    }

    /// Renumbers rows to `0..num_rows` in storage order, then gives column
    /// ids that are not row ids the next free ids in first-seen order.
    pub fn compress_ids(&mut self) -> Result<()> {
        if self.id_map.is_some() {
            bail!("ids of '{}' are already compressed", self.source.display());
        }

        let mut id_map: HashMap<i32, i32> = HashMap::with_capacity(self.rows.len());
        for (i, &row_id) in self.row_ids.iter().enumerate() {
            id_map.insert(row_id, i as i32);
        }

        for (i, row) in self.rows.iter_mut().enumerate() {
            let mut entries: Vec<(ColId, f32)> = Vec::with_capacity(row.col_ids.len());
            for (&col, &val) in row.col_ids.iter().zip(row.values.iter()) {
                let next = id_map.len() as i32;
                let id = *id_map.entry(col).or_insert(next);
                entries.push((id, val));
            }
            entries.sort_unstable_by_key(|&(col, _)| col);

            let (cols, vals): (Vec<ColId>, Vec<f32>) = entries.into_iter().unzip();
            *row = InMemorySparseRow {
                row_id: i as RowId,
                col_ids: cols.into(),
                values: vals.into(),
            };
        }

        self.row_ids = (0..self.rows.len() as RowId).collect();
        self.row_map = index_rows(&self.row_ids)?;
        log::debug!("compressed {} distinct ids", id_map.len());
        self.id_map = Some(id_map);
        Ok(())
    }

    /// Restores the raw ids replaced by [`compress_ids`](Self::compress_ids).
    pub fn decompress_ids(&mut self) -> Result<()> {
        let Some(id_map) = self.id_map.take() else {
            bail!("ids of '{}' are not compressed", self.source.display());
        };

        let mut raw = vec![0i32; id_map.len()];
        for (&raw_id, &id) in &id_map {
            raw[id as usize] = raw_id;
        }

        for row in &mut self.rows {
            let cols: Vec<ColId> = row.col_ids.iter().map(|&c| raw[c as usize]).collect();
            row.row_id = raw[row.row_id as usize];
            row.col_ids = cols.into();
        }

        self.row_ids = self.rows.iter().map(|r| r.row_id).collect();
        self.row_map = index_rows(&self.row_ids)?;
        Ok(())
    }

    /// Raw id to compressed id, while ids are compressed.
    pub fn id_map(&self) -> Option<&HashMap<i32, i32>> {
        self.id_map.as_ref()
    }

    pub fn is_compressed(&self) -> bool {
        self.id_map.is_some()
    }
}

fn index_rows(row_ids: &[RowId]) -> Result<HashMap<RowId, usize>> {
    let mut map = HashMap::with_capacity(row_ids.len());
    for (i, &row_id) in row_ids.iter().enumerate() {
        if map.insert(row_id, i).is_some() {
            bail!(MatrixError::encoding(format!("duplicate row id {}", row_id)));
        }
    }
    Ok(map)
}

impl Matrix for InMemorySparseMatrix {
    type Row = InMemorySparseRow;

    fn get_row(&self, row_id: RowId) -> Result<Option<InMemorySparseRow>> {
        Ok(self
            .row_map
            .get(&row_id)
            .and_then(|&i| self.rows.get(i))
            .cloned())
    }

    fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    fn value_conf(&self) -> &ValueConf {
        &self.vconf
    }

    /// The file the rows were loaded from; empty when built from vectors.
    fn path(&self) -> &Path {
        &self.source
    }

    fn decode_error_handler(&self) -> &DecodeErrorHandler {
        &self.on_decode_error
    }
}

impl<'a> IntoIterator for &'a InMemorySparseMatrix {
    type Item = InMemorySparseRow;
    type IntoIter = MatrixIter<'a, InMemorySparseMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
