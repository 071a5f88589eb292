//! # Matrix Writers
//!
//! Batch writers that build a matrix file once. Row bodies are streamed to
//! an anonymous temporary file next to the destination while the row table
//! accumulates in memory; `finish()` writes the header, the row table with
//! absolute offsets, the dense column section if any, and then copies the
//! bodies after it.
//!
//! ```text
//! write_row ──> temp body file   [row 0][pad][row 1][pad]...
//!               row table        (id, relative offset)
//!
//! finish   ──> destination       [header][row table][cols?][bodies...]
//!                                 offsets rebased by the header length
//! ```
//!
//! Each body is padded with `ROW_PADDING` up to `ROW_ALIGNMENT`, so every row
//! starts on an 8-byte boundary relative to the body section.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{bail, Result, WrapErr};
use hashbrown::HashSet;
use zerocopy::IntoBytes;

use super::headers::{col_section_len, MatrixFileHeader, RowTableEntry};
use crate::config::{DENSE_FILE_MAGIC, ROW_ALIGNMENT, ROW_PADDING, SPARSE_FILE_MAGIC};
use crate::encoding::ValueConf;
use crate::error::MatrixError;
use crate::records::{DenseRow, MatrixRow, SparseRow};
use crate::{ColId, RowId};

/// Shared state of both writers: the temp body file and the row table.
struct RowSink {
    path: PathBuf,
    vconf: ValueConf,
    body: BufWriter<File>,
    body_len: u64,
    table: Vec<(RowId, u64)>,
    seen: HashSet<RowId>,
}

impl RowSink {
    fn create(path: &Path, vconf: ValueConf) -> Result<Self> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::tempfile_in(&dir)
            .wrap_err_with(|| format!("failed to create temp body file in '{}'", dir.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            vconf,
            body: BufWriter::new(tmp),
            body_len: 0,
            table: Vec::new(),
            seen: HashSet::new(),
        })
    }

    fn check_row(&self, row_id: RowId, vconf: &ValueConf) -> Result<()> {
        if !self.vconf.almost_equals(vconf) {
            bail!(MatrixError::encoding(format!(
                "row {} packed with range [{}, {}], writer uses [{}, {}]",
                row_id,
                vconf.min(),
                vconf.max(),
                self.vconf.min(),
                self.vconf.max()
            )));
        }
        if self.seen.contains(&row_id) {
            bail!(MatrixError::encoding(format!(
                "row {} was already written",
                row_id
            )));
        }
        Ok(())
    }

    fn append(&mut self, row_id: RowId, bytes: &[u8]) -> Result<()> {
        self.body
            .write_all(bytes)
            .wrap_err_with(|| format!("failed to buffer row {}", row_id))?;

        let len = bytes.len() as u64;
        let padded = len.next_multiple_of(ROW_ALIGNMENT);
        let pad = [ROW_PADDING; ROW_ALIGNMENT as usize];
        self.body.write_all(&pad[..(padded - len) as usize])?;

        self.table.push((row_id, self.body_len));
        self.seen.insert(row_id);
        self.body_len += padded;
        Ok(())
    }

    fn finish(self, magic: u32, col_ids: Option<&[ColId]>) -> Result<()> {
        let num_rows = u32::try_from(self.table.len()).map_err(|_| {
            MatrixError::encoding(format!("{} rows exceed the format limit", self.table.len()))
        })?;

        let header = MatrixFileHeader::new(magic, &self.vconf, num_rows);
        let cols_len = col_ids.map_or(0, |ids| col_section_len(ids.len()));
        let data_start = header.row_table_end() + cols_len;

        let mut body = self
            .body
            .into_inner()
            .map_err(|e| e.into_error())
            .wrap_err("failed to flush temp body file")?;
        body.seek(SeekFrom::Start(0))?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .wrap_err_with(|| format!("failed to create matrix file '{}'", self.path.display()))?;
        let mut out = BufWriter::new(file);

        out.write_all(header.as_bytes())?;
        for &(row_id, offset) in &self.table {
            out.write_all(RowTableEntry::new(row_id, data_start + offset).as_bytes())?;
        }
        if let Some(ids) = col_ids {
            out.write_all(&(ids.len() as u32).to_le_bytes())?;
            for id in ids {
                out.write_all(&id.to_le_bytes())?;
            }
        }

        let copied = io::copy(&mut body, &mut out)
            .wrap_err_with(|| format!("failed to write rows to '{}'", self.path.display()))?;
        debug_assert_eq!(copied, self.body_len);

        let file = out
            .into_inner()
            .map_err(|e| e.into_error())
            .wrap_err_with(|| format!("failed to flush '{}'", self.path.display()))?;
        file.sync_all()
            .wrap_err_with(|| format!("failed to sync '{}'", self.path.display()))?;

        log::info!(
            "wrote matrix '{}': {} rows, {} bytes of row data",
            self.path.display(),
            num_rows,
            self.body_len
        );
        Ok(())
    }
}

/// Builds a sparse matrix file row by row.
pub struct SparseMatrixWriter {
    sink: RowSink,
}

impl SparseMatrixWriter {
    pub fn create<P: AsRef<Path>>(path: P, vconf: ValueConf) -> Result<Self> {
        Ok(Self {
            sink: RowSink::create(path.as_ref(), vconf)?,
        })
    }

    pub fn value_conf(&self) -> &ValueConf {
        &self.sink.vconf
    }

    pub fn num_rows(&self) -> usize {
        self.sink.table.len()
    }

    pub fn write_row<B: AsRef<[u8]>>(&mut self, row: &SparseRow<B>) -> Result<()> {
        let row_id = row.row_index();
        self.sink.check_row(row_id, row.value_conf())?;
        self.sink.append(row_id, row.as_bytes())
    }

    /// Packs `values` with the writer's range and appends the row.
    pub fn write(&mut self, row_id: RowId, col_ids: &[ColId], values: &[f32]) -> Result<()> {
        let row = SparseRow::new(self.sink.vconf, row_id, col_ids, values)?;
        self.write_row(&row)
    }

    pub fn finish(self) -> Result<()> {
        self.sink.finish(SPARSE_FILE_MAGIC, None)
    }
}

/// Builds a dense matrix file whose rows all share one column id list.
pub struct DenseMatrixWriter {
    sink: RowSink,
    col_ids: Arc<[ColId]>,
}

impl DenseMatrixWriter {
    pub fn create<P: AsRef<Path>>(path: P, vconf: ValueConf, col_ids: &[ColId]) -> Result<Self> {
        if col_ids.is_empty() {
            bail!(MatrixError::encoding("dense matrix needs at least one column"));
        }
        Ok(Self {
            sink: RowSink::create(path.as_ref(), vconf)?,
            col_ids: Arc::from(col_ids),
        })
    }

    pub fn value_conf(&self) -> &ValueConf {
        &self.sink.vconf
    }

    pub fn col_ids(&self) -> &Arc<[ColId]> {
        &self.col_ids
    }

    pub fn num_rows(&self) -> usize {
        self.sink.table.len()
    }

    pub fn write_row<B: AsRef<[u8]>>(&mut self, row: &DenseRow<B>) -> Result<()> {
        let row_id = row.row_index();
        if row.col_ids()[..] != self.col_ids[..] {
            bail!(MatrixError::encoding(format!(
                "row {} has {} columns that differ from the matrix's {}",
                row_id,
                row.num_cols(),
                self.col_ids.len()
            )));
        }
        self.sink.check_row(row_id, row.value_conf())?;
        self.sink.append(row_id, row.as_bytes())
    }

    /// Packs `values`, one per matrix column, and appends the row.
    pub fn write(&mut self, row_id: RowId, values: &[f32]) -> Result<()> {
        let row = DenseRow::new(self.sink.vconf, row_id, Arc::clone(&self.col_ids), values)?;
        self.write_row(&row)
    }

    pub fn finish(self) -> Result<()> {
        let Self { sink, col_ids } = self;
        sink.finish(DENSE_FILE_MAGIC, Some(&col_ids))
    }
}
