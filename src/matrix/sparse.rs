use std::path::Path;

use eyre::{bail, Result};

use super::layout::read_layout;
use super::{DecodeErrorHandler, Matrix, MatrixIter, MatrixOptions};
use crate::config::SPARSE_FILE_MAGIC;
use crate::encoding::ValueConf;
use crate::error::MatrixError;
use crate::records::{MatrixRow, SparseRow};
use crate::storage::{PagedMmap, RowBytes};
use crate::RowId;

pub type SparseMatrixRow = SparseRow<RowBytes>;

/// A sparse matrix file opened for reading.
pub struct SparseMatrix {
    vconf: ValueConf,
    pages: PagedMmap,
    on_decode_error: DecodeErrorHandler,
}

impl SparseMatrix {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, MatrixOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: MatrixOptions) -> Result<Self> {
        let path = path.as_ref();
        options.validate()?;

        let layout = read_layout(path, SPARSE_FILE_MAGIC, false)?;
        let pages = PagedMmap::new(
            path,
            layout.file,
            layout.rows,
            layout.data_start,
            options.page_size_limit(),
            options.open_pages_limit(),
        )?;

        log::info!(
            "opened sparse matrix '{}': {} rows, {} pages",
            path.display(),
            pages.num_rows(),
            pages.num_pages()
        );

        Ok(Self {
            vconf: layout.vconf,
            pages,
            on_decode_error: options.decode_error_handler().clone(),
        })
    }

    pub fn pages(&self) -> &PagedMmap {
        &self.pages
    }
}

impl Matrix for SparseMatrix {
    type Row = SparseMatrixRow;

    fn get_row(&self, row_id: RowId) -> Result<Option<SparseMatrixRow>> {
        let Some(bytes) = self.pages.get_row(row_id)? else {
            return Ok(None);
        };
        let row = SparseRow::wrap(self.vconf, bytes)?;
        if row.row_index() != row_id {
            bail!(MatrixError::corrupt_row(
                row_id,
                format!("row body is labelled as row {}", row.row_index())
            ));
        }
        Ok(Some(row))
    }

    fn row_ids(&self) -> &[RowId] {
        self.pages.row_ids()
    }

    fn value_conf(&self) -> &ValueConf {
        &self.vconf
    }

    fn path(&self) -> &Path {
        self.pages.path()
    }

    fn decode_error_handler(&self) -> &DecodeErrorHandler {
        &self.on_decode_error
    }
}

impl<'a> IntoIterator for &'a SparseMatrix {
    type Item = SparseMatrixRow;
    type IntoIter = MatrixIter<'a, SparseMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SparseMatrixWriter;

    fn build(path: &Path) {
        let mut w = SparseMatrixWriter::create(path, ValueConf::default()).unwrap();
        w.write(5, &[9, 2, 7], &[0.5, -0.3, 0.9]).unwrap();
        w.write(1, &[], &[]).unwrap();
        w.write(12, &[3], &[1.1]).unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn rows_come_back_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.matrix");
        build(&path);

        let m = SparseMatrix::open(&path).unwrap();
        assert_eq!(m.num_rows(), 3);
        assert_eq!(m.row_ids(), &[5, 1, 12]);
        assert_eq!(m.path(), path.as_path());

        let row = m.get_row(5).unwrap().unwrap();
        assert_eq!(row.col_ids(), vec![9, 2, 7]);
        assert!((row.value_at(1) + 0.3).abs() <= m.value_conf().step());

        assert!(m.get_row(1).unwrap().unwrap().is_empty());
        assert!(m.get_row(6).unwrap().is_none());
    }

    #[test]
    fn iteration_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.matrix");
        build(&path);

        let m = SparseMatrix::open(&path).unwrap();
        let first: Vec<RowId> = m.iter().map(|r| r.row_index()).collect();
        let second: Vec<RowId> = (&m).into_iter().map(|r| r.row_index()).collect();

        assert_eq!(first, vec![5, 1, 12]);
        assert_eq!(first, second);
    }

    #[test]
    fn mislabelled_body_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.matrix");
        build(&path);

        // rewrite the row index stored inside the first body
        let mut bytes = std::fs::read(&path).unwrap();
        let body = 16 + 3 * 12;
        bytes[body + 4..body + 8].copy_from_slice(&77i32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let m = SparseMatrix::open(&path).unwrap();
        let err = m.get_row(5).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MatrixError>(),
            Some(&MatrixError::corrupt_row(5, "row body is labelled as row 77"))
        );
        assert!(m.get_row(12).unwrap().is_some());
    }
}
