use std::path::Path;
use std::sync::Arc;

use eyre::Result;

use super::layout::read_layout;
use super::{DecodeErrorHandler, Matrix, MatrixIter, MatrixOptions};
use crate::config::DENSE_FILE_MAGIC;
use crate::encoding::ValueConf;
use crate::records::DenseRow;
use crate::storage::{PagedMmap, RowBytes};
use crate::{ColId, RowId};

pub type DenseMatrixRow = DenseRow<RowBytes>;

/// A dense matrix file opened for reading.
pub struct DenseMatrix {
    vconf: ValueConf,
    col_ids: Arc<[ColId]>,
    pages: PagedMmap,
    on_decode_error: DecodeErrorHandler,
}

impl DenseMatrix {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, MatrixOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: MatrixOptions) -> Result<Self> {
        let path = path.as_ref();
        options.validate()?;

        let layout = read_layout(path, DENSE_FILE_MAGIC, true)?;
        let pages = PagedMmap::new(
            path,
            layout.file,
            layout.rows,
            layout.data_start,
            options.page_size_limit(),
            options.open_pages_limit(),
        )?;

        log::info!(
            "opened dense matrix '{}': {} rows, {} columns, {} pages",
            path.display(),
            pages.num_rows(),
            layout.col_ids.len(),
            pages.num_pages()
        );

        Ok(Self {
            vconf: layout.vconf,
            col_ids: Arc::from(layout.col_ids),
            pages,
            on_decode_error: options.decode_error_handler().clone(),
        })
    }

    /// The column ids shared by every row, in value order.
    pub fn col_ids(&self) -> &Arc<[ColId]> {
        &self.col_ids
    }

    pub fn num_cols(&self) -> usize {
        self.col_ids.len()
    }

    pub fn pages(&self) -> &PagedMmap {
        &self.pages
    }
}

impl Matrix for DenseMatrix {
    type Row = DenseMatrixRow;

    fn get_row(&self, row_id: RowId) -> Result<Option<DenseMatrixRow>> {
        let Some(bytes) = self.pages.get_row(row_id)? else {
            return Ok(None);
        };
        DenseRow::wrap(self.vconf, row_id, Arc::clone(&self.col_ids), bytes).map(Some)
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

impl<'a> IntoIterator for &'a DenseMatrix {
    type Item = DenseMatrixRow;
    type IntoIter = MatrixIter<'a, DenseMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatrixError;
    use crate::records::MatrixRow;
    use crate::storage::DenseMatrixWriter;

    #[test]
    fn reopened_rows_keep_values_and_shared_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dense.matrix");
        let conf = ValueConf::default();

        let mut w = DenseMatrixWriter::create(&path, conf, &[100, 200]).unwrap();
        w.write(7, &[0.42, -0.13]).unwrap();
        w.write(3, &[1.0, 0.0]).unwrap();
        w.write(5, &[-1.0, 0.5]).unwrap();
        w.finish().unwrap();

        let m = DenseMatrix::open(&path).unwrap();
        assert_eq!(m.row_ids(), &[7, 3, 5]);
        assert_eq!(&m.col_ids()[..], &[100, 200]);

        let row = m.get_row(7).unwrap().unwrap();
        assert_eq!(row.row_index(), 7);
        assert!((row.value_at(0) - 0.42).abs() <= conf.step());
        assert!((row.value_for(200).unwrap() + 0.13).abs() <= conf.step());
        assert!(Arc::ptr_eq(row.col_ids(), m.col_ids()));

        assert!(m.get_row(999).unwrap().is_none());
    }

    #[test]
    fn sparse_file_is_not_a_dense_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.matrix");
        let mut w = crate::storage::SparseMatrixWriter::create(&path, ValueConf::default()).unwrap();
        w.write(1, &[1], &[0.5]).unwrap();
        w.finish().unwrap();

        let err = DenseMatrix::open(&path).err().unwrap();
        assert!(err.downcast_ref::<MatrixError>().unwrap().is_invalid_format());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DenseMatrix::open(dir.path().join("nope")).err().unwrap();

        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }
}
