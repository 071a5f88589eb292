//! Reads the header region of a matrix file: fixed header, row table and,
//! for dense files, the shared column list. Each section is mapped only
//! after its bounds have been checked against the file length.

use std::fs::File;
use std::path::Path;

use eyre::{bail, Result, WrapErr};

use crate::config::MATRIX_HEADER_SIZE;
use crate::encoding::{read_u32_le, ValueConf};
use crate::error::MatrixError;
use crate::storage::headers::{col_section_len, parse_col_ids, parse_row_table};
use crate::storage::{map_region, MatrixFileHeader};
use crate::{ColId, RowId};

pub(crate) struct FileLayout {
    pub file: File,
    pub vconf: ValueConf,
    pub rows: Vec<(RowId, u64)>,
    pub col_ids: Vec<ColId>,
    pub data_start: u64,
}

pub(crate) fn read_layout(path: &Path, magic: u32, with_columns: bool) -> Result<FileLayout> {
    let file = File::open(path)
        .wrap_err_with(|| format!("failed to open matrix file '{}'", path.display()))?;
    let file_len = file
        .metadata()
        .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
        .len();

    if file_len < MATRIX_HEADER_SIZE as u64 {
        bail!(MatrixError::invalid_format(
            path,
            format!(
                "file has {} bytes, smaller than the {} byte header",
                file_len, MATRIX_HEADER_SIZE
            )
        ));
    }

    let head = map_region(&file, path, 0, MATRIX_HEADER_SIZE as u64)?;
    let header = *MatrixFileHeader::parse(&head, magic, path)?;
    drop(head);

    let vconf = header.value_conf()?;
    let num_rows = header.num_rows() as usize;
    let table_end = header.row_table_end();
    if table_end > file_len {
        bail!(MatrixError::invalid_format(
            path,
            format!(
                "row table of {} entries ends at {}, past the end of the file ({} bytes)",
                num_rows, table_end, file_len
            )
        ));
    }

    let rows = if num_rows == 0 {
        Vec::new()
    } else {
        let start = MATRIX_HEADER_SIZE as u64;
        let table = map_region(&file, path, start, table_end - start)?;
        parse_row_table(&table, num_rows, path)?
            .iter()
            .map(|e| (e.row_id(), e.offset()))
            .collect()
    };

    let mut data_start = table_end;
    let mut col_ids = Vec::new();
    if with_columns {
        if table_end + 4 > file_len {
            bail!(MatrixError::invalid_format(path, "missing column count"));
        }
        let count = read_u32_le(&map_region(&file, path, table_end, 4)?, 0) as usize;
        let section = col_section_len(count);
        if table_end + section > file_len {
            bail!(MatrixError::invalid_format(
                path,
                format!(
                    "column list of {} ids ends past the end of the file ({} bytes)",
                    count, file_len
                )
            ));
        }
        col_ids = parse_col_ids(&map_region(&file, path, table_end, section)?, path)?;
        if col_ids.is_empty() && num_rows > 0 {
            bail!(MatrixError::invalid_format(
                path,
                format!("dense matrix has {} rows but no columns", num_rows)
            ));
        }
        data_start += section;
    }

    Ok(FileLayout {
        file,
        vconf,
        rows,
        col_ids,
        data_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{DenseMatrix, SparseMatrix};
    use crate::storage::{DenseMatrixWriter, SparseMatrixWriter};

    // one-row dense file: header, one table entry, then the column count
    const COL_COUNT_AT: usize = MATRIX_HEADER_SIZE + 12;

    fn dense_bytes(dir: &Path) -> (std::path::PathBuf, Vec<u8>) {
        let path = dir.join("d.matrix");
        let mut w = DenseMatrixWriter::create(&path, ValueConf::default(), &[3, 4]).unwrap();
        w.write(1, &[0.25, -0.5]).unwrap();
        w.finish().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        (path, bytes)
    }

    fn open_err(path: &Path) -> MatrixError {
        let err = DenseMatrix::open(path).err().unwrap();
        err.downcast_ref::<MatrixError>().unwrap().clone()
    }

    #[test]
    fn dense_rows_without_columns_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut bytes) = dense_bytes(dir.path());
        bytes[COL_COUNT_AT..COL_COUNT_AT + 4].copy_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = open_err(&path);
        assert!(err.is_invalid_format());
        assert!(err.to_string().contains("1 rows but no columns"));
    }

    #[test]
    fn column_list_past_eof_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut bytes) = dense_bytes(dir.path());
        bytes[COL_COUNT_AT..COL_COUNT_AT + 4].copy_from_slice(&1000u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = open_err(&path);
        assert!(err.is_invalid_format());
        assert!(err.to_string().contains("column list of 1000 ids"));
    }

    #[test]
    fn missing_column_count_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (path, bytes) = dense_bytes(dir.path());
        std::fs::write(&path, &bytes[..COL_COUNT_AT + 2]).unwrap();

        let err = open_err(&path);
        assert!(err.is_invalid_format());
        assert!(err.to_string().contains("missing column count"));
    }

    #[test]
    fn empty_value_range_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let (dense, mut bytes) = dense_bytes(dir.path());
        bytes[4..8].copy_from_slice(&1.0f32.to_le_bytes());
        bytes[8..12].copy_from_slice(&1.0f32.to_le_bytes());
        std::fs::write(&dense, &bytes).unwrap();
        assert!(open_err(&dense).is_encoding());

        let sparse = dir.path().join("s.matrix");
        let mut w = SparseMatrixWriter::create(&sparse, ValueConf::default()).unwrap();
        w.write(2, &[8], &[0.5]).unwrap();
        w.finish().unwrap();
        let mut bytes = std::fs::read(&sparse).unwrap();
        bytes[4..8].copy_from_slice(&1.0f32.to_le_bytes());
        bytes[8..12].copy_from_slice(&1.0f32.to_le_bytes());
        std::fs::write(&sparse, &bytes).unwrap();

        let err = SparseMatrix::open(&sparse).err().unwrap();
        assert!(err.downcast_ref::<MatrixError>().unwrap().is_encoding());
    }

    #[test]
    fn layout_of_valid_dense_file() {
        let dir = tempfile::tempdir().unwrap();
        let (path, bytes) = dense_bytes(dir.path());

        let layout = read_layout(&path, crate::config::DENSE_FILE_MAGIC, true).unwrap();
        assert_eq!(layout.col_ids, vec![3, 4]);
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.data_start, (COL_COUNT_AT + 4 + 2 * 4) as u64);
        assert_eq!(layout.rows[0].1, layout.data_start);
        assert!(layout.data_start < bytes.len() as u64);
    }
}
