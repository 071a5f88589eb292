//! # Matrix File Integration Tests
//!
//! End-to-end tests that build matrix files with the writers, reopen them
//! through the public read API and check paging, eviction and the handling
//! of damaged files.
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test matrix_integration -- --nocapture
//! ```

use std::collections::HashSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;
use wikimatrix::{
    DecodeAction, DenseMatrix, DenseMatrixWriter, Matrix, MatrixError, MatrixOptions, MatrixRow,
    SparseMatrix, SparseMatrixTransposer, SparseMatrixWriter, ValueConf,
};

/// Builds a sparse matrix of `rows` random rows and returns what was written.
fn random_sparse(path: &Path, rows: usize, seed: u64) -> Vec<(i32, Vec<i32>, Vec<f32>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let conf = ValueConf::default();
    let mut writer = SparseMatrixWriter::create(path, conf).unwrap();
    let mut written = Vec::new();

    for i in 0..rows {
        let row_id = i as i32 * 3 + 1;
        let n = rng.gen_range(0..40);
        let mut seen = HashSet::new();
        let cols: Vec<i32> = (0..n)
            .map(|_| rng.gen_range(0..500))
            .filter(|c| seen.insert(*c))
            .collect();
        let vals: Vec<f32> = cols.iter().map(|_| rng.gen_range(-1.0..1.0)).collect();
        writer.write(row_id, &cols, &vals).unwrap();
        written.push((row_id, cols, vals));
    }
    writer.finish().unwrap();
    written
}

#[test]
fn dense_matrix_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dense.matrix");
    let conf = ValueConf::new(-1.1, 1.1).unwrap();

    let mut writer = DenseMatrixWriter::create(&path, conf, &[11, 12]).unwrap();
    writer.write(7, &[0.42, -0.13]).unwrap();
    writer.write(8, &[0.0, 1.1]).unwrap();
    writer.write(9, &[-1.1, 0.5]).unwrap();
    writer.finish().unwrap();

    let matrix = DenseMatrix::open(&path).unwrap();
    assert_eq!(matrix.num_rows(), 3);
    assert_eq!(matrix.num_cols(), 2);
    assert_eq!(matrix.value_conf(), &conf);

    let row = matrix.get_row(7).unwrap().unwrap();
    assert!((row.value_at(0) - 0.42).abs() <= conf.step());
    assert!((row.value_at(1) + 0.13).abs() <= conf.step());
    assert_eq!(row.col_id_at(1), 12);

    assert!(matrix.get_row(999).unwrap().is_none());
}

#[test]
fn sparse_rows_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparse.matrix");
    let written = random_sparse(&path, 200, 7);

    let matrix = SparseMatrix::open(&path).unwrap();
    let ids: Vec<i32> = written.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(matrix.row_ids(), ids.as_slice());

    let step = matrix.value_conf().step();
    for (id, cols, vals) in &written {
        let row = matrix.get_row(*id).unwrap().unwrap();
        assert_eq!(&row.col_ids(), cols);
        for (i, v) in vals.iter().enumerate() {
            assert!((row.value_at(i) - v).abs() <= step, "row {} col {}", id, i);
        }
    }
}

#[test]
fn pages_never_split_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paged.matrix");
    let written = random_sparse(&path, 300, 11);

    for max_page_size in [1u64, 64, 300, 4096, 1 << 20] {
        let matrix =
            SparseMatrix::open_with(&path, MatrixOptions::new().max_page_size(max_page_size))
                .unwrap();
        let pages = matrix.pages().page_ranges();

        for (id, cols, _) in &written {
            let row = matrix.get_row(*id).unwrap().unwrap();
            assert_eq!(row.num_cols(), cols.len());
        }

        for pair in pages.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        if max_page_size == 1 {
            assert_eq!(pages.len(), written.len());
        }
    }
}

#[test]
fn open_pages_stay_bounded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lru.matrix");
    let written = random_sparse(&path, 50, 3);

    let options = MatrixOptions::new().max_page_size(1).max_open_pages(4);
    let matrix = SparseMatrix::open_with(&path, options).unwrap();
    assert_eq!(matrix.pages().num_pages(), 50);

    let mut rng = StdRng::seed_from_u64(99);
    let mut held = Vec::new();
    for _ in 0..500 {
        let (id, cols, _) = &written[rng.gen_range(0..written.len())];
        let row = matrix.get_row(*id).unwrap().unwrap();
        assert_eq!(row.num_cols(), cols.len());
        assert!(matrix.pages().open_page_count() <= 4);
        if held.len() < 20 {
            held.push(row);
        }
    }

    // rows obtained before their page was evicted remain readable
    for row in &held {
        let _ = row.entries();
    }
}

#[test]
fn concurrent_readers_share_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.matrix");
    let written = random_sparse(&path, 120, 21);

    let options = MatrixOptions::new().max_page_size(256).max_open_pages(3);
    let matrix = SparseMatrix::open_with(&path, options).unwrap();

    std::thread::scope(|s| {
        for t in 0..4u64 {
            let matrix = &matrix;
            let written = &written;
            s.spawn(move || {
                let mut rng = StdRng::seed_from_u64(t);
                for _ in 0..300 {
                    let (id, cols, _) = &written[rng.gen_range(0..written.len())];
                    let row = matrix.get_row(*id).unwrap().unwrap();
                    assert_eq!(&row.col_ids(), cols);
                }
            });
        }
    });
    assert!(matrix.pages().open_page_count() <= 3);
}

#[test]
fn bad_magic_is_invalid_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.matrix");
    std::fs::write(&path, vec![0x42u8; 64]).unwrap();

    let err = SparseMatrix::open(&path).err().unwrap();
    let err = err.downcast_ref::<MatrixError>().unwrap();
    assert!(matches!(err, MatrixError::InvalidFormat { .. }));

    std::fs::write(&path, [0u8; 3]).unwrap();
    assert!(DenseMatrix::open(&path).is_err());
}

#[test]
fn truncated_row_table_is_invalid_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.matrix");
    random_sparse(&path, 10, 5);

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..16 + 5 * 12]).unwrap();

    let err = SparseMatrix::open(&path).err().unwrap();
    assert!(err.downcast_ref::<MatrixError>().unwrap().is_invalid_format());
}

/// Overwrites the magic of the body of `row_id` with garbage.
fn corrupt_row(path: &Path, row_id: i32) {
    let mut bytes = std::fs::read(path).unwrap();
    let num_rows = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
    for i in 0..num_rows {
        let at = 16 + i * 12;
        let id = i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        if id == row_id {
            let offset = u64::from_le_bytes(bytes[at + 4..at + 12].try_into().unwrap()) as usize;
            bytes[offset..offset + 4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        }
    }
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn corrupt_row_fails_lookup_but_not_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.matrix");
    random_sparse(&path, 10, 8);
    corrupt_row(&path, 4);

    let matrix = SparseMatrix::open(&path).unwrap();
    let err = matrix.get_row(4).unwrap_err();
    assert!(err.downcast_ref::<MatrixError>().unwrap().is_corrupt_row());
    assert!(matrix.get_row(7).unwrap().is_some());
}

#[test]
fn iteration_skips_corrupt_rows_by_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("skip.matrix");
    let written = random_sparse(&path, 10, 8);
    corrupt_row(&path, 4);

    let matrix = SparseMatrix::open(&path).unwrap();
    let mut iter = matrix.iter();
    let ids: Vec<i32> = iter.by_ref().map(|r| r.row_index()).collect();

    assert_eq!(ids.len(), written.len() - 1);
    assert!(!ids.contains(&4));
    assert_eq!(iter.skipped(), 1);
    assert!(iter.take_error().is_none());
}

#[test]
fn iteration_can_abort_on_corrupt_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abort.matrix");
    random_sparse(&path, 10, 8);
    corrupt_row(&path, 4);

    let options = MatrixOptions::new().on_decode_error(|_, _| DecodeAction::Abort);
    let matrix = SparseMatrix::open_with(&path, options).unwrap();

    let mut iter = matrix.iter();
    let ids: Vec<i32> = iter.by_ref().map(|r| r.row_index()).collect();
    assert_eq!(ids, vec![1]);

    let err = iter.take_error().unwrap();
    assert!(err.downcast_ref::<MatrixError>().unwrap().is_corrupt_row());
    assert!(iter.next().is_none());
}

#[test]
fn transpose_swaps_rows_and_columns() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("links.matrix");
    let dst = dir.path().join("links.transpose.matrix");
    let written = random_sparse(&src, 60, 13);

    let matrix = SparseMatrix::open(&src).unwrap();
    let rows = SparseMatrixTransposer::new(&matrix)
        .buffer_size(2048)
        .transpose_to(&dst)
        .unwrap();

    let transposed = SparseMatrix::open(&dst).unwrap();
    assert_eq!(transposed.num_rows(), rows);

    let ids = transposed.row_ids();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    for (row_id, cols, _) in &written {
        let original = matrix.get_row(*row_id).unwrap().unwrap();
        for (i, col) in cols.iter().enumerate() {
            let t = transposed.get_row(*col).unwrap().unwrap();
            let at = t.find_col(*row_id).unwrap();
            assert_eq!(t.packed_value_at(at), original.packed_value_at(i));
        }
    }
}
