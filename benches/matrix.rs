//! Matrix read-path benchmarks for wikimatrix
//!
//! These benchmarks measure row lookup through the paged memory map (with
//! and without eviction pressure), full scans, value packing, and the
//! cosimilarity cache's top-k query.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use wikimatrix::{
    CosimilarityMatrix, Matrix, MatrixOptions, MatrixRow, SparseMatrix, SparseMatrixWriter,
    ValueConf,
};

const ROWS: i32 = 20_000;
const COLS_PER_ROW: usize = 50;

fn build_sparse() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.matrix");
    let mut rng = StdRng::seed_from_u64(1);

    let mut writer = SparseMatrixWriter::create(&path, ValueConf::default()).unwrap();
    for id in 0..ROWS {
        let cols: Vec<i32> = (0..COLS_PER_ROW).map(|_| rng.gen_range(0..100_000)).collect();
        let vals: Vec<f32> = (0..COLS_PER_ROW).map(|_| rng.gen_range(-1.0..1.0)).collect();
        writer.write(id, &cols, &vals).unwrap();
    }
    writer.finish().unwrap();
    (dir, path)
}

fn bench_get_row(c: &mut Criterion) {
    let (_dir, path) = build_sparse();
    let mut group = c.benchmark_group("get_row");

    let configs: Vec<(&str, MatrixOptions)> = vec![
        ("one_page", MatrixOptions::new()),
        (
            "64k_pages_unbounded",
            MatrixOptions::new().max_page_size(64 * 1024),
        ),
        (
            "64k_pages_4_open",
            MatrixOptions::new().max_page_size(64 * 1024).max_open_pages(4),
        ),
    ];

    for (name, options) in configs {
        let matrix = SparseMatrix::open_with(&path, options).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        group.bench_with_input(BenchmarkId::new("random", name), &matrix, |b, m| {
            b.iter(|| {
                let row = m.get_row(rng.gen_range(0..ROWS)).unwrap().unwrap();
                black_box(row.value_at(0))
            });
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let (_dir, path) = build_sparse();
    let matrix = SparseMatrix::open(&path).unwrap();

    c.bench_function("scan_all_rows", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for row in &matrix {
                for i in 0..row.num_cols() {
                    sum += row.value_at(i);
                }
            }
            black_box(sum)
        });
    });
}

fn bench_pack(c: &mut Criterion) {
    let conf = ValueConf::default();
    let values: Vec<f32> = (0..1024).map(|i| (i as f32 / 512.0) - 1.0).collect();

    c.bench_function("pack_1024", |b| {
        b.iter(|| black_box(conf.pack_all(black_box(&values))));
    });
}

fn bench_most_similar(c: &mut Criterion) {
    let cache = CosimilarityMatrix::new();
    let mut rng = StdRng::seed_from_u64(3);
    for id in 0..2000 {
        let neighbors: Vec<(i32, f32)> = (0..id).step_by(7).map(|n| (n, (n % 13) as f32 / 13.0)).collect();
        cache.update(id, neighbors);
    }

    let mut group = c.benchmark_group("most_similar");
    for k in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| black_box(cache.most_similar(rng.gen_range(0..2000), k, None)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_row, bench_scan, bench_pack, bench_most_similar);
criterion_main!(benches);
