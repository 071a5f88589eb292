//! Fuzz testing for the sparse row decoder.
//!
//! This fuzz target wraps arbitrary byte sequences as sparse rows to ensure
//! malformed bodies are rejected with an error instead of panicking or
//! reading out of bounds.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use wikimatrix::{MatrixRow, SparseRow, ValueConf};

#[derive(Debug, Arbitrary)]
struct RowInput {
    min: f32,
    span: f32,
    valid_magic: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: RowInput| {
    let Ok(conf) = ValueConf::new(input.min, input.min + input.span) else {
        return;
    };

    let mut data = input.data;
    if input.valid_magic && data.len() >= 4 {
        data[..4].copy_from_slice(&0xFEFE_FEFEu32.to_le_bytes());
    }

    if let Ok(row) = SparseRow::wrap(conf, data.as_slice()) {
        assert!(row.as_bytes().len() <= data.len());
        for i in 0..row.num_cols() {
            let _ = row.col_id_at(i);
            let v = row.value_at(i);
            assert!(v >= conf.min() - conf.step() && v <= conf.max() + conf.step());
        }
        let _ = row.entries();
    }
});
