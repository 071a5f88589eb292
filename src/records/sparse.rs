//! # Sparse Rows
//!
//! A sparse row carries its own column ids. The body is self-describing: the
//! first word must equal [`SPARSE_ROW_MAGIC`] and the third word gives the
//! column count, which fixes the total length `12 + 6 * ncols`.
//!
//! Wrapping bytes validates the magic and the length once; afterwards every
//! accessor is a fixed-offset read.

use eyre::{bail, Result};

use super::MatrixRow;
use crate::config::{SPARSE_ROW_ENTRY_SIZE, SPARSE_ROW_HEADER_SIZE, SPARSE_ROW_MAGIC};
use crate::encoding::{read_i16_le, read_i32_le, read_u32_le, ValueConf};
use crate::error::MatrixError;
use crate::{ColId, RowId};

#[derive(Debug, Clone)]
pub struct SparseRow<B> {
    vconf: ValueConf,
    bytes: B,
    num_cols: usize,
}

impl SparseRow<Vec<u8>> {
    /// Builds a row from parallel id and value slices, packing each value.
    pub fn new(vconf: ValueConf, row_index: RowId, col_ids: &[ColId], values: &[f32]) -> Result<Self> {
        if col_ids.len() != values.len() {
            bail!(MatrixError::encoding(format!(
                "row {}: {} column ids but {} values",
                row_index,
                col_ids.len(),
                values.len()
            )));
        }
        let packed = vconf.pack_all(values);
        Self::from_packed(vconf, row_index, col_ids, &packed)
    }

    /// Builds a row from values that are already packed under `vconf`.
    pub fn from_packed(
        vconf: ValueConf,
        row_index: RowId,
        col_ids: &[ColId],
        packed: &[i16],
    ) -> Result<Self> {
        if col_ids.len() != packed.len() {
            bail!(MatrixError::encoding(format!(
                "row {}: {} column ids but {} values",
                row_index,
                col_ids.len(),
                packed.len()
            )));
        }
        let num_cols = col_ids.len();
        if u32::try_from(num_cols).is_err() {
            bail!(MatrixError::encoding(format!(
                "row {}: {} columns exceed the format limit",
                row_index, num_cols
            )));
        }

        let mut bytes = Vec::with_capacity(encoded_len(num_cols));
        bytes.extend_from_slice(&SPARSE_ROW_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&row_index.to_le_bytes());
        bytes.extend_from_slice(&(num_cols as u32).to_le_bytes());
        for id in col_ids {
            bytes.extend_from_slice(&id.to_le_bytes());
        }
        for code in packed {
            bytes.extend_from_slice(&code.to_le_bytes());
        }

        Ok(Self {
            vconf,
            bytes,
            num_cols,
        })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<B: AsRef<[u8]>> SparseRow<B> {
    /// Wraps an encoded row. `bytes` may extend past the row; trailing bytes
    /// are ignored.
    pub fn wrap(vconf: ValueConf, bytes: B) -> Result<Self> {
        let buf = bytes.as_ref();
        if buf.len() < SPARSE_ROW_HEADER_SIZE {
            bail!(MatrixError::corrupt_row(
                row_index_hint(buf),
                format!(
                    "row body has {} bytes, header needs {}",
                    buf.len(),
                    SPARSE_ROW_HEADER_SIZE
                )
            ));
        }

        let magic = read_u32_le(buf, 0);
        if magic != SPARSE_ROW_MAGIC {
            bail!(MatrixError::corrupt_row(
                read_i32_le(buf, 4),
                format!(
                    "invalid row header 0x{:08X} (expected 0x{:08X})",
                    magic, SPARSE_ROW_MAGIC
                )
            ));
        }

        let num_cols = read_u32_le(buf, 8) as usize;
        let needed = encoded_len(num_cols);
        if buf.len() < needed {
            bail!(MatrixError::corrupt_row(
                read_i32_le(buf, 4),
                format!(
                    "row with {} columns needs {} bytes but only {} are available",
                    num_cols,
                    needed,
                    buf.len()
                )
            ));
        }

        Ok(Self {
            vconf,
            bytes,
            num_cols,
        })
    }

    pub fn value_conf(&self) -> &ValueConf {
        &self.vconf
    }

    #[inline]
    pub fn packed_value_at(&self, i: usize) -> i16 {
        assert!(i < self.num_cols, "column {} out of bounds ({})", i, self.num_cols);
        read_i16_le(self.bytes.as_ref(), self.values_offset() + 2 * i)
    }

    pub fn packed_values(&self) -> Vec<i16> {
        (0..self.num_cols).map(|i| self.packed_value_at(i)).collect()
    }

    pub fn col_ids(&self) -> Vec<ColId> {
        (0..self.num_cols).map(|i| self.col_id_at(i)).collect()
    }

    /// The encoded row, exactly `12 + 6 * num_cols` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes.as_ref()[..encoded_len(self.num_cols)]
    }

    #[inline]
    fn values_offset(&self) -> usize {
        SPARSE_ROW_HEADER_SIZE + 4 * self.num_cols
    }
}

impl<B: AsRef<[u8]>> MatrixRow for SparseRow<B> {
    #[inline]
    fn row_index(&self) -> RowId {
        read_i32_le(self.bytes.as_ref(), 4)
    }

    #[inline]
    fn num_cols(&self) -> usize {
        self.num_cols
    }

    #[inline]
    fn col_id_at(&self, i: usize) -> ColId {
        assert!(i < self.num_cols, "column {} out of bounds ({})", i, self.num_cols);
        read_i32_le(self.bytes.as_ref(), SPARSE_ROW_HEADER_SIZE + 4 * i)
    }

    #[inline]
    fn value_at(&self, i: usize) -> f32 {
        self.vconf.unpack(self.packed_value_at(i))
    }
}

pub fn encoded_len(num_cols: usize) -> usize {
    SPARSE_ROW_HEADER_SIZE + SPARSE_ROW_ENTRY_SIZE * num_cols
}

fn row_index_hint(buf: &[u8]) -> RowId {
    if buf.len() >= 8 {
        read_i32_le(buf, 4)
    } else {
        -1
    }
}
