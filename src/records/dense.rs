//! # Dense Rows
//!
//! Every row of a dense matrix has a value for every column, in the order of
//! the matrix-wide column id list. The body holds only the packed values;
//! the row index comes from the row table and the column ids are shared
//! through an `Arc<[ColId]>`.

use std::sync::Arc;

use eyre::{bail, Result};

use super::MatrixRow;
use crate::config::DENSE_ROW_ENTRY_SIZE;
use crate::encoding::{read_i16_le, ValueConf};
use crate::error::MatrixError;
use crate::{ColId, RowId};

#[derive(Debug, Clone)]
pub struct DenseRow<B> {
    vconf: ValueConf,
    row_index: RowId,
    col_ids: Arc<[ColId]>,
    bytes: B,
}

impl DenseRow<Vec<u8>> {
    pub fn new(
        vconf: ValueConf,
        row_index: RowId,
        col_ids: Arc<[ColId]>,
        values: &[f32],
    ) -> Result<Self> {
        if col_ids.len() != values.len() {
            bail!(MatrixError::encoding(format!(
                "dense row {}: {} column ids but {} values",
                row_index,
                col_ids.len(),
                values.len()
            )));
        }

        let mut bytes = Vec::with_capacity(encoded_len(values.len()));
        for &v in values {
            bytes.extend_from_slice(&vconf.pack(v).to_le_bytes());
        }

        Ok(Self {
            vconf,
            row_index,
            col_ids,
            bytes,
        })
    }
}

impl<B: AsRef<[u8]>> DenseRow<B> {
    pub fn wrap(vconf: ValueConf, row_index: RowId, col_ids: Arc<[ColId]>, bytes: B) -> Result<Self> {
        let needed = encoded_len(col_ids.len());
        let available = bytes.as_ref().len();
        if available < needed {
            bail!(MatrixError::corrupt_row(
                row_index,
                format!(
                    "dense row with {} columns needs {} bytes but only {} are available",
                    col_ids.len(),
                    needed,
                    available
                )
            ));
        }

        Ok(Self {
            vconf,
            row_index,
            col_ids,
            bytes,
        })
    }

    pub fn value_conf(&self) -> &ValueConf {
        &self.vconf
    }

    pub fn col_ids(&self) -> &Arc<[ColId]> {
        &self.col_ids
    }

    #[inline]
    pub fn packed_value_at(&self, i: usize) -> i16 {
        assert!(
            i < self.col_ids.len(),
            "column {} out of bounds ({})",
            i,
            self.col_ids.len()
        );
        read_i16_le(self.bytes.as_ref(), DENSE_ROW_ENTRY_SIZE * i)
    }

    /// All unpacked values in column order.
    pub fn values(&self) -> Vec<f32> {
        (0..self.col_ids.len()).map(|i| self.value_at(i)).collect()
    }

    /// The encoded body, exactly `2 * num_cols` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes.as_ref()[..encoded_len(self.col_ids.len())]
    }
}

impl<B: AsRef<[u8]>> MatrixRow for DenseRow<B> {
    #[inline]
    fn row_index(&self) -> RowId {
        self.row_index
    }

    #[inline]
    fn num_cols(&self) -> usize {
        self.col_ids.len()
    }

    #[inline]
    fn col_id_at(&self, i: usize) -> ColId {
        self.col_ids[i]
    }

    #[inline]
    fn value_at(&self, i: usize) -> f32 {
        self.vconf.unpack(self.packed_value_at(i))
    }
}

pub fn encoded_len(num_cols: usize) -> usize {
    DENSE_ROW_ENTRY_SIZE * num_cols
}
